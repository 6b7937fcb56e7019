//! Loading note files and analyzing them in parallel.
//!
//! Files are read with tokio's async file API. Parsing is CPU-bound, so it
//! runs on the blocking pool, one task per batch of notes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use memo_markdown_rs::{extract_facts, sanitize_utf8, Facts, Parser};
use memo_query_rs::{notes_from_json, AnalyzedNote, Note};
use tokio::task::JoinSet;

use super::{CommandError, Result};

/// Notes parsed per blocking task.
const NOTES_PER_TASK: usize = 64;

/// Reads a file as text, replacing invalid UTF-8.
pub async fn read_text(path: &Path) -> Result<String> {
    log::debug!("reading {}", path.display());
    let bytes = tokio::fs::read(path).await?;
    Ok(sanitize_utf8(&bytes).into_owned())
}

/// Reads a JSON array of note records.
pub async fn load_notes(path: &Path) -> Result<Vec<Note>> {
    let text = read_text(path).await?;
    notes_from_json(&text).map_err(|source| CommandError::NoteData {
        path: path.to_path_buf(),
        source,
    })
}

/// Analyzes notes on the blocking pool, keeping their input order.
pub async fn analyze_notes(notes: Vec<Note>, parser: Arc<Parser>) -> Result<Vec<AnalyzedNote>> {
    let mut batches: Vec<Vec<Note>> = Vec::new();
    let mut notes = notes.into_iter().peekable();
    while notes.peek().is_some() {
        batches.push(notes.by_ref().take(NOTES_PER_TASK).collect());
    }

    let batch_count = batches.len();
    let mut tasks = JoinSet::new();
    for (index, batch) in batches.into_iter().enumerate() {
        let parser = Arc::clone(&parser);
        tasks.spawn_blocking(move || {
            let analyzed: Vec<AnalyzedNote> = batch
                .into_iter()
                .map(|note| AnalyzedNote::analyze(note, &parser))
                .collect();
            (index, analyzed)
        });
    }

    let mut results: Vec<Option<Vec<AnalyzedNote>>> = (0..batch_count).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (index, analyzed) = joined?;
        results[index] = Some(analyzed);
    }

    Ok(results.into_iter().flatten().flatten().collect())
}

/// Loads and analyzes a notes file.
pub async fn load_analyzed_notes(path: &Path, parser: Arc<Parser>) -> Result<Vec<AnalyzedNote>> {
    let notes = load_notes(path).await?;
    log::debug!("loaded {} notes from {}", notes.len(), path.display());
    analyze_notes(notes, parser).await
}

/// Reads and analyzes markdown files concurrently, in input order.
pub async fn analyze_files(paths: &[PathBuf], parser: Arc<Parser>) -> Result<Vec<(PathBuf, Facts)>> {
    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        let parser = Arc::clone(&parser);
        tasks.spawn(async move {
            let text = read_text(&path).await?;
            let facts = tokio::task::spawn_blocking(move || extract_facts(&parser.parse(&text))).await?;
            Ok::<_, CommandError>((index, path, facts))
        });
    }

    let mut results: Vec<Option<(PathBuf, Facts)>> = (0..paths.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (index, path, facts) = joined??;
        results[index] = Some((path, facts));
    }

    Ok(results.into_iter().flatten().collect())
}
