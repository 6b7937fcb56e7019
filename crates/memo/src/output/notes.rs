//! Note list output formatting.

use memo_markdown_rs::Facts;
use memo_query_rs::filter::{CompiledFilter, Field};
use memo_query_rs::{AnalyzedNote, Visibility};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{format_tags, format_timestamp, format_visibility, preview, TimeFormat};

/// JSON output structure for the filter command.
#[derive(Serialize)]
pub struct NotesListOutput<'a> {
    /// The filter expression, if one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<&'a str>,
    /// Note fields the filter reads.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    /// Notes matching the filter, before paging.
    pub total: usize,
    pub notes: Vec<NoteOutput<'a>>,
}

/// JSON output structure for a single note.
#[derive(Serialize)]
pub struct NoteOutput<'a> {
    pub id: i64,
    pub creator_id: i64,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub visibility: Visibility,
    pub pinned: bool,
    /// Manual and content tags, merged.
    pub tags: Vec<&'a str>,
    pub facts: &'a Facts,
    pub content: &'a str,
}

impl<'a> From<&'a AnalyzedNote> for NoteOutput<'a> {
    fn from(analyzed: &'a AnalyzedNote) -> Self {
        let note = &analyzed.note;
        Self {
            id: note.id,
            creator_id: note.creator_id,
            created_ts: note.created_ts,
            updated_ts: note.updated_ts,
            visibility: note.visibility,
            pinned: note.pinned,
            tags: analyzed.attributes().tags().into_iter().collect(),
            facts: &analyzed.facts,
            content: &note.content,
        }
    }
}

/// Formats notes as JSON.
pub fn format_notes_json(
    notes: &[&AnalyzedNote],
    filter: Option<&CompiledFilter>,
    total: usize,
) -> Result<String, serde_json::Error> {
    let output = NotesListOutput {
        filter: filter.map(CompiledFilter::source),
        fields: filter.map(|filter| filter.expr().fields()).unwrap_or_default(),
        total,
        notes: notes.iter().map(|&note| NoteOutput::from(note)).collect(),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats notes as a table.
pub fn format_notes_table(
    notes: &[&AnalyzedNote],
    time_format: TimeFormat,
    now: i64,
    use_colors: bool,
) -> String {
    if notes.is_empty() {
        return "No notes found.\n".to_string();
    }

    let mut output = String::new();

    let header = format!(
        "{:<6} {:<12} {:<3} {:<4} {:<24} {}",
        "ID", "Created", "Pin", "Vis", "Tags", "Content"
    );
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for analyzed in notes {
        let note = &analyzed.note;
        let pin = if note.pinned { "*" } else { "" };
        let created = format_timestamp(note.created_ts, time_format, now);
        let tags = format_tags(analyzed.attributes().tags(), 24);
        let visibility = format_visibility(note.visibility, use_colors);
        // Colored cells carry escape codes, so pad the plain label width by hand.
        let vis_pad = " ".repeat(4usize.saturating_sub(plain_width(note.visibility)));

        output.push_str(&format!(
            "{:<6} {:<12} {:<3} {}{} {:<24} {}\n",
            note.id,
            created,
            pin,
            visibility,
            vis_pad,
            tags,
            preview(&note.content, 50)
        ));
    }

    output
}

fn plain_width(visibility: Visibility) -> usize {
    format_visibility(visibility, false).len()
}
