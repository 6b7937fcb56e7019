//! Fact and tag output formatting.

use std::collections::BTreeMap;
use std::path::PathBuf;

use memo_markdown_rs::Facts;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{format_flag, format_tags};

/// JSON output structure for the facts of one file.
#[derive(Serialize)]
pub struct FileFactsOutput<'a> {
    pub path: String,
    #[serde(flatten)]
    pub facts: &'a Facts,
}

/// Formats per-file facts as JSON.
pub fn format_facts_json(results: &[(PathBuf, Facts)]) -> Result<String, serde_json::Error> {
    let output: Vec<FileFactsOutput> = results
        .iter()
        .map(|(path, facts)| FileFactsOutput {
            path: path.display().to_string(),
            facts,
        })
        .collect();
    serde_json::to_string_pretty(&output)
}

/// Formats per-file facts as one block per file.
pub fn format_facts_table(results: &[(PathBuf, Facts)], use_colors: bool) -> String {
    let mut output = String::new();

    for (index, (path, facts)) in results.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        let title = path.display().to_string();
        if use_colors {
            output.push_str(&format!("{}\n", title.bold()));
        } else {
            output.push_str(&format!("{title}\n"));
        }

        let tags = if facts.tags.is_empty() {
            "-".to_string()
        } else {
            format_tags(facts.tags.iter().map(String::as_str), 80)
        };
        output.push_str(&format!("  tags:                 {tags}\n"));
        output.push_str(&format!(
            "  has_code:             {}\n",
            format_flag(facts.has_code, use_colors)
        ));
        output.push_str(&format!(
            "  has_link:             {}\n",
            format_flag(facts.has_link, use_colors)
        ));
        output.push_str(&format!(
            "  has_task_list:        {}\n",
            format_flag(facts.has_task_list, use_colors)
        ));
        output.push_str(&format!(
            "  has_incomplete_tasks: {}\n",
            format_flag(facts.has_incomplete_tasks, use_colors)
        ));
    }

    output
}

/// JSON output structure for the tags command.
#[derive(Serialize)]
pub struct TagsOutput<'a> {
    pub tags: Vec<TagCountOutput<'a>>,
}

/// JSON output structure for one tag.
#[derive(Serialize)]
pub struct TagCountOutput<'a> {
    pub name: &'a str,
    pub count: usize,
}

/// Formats tag counts as JSON, in name order.
pub fn format_tag_counts_json(counts: &BTreeMap<String, usize>) -> Result<String, serde_json::Error> {
    let output = TagsOutput {
        tags: counts
            .iter()
            .map(|(name, &count)| TagCountOutput { name, count })
            .collect(),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats tag counts as a table, most used first.
pub fn format_tag_counts_table(counts: &BTreeMap<String, usize>, use_colors: bool) -> String {
    if counts.is_empty() {
        return "No tags found.\n".to_string();
    }

    let mut rows: Vec<(&String, &usize)> = counts.iter().collect();
    // Stable, so equal counts stay in name order.
    rows.sort_by(|a, b| b.1.cmp(a.1));

    let mut output = String::new();
    let header = format!("{:>5}  {}", "Count", "Tag");
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for (name, count) in rows {
        output.push_str(&format!("{count:>5}  #{name}\n"));
    }

    output
}
