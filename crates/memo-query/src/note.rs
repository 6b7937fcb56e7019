//! Note records and the attribute view filters are evaluated against.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use memo_markdown_rs::{extract_facts, Facts, Parser};
use serde::{Deserialize, Serialize};

use crate::filter::Field;

/// Who can see a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    /// Anyone.
    Public,
    /// Signed-in users.
    Protected,
    /// The creator only.
    #[default]
    Private,
}

impl Visibility {
    /// The upper-case name used in storage and in filters.
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Protected => "PROTECTED",
            Visibility::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    /// Parses the upper-case name. Matching is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLIC" => Ok(Visibility::Public),
            "PROTECTED" => Ok(Visibility::Protected),
            "PRIVATE" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility: {other}")),
        }
    }
}

/// A stored note, consumed read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note id.
    pub id: i64,

    /// Author id.
    #[serde(default)]
    pub creator_id: i64,

    /// Raw markdown text.
    pub content: String,

    /// Creation time, seconds since the Unix epoch.
    #[serde(default)]
    pub created_ts: i64,

    /// Last update time, seconds since the Unix epoch.
    #[serde(default)]
    pub updated_ts: i64,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub pinned: bool,

    /// Tags attached outside the content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Note {
    /// Creates a private, unpinned note with zero timestamps.
    pub fn new(id: i64, content: impl Into<String>) -> Self {
        Self {
            id,
            creator_id: 0,
            content: content.into(),
            created_ts: 0,
            updated_ts: 0,
            visibility: Visibility::default(),
            pinned: false,
            tags: Vec::new(),
        }
    }
}

/// Reads a JSON array of notes.
pub fn notes_from_json(json: &str) -> serde_json::Result<Vec<Note>> {
    serde_json::from_str(json)
}

/// A note together with the facts extracted from its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedNote {
    /// The stored record.
    pub note: Note,
    /// Facts derived from `note.content`.
    pub facts: Facts,
}

impl AnalyzedNote {
    /// Parses the note's content and extracts its facts.
    pub fn analyze(note: Note, parser: &Parser) -> Self {
        let facts = extract_facts(&parser.parse(&note.content));
        Self { note, facts }
    }

    /// The attribute view filters are evaluated against.
    pub fn attributes(&self) -> NoteAttributes<'_> {
        NoteAttributes::new(&self.note, &self.facts)
    }
}

/// Stored fields and content facts of one note, merged.
///
/// `tags` is the union of the note's manual tags and the tags found in its
/// content.
#[derive(Debug, Clone, Copy)]
pub struct NoteAttributes<'a> {
    note: &'a Note,
    facts: &'a Facts,
}

impl<'a> NoteAttributes<'a> {
    /// Merges a note with its facts.
    pub fn new(note: &'a Note, facts: &'a Facts) -> Self {
        Self { note, facts }
    }

    /// The note id.
    pub fn id(&self) -> i64 {
        self.note.id
    }

    /// The raw content.
    pub fn content(&self) -> &'a str {
        &self.note.content
    }

    /// The visibility.
    pub fn visibility(&self) -> Visibility {
        self.note.visibility
    }

    /// Returns true if the tag is attached manually or appears in the content.
    pub fn has_tag(&self, name: &str) -> bool {
        self.facts.has_tag(name) || self.note.tags.iter().any(|tag| tag == name)
    }

    /// All tags, deduplicated and sorted.
    pub fn tags(&self) -> BTreeSet<&'a str> {
        self.note
            .tags
            .iter()
            .chain(self.facts.tags.iter())
            .map(String::as_str)
            .collect()
    }

    /// Value of an integer or timestamp field, `None` for other fields.
    pub fn integer(&self, field: Field) -> Option<i64> {
        match field {
            Field::CreatorId => Some(self.note.creator_id),
            Field::CreatedTs => Some(self.note.created_ts),
            Field::UpdatedTs => Some(self.note.updated_ts),
            _ => None,
        }
    }

    /// Value of a boolean field, `None` for other fields.
    pub fn flag(&self, field: Field) -> Option<bool> {
        match field {
            Field::Pinned => Some(self.note.pinned),
            Field::HasCode => Some(self.facts.has_code),
            Field::HasLink => Some(self.facts.has_link),
            Field::HasTaskList => Some(self.facts.has_task_list),
            Field::HasIncompleteTasks => Some(self.facts.has_incomplete_tasks),
            _ => None,
        }
    }
}
