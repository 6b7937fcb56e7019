//! The fixed set of fields a filter can reference.

use std::fmt;

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

/// Maximum edit distance for "did you mean" suggestions.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free text.
    String,
    /// A 64-bit integer.
    Int,
    /// Seconds since the Unix epoch; compares like an integer.
    Timestamp,
    /// `true` / `false`.
    Bool,
    /// A string restricted to a fixed set of values.
    Enum(&'static [&'static str]),
    /// A set of strings.
    List,
}

impl FieldType {
    /// Returns true for types compared with the integer operators.
    pub fn is_integer(self) -> bool {
        matches!(self, FieldType::Int | FieldType::Timestamp)
    }

    /// Returns true for types compared against string literals.
    pub fn is_string(self) -> bool {
        matches!(self, FieldType::String | FieldType::Enum(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Int => f.write_str("int"),
            FieldType::Timestamp => f.write_str("timestamp"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::Enum(_) => f.write_str("enum"),
            FieldType::List => f.write_str("list"),
        }
    }
}

/// Values accepted for the `visibility` field.
pub const VISIBILITY_VALUES: &[&str] = &["PUBLIC", "PROTECTED", "PRIVATE"];

/// A field of the note schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // ==================== Stored Fields ====================
    /// Raw note text.
    Content,
    /// Author id.
    CreatorId,
    /// Creation time.
    CreatedTs,
    /// Last update time.
    UpdatedTs,
    /// Pinned flag.
    Pinned,
    /// `PUBLIC`, `PROTECTED` or `PRIVATE`.
    Visibility,
    /// Manual tags merged with tags found in the content.
    Tags,

    // ==================== Content Facts ====================
    /// The content contains a code span or block.
    HasCode,
    /// The content contains a link.
    HasLink,
    /// The content contains a task list item.
    HasTaskList,
    /// The content contains an unchecked task list item.
    HasIncompleteTasks,
}

impl Field {
    /// Every field, in schema order.
    pub const ALL: [Field; 11] = [
        Field::Content,
        Field::CreatorId,
        Field::CreatedTs,
        Field::UpdatedTs,
        Field::Pinned,
        Field::Visibility,
        Field::Tags,
        Field::HasCode,
        Field::HasLink,
        Field::HasTaskList,
        Field::HasIncompleteTasks,
    ];

    /// The name used in filter expressions.
    pub fn name(self) -> &'static str {
        match self {
            Field::Content => "content",
            Field::CreatorId => "creator_id",
            Field::CreatedTs => "created_ts",
            Field::UpdatedTs => "updated_ts",
            Field::Pinned => "pinned",
            Field::Visibility => "visibility",
            Field::Tags => "tags",
            Field::HasCode => "has_code",
            Field::HasLink => "has_link",
            Field::HasTaskList => "has_task_list",
            Field::HasIncompleteTasks => "has_incomplete_tasks",
        }
    }

    /// The field's value type.
    pub fn field_type(self) -> FieldType {
        match self {
            Field::Content => FieldType::String,
            Field::CreatorId => FieldType::Int,
            Field::CreatedTs | Field::UpdatedTs => FieldType::Timestamp,
            Field::Visibility => FieldType::Enum(VISIBILITY_VALUES),
            Field::Tags => FieldType::List,
            Field::Pinned
            | Field::HasCode
            | Field::HasLink
            | Field::HasTaskList
            | Field::HasIncompleteTasks => FieldType::Bool,
        }
    }

    /// Looks up a field by its exact (case-sensitive) name.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Suggests the field whose name is closest to `name`.
    ///
    /// Returns the best match if its edit distance is within the threshold,
    /// otherwise `None`.
    pub fn suggest(name: &str) -> Option<String> {
        let query = name.to_lowercase();

        let (best, distance) = Field::ALL
            .into_iter()
            .map(|field| (field.name(), levenshtein(&query, field.name())))
            .min_by_key(|(_, distance)| *distance)?;

        (distance <= MAX_SUGGESTION_DISTANCE).then(|| best.to_string())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
