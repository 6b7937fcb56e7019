//! Filtering, ordering and paging over analyzed notes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::filter::{Clock, CompiledFilter, FilterEvaluator};
use crate::AnalyzedNote;

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPage<'a> {
    /// Notes that matched the filter, before offset and limit.
    pub total: usize,
    /// The requested page, in order.
    pub notes: Vec<&'a AnalyzedNote>,
}

/// Field notes are ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Creation time.
    #[default]
    CreatedTs,
    /// Last update time.
    UpdatedTs,
    /// Note id.
    Id,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

/// A filter plus ordering and paging.
///
/// Defaults to newest first with pinned notes on top, which is how a note
/// list is usually shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteQuery {
    /// Notes must match this filter; `None` matches every note.
    pub filter: Option<CompiledFilter>,
    pub sort: SortKey,
    pub direction: SortDirection,
    /// Put pinned notes before unpinned ones regardless of `sort`.
    pub pinned_first: bool,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Default for NoteQuery {
    fn default() -> Self {
        Self {
            filter: None,
            sort: SortKey::default(),
            direction: SortDirection::default(),
            pinned_first: true,
            limit: None,
            offset: 0,
        }
    }
}

impl NoteQuery {
    /// Creates a query that matches `filter`.
    pub fn with_filter(filter: CompiledFilter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    /// Filters, sorts and pages `notes`.
    ///
    /// Sorting is stable, so notes with equal keys keep their input order.
    pub fn run<'a>(&self, notes: &'a [AnalyzedNote], clock: &dyn Clock) -> Vec<&'a AnalyzedNote> {
        self.run_page(notes, clock).notes
    }

    /// Like [`NoteQuery::run`], also reporting how many notes matched
    /// before paging.
    pub fn run_page<'a>(&self, notes: &'a [AnalyzedNote], clock: &dyn Clock) -> QueryPage<'a> {
        let mut matched: Vec<&AnalyzedNote> = match &self.filter {
            Some(filter) => FilterEvaluator::new(filter, clock).filter_notes(notes),
            None => notes.iter().collect(),
        };
        log::debug!("{} of {} notes matched", matched.len(), notes.len());

        let total = matched.len();
        self.sort_notes(&mut matched);
        apply_page(&mut matched, self.offset, self.limit);
        QueryPage {
            total,
            notes: matched,
        }
    }

    fn sort_notes(&self, notes: &mut [&AnalyzedNote]) {
        notes.sort_by(|a, b| {
            let pinned = if self.pinned_first {
                b.note.pinned.cmp(&a.note.pinned)
            } else {
                std::cmp::Ordering::Equal
            };
            let key = sort_value(a, self.sort).cmp(&sort_value(b, self.sort));
            let key = match self.direction {
                SortDirection::Asc => key,
                SortDirection::Desc => key.reverse(),
            };
            pinned.then(key)
        });
    }
}

fn sort_value(note: &AnalyzedNote, key: SortKey) -> i64 {
    match key {
        SortKey::CreatedTs => note.note.created_ts,
        SortKey::UpdatedTs => note.note.updated_ts,
        SortKey::Id => note.note.id,
    }
}

/// Applies offset, then limit.
fn apply_page<T>(items: &mut Vec<T>, offset: usize, limit: Option<usize>) {
    if offset > 0 {
        items.drain(..offset.min(items.len()));
    }
    if let Some(limit) = limit {
        items.truncate(limit);
    }
}

/// Counts how many notes carry each tag (manual or from content).
pub fn tag_counts<'a>(notes: impl IntoIterator<Item = &'a AnalyzedNote>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for note in notes {
        for tag in note.attributes().tags() {
            *counts.entry(tag.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{compile, FixedClock};
    use crate::Note;
    use memo_markdown_rs::Parser;

    fn note(id: i64, created_ts: i64, pinned: bool, content: &str) -> AnalyzedNote {
        let mut note = Note::new(id, content);
        note.created_ts = created_ts;
        note.updated_ts = created_ts + 10 * id;
        note.pinned = pinned;
        AnalyzedNote::analyze(note, &Parser::default())
    }

    fn ids(notes: &[&AnalyzedNote]) -> Vec<i64> {
        notes.iter().map(|n| n.note.id).collect()
    }

    fn sample() -> Vec<AnalyzedNote> {
        vec![
            note(1, 100, false, "#work first"),
            note(2, 300, true, "#home pinned"),
            note(3, 200, false, "#work third"),
            note(4, 400, false, "plain"),
        ]
    }

    #[test]
    fn test_default_query_newest_first_pinned_on_top() {
        let notes = sample();
        let result = NoteQuery::default().run(&notes, &FixedClock(0));
        assert_eq!(ids(&result), vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_filter_then_sort() {
        let notes = sample();
        let query = NoteQuery::with_filter(compile("\"work\" in tags").unwrap());
        let result = query.run(&notes, &FixedClock(0));
        assert_eq!(ids(&result), vec![3, 1]);
    }

    #[test]
    fn test_ascending_without_pinned_first() {
        let notes = sample();
        let query = NoteQuery {
            direction: SortDirection::Asc,
            pinned_first: false,
            ..NoteQuery::default()
        };
        assert_eq!(ids(&query.run(&notes, &FixedClock(0))), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_sort_by_id_and_updated() {
        let notes = sample();
        let by_id = NoteQuery {
            sort: SortKey::Id,
            pinned_first: false,
            ..NoteQuery::default()
        };
        assert_eq!(ids(&by_id.run(&notes, &FixedClock(0))), vec![4, 3, 2, 1]);

        let by_updated = NoteQuery {
            sort: SortKey::UpdatedTs,
            direction: SortDirection::Asc,
            pinned_first: false,
            ..NoteQuery::default()
        };
        // updated = created + 10 * id: 110, 320, 230, 440
        assert_eq!(ids(&by_updated.run(&notes, &FixedClock(0))), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_stable_sort_keeps_input_order_for_ties() {
        let notes = vec![note(5, 100, false, "a"), note(6, 100, false, "b"), note(7, 100, false, "c")];
        let result = NoteQuery::default().run(&notes, &FixedClock(0));
        assert_eq!(ids(&result), vec![5, 6, 7]);
    }

    #[test]
    fn test_offset_and_limit() {
        let notes = sample();
        let query = NoteQuery {
            offset: 1,
            limit: Some(2),
            ..NoteQuery::default()
        };
        assert_eq!(ids(&query.run(&notes, &FixedClock(0))), vec![4, 3]);
    }

    #[test]
    fn test_run_page_reports_total_before_paging() {
        let notes = sample();
        let query = NoteQuery {
            limit: Some(1),
            ..NoteQuery::with_filter(compile("!pinned").unwrap())
        };
        let page = query.run_page(&notes, &FixedClock(0));
        assert_eq!(page.total, 3);
        assert_eq!(ids(&page.notes), vec![4]);
    }

    #[test]
    fn test_offset_past_end() {
        let notes = sample();
        let query = NoteQuery {
            offset: 10,
            ..NoteQuery::default()
        };
        assert!(query.run(&notes, &FixedClock(0)).is_empty());
    }

    #[test]
    fn test_limit_zero() {
        let notes = sample();
        let query = NoteQuery {
            limit: Some(0),
            ..NoteQuery::default()
        };
        assert!(query.run(&notes, &FixedClock(0)).is_empty());
    }

    #[test]
    fn test_tag_counts_merge_manual_and_content_tags() {
        let mut notes = sample();
        notes[3].note.tags.push("work".to_string());
        // A manual tag that also appears in the content counts once.
        notes[0].note.tags.push("work".to_string());

        let counts = tag_counts(&notes);
        assert_eq!(counts.get("work"), Some(&3));
        assert_eq!(counts.get("home"), Some(&1));
        assert_eq!(counts.len(), 2);
    }
}
