//! Filter command implementation.
//!
//! Compiles a filter expression, then lists the matching notes of a notes
//! file, sorted and paged.

use std::path::PathBuf;
use std::sync::Arc;

use memo_query_rs::filter::{compile, Clock, FixedClock, SystemClock};
use memo_query_rs::query::{NoteQuery, SortDirection, SortKey};

use super::config::QueryConfig;
use super::notes::load_analyzed_notes;
use super::{CommandContext, Result};
use crate::cli::SortField;
use crate::output::helpers::TimeFormat;
use crate::output::{format_notes_json, format_notes_table};

/// Options for the filter command.
#[derive(Debug, Default)]
pub struct FilterOptions {
    /// Filter expression; every note matches without one.
    pub expression: Option<String>,
    /// JSON file holding an array of notes.
    pub notes: PathBuf,
    pub sort: Option<SortField>,
    /// Oldest first.
    pub reverse: bool,
    pub no_pinned_first: bool,
    pub limit: Option<usize>,
    pub offset: usize,
    /// Fixed value for `now()`.
    pub now: Option<i64>,
}

/// Executes the filter command.
///
/// The expression is compiled before the notes file is opened, so a bad
/// filter fails without reading any notes.
///
/// # Errors
///
/// Returns an error if the expression does not compile, or if the notes file
/// cannot be read or is not a JSON array of notes.
pub async fn execute(ctx: &CommandContext, opts: &FilterOptions) -> Result<()> {
    let query = build_query(opts, &ctx.config.query)?;
    if let Some(filter) = &query.filter {
        let fields: Vec<&str> = filter.expr().fields().into_iter().map(|field| field.name()).collect();
        log::debug!("filter '{filter}' reads {}", fields.join(", "));
    }
    let clock: Box<dyn Clock> = match opts.now {
        Some(now) => Box::new(FixedClock(now)),
        None => Box::new(SystemClock),
    };

    let parser = Arc::new(ctx.config.parser.build());
    let notes = load_analyzed_notes(&opts.notes, parser).await?;
    let page = query.run_page(&notes, clock.as_ref());
    log::info!(
        "{} of {} notes matched, showing {}",
        page.total,
        notes.len(),
        page.notes.len()
    );

    if ctx.json_output {
        println!(
            "{}",
            format_notes_json(&page.notes, query.filter.as_ref(), page.total)?
        );
    } else if !ctx.quiet {
        let time_format = TimeFormat::from_config(ctx.config.output.time_format.as_deref());
        print!(
            "{}",
            format_notes_table(&page.notes, time_format, clock.now(), ctx.use_colors)
        );
    }

    Ok(())
}

/// Builds the query from command-line options, falling back to config.
fn build_query(opts: &FilterOptions, config: &QueryConfig) -> Result<NoteQuery> {
    let filter = opts.expression.as_deref().map(compile).transpose()?;

    let sort = opts
        .sort
        .map(sort_key)
        .or_else(|| config.sort_key())
        .unwrap_or_default();
    let direction = if opts.reverse {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };

    Ok(NoteQuery {
        filter,
        sort,
        direction,
        pinned_first: !opts.no_pinned_first && config.pinned_first.unwrap_or(true),
        limit: opts.limit.or(config.limit),
        offset: opts.offset,
    })
}

fn sort_key(field: SortField) -> SortKey {
    match field {
        SortField::Created => SortKey::CreatedTs,
        SortField::Updated => SortKey::UpdatedTs,
        SortField::Id => SortKey::Id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;

    fn opts(expression: Option<&str>) -> FilterOptions {
        FilterOptions {
            expression: expression.map(str::to_string),
            notes: PathBuf::from("notes.json"),
            ..FilterOptions::default()
        }
    }

    #[test]
    fn test_defaults() {
        let query = build_query(&opts(None), &QueryConfig::default()).unwrap();
        assert!(query.filter.is_none());
        assert_eq!(query.sort, SortKey::CreatedTs);
        assert_eq!(query.direction, SortDirection::Desc);
        assert!(query.pinned_first);
        assert_eq!(query.limit, None);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_config_fills_unset_options() {
        let config = QueryConfig {
            sort: Some("updated".to_string()),
            pinned_first: Some(false),
            limit: Some(20),
        };
        let query = build_query(&opts(Some("pinned")), &config).unwrap();
        assert!(query.filter.is_some());
        assert_eq!(query.sort, SortKey::UpdatedTs);
        assert!(!query.pinned_first);
        assert_eq!(query.limit, Some(20));
    }

    #[test]
    fn test_options_override_config() {
        let config = QueryConfig {
            sort: Some("updated".to_string()),
            pinned_first: Some(true),
            limit: Some(20),
        };
        let options = FilterOptions {
            sort: Some(SortField::Id),
            reverse: true,
            no_pinned_first: true,
            limit: Some(3),
            offset: 2,
            ..opts(None)
        };
        let query = build_query(&options, &config).unwrap();
        assert_eq!(query.sort, SortKey::Id);
        assert_eq!(query.direction, SortDirection::Asc);
        assert!(!query.pinned_first);
        assert_eq!(query.limit, Some(3));
        assert_eq!(query.offset, 2);
    }

    #[test]
    fn test_unknown_config_sort_uses_default() {
        let config = QueryConfig {
            sort: Some("bogus".to_string()),
            ..QueryConfig::default()
        };
        let query = build_query(&opts(None), &config).unwrap();
        assert_eq!(query.sort, SortKey::CreatedTs);
    }

    #[test]
    fn test_bad_expression_is_filter_error() {
        let result = build_query(&opts(Some("pined")), &QueryConfig::default());
        assert!(matches!(result, Err(CommandError::Filter(_))));
    }

    #[tokio::test]
    async fn test_bad_expression_fails_before_reading_notes() {
        let ctx = CommandContext {
            json_output: true,
            use_colors: false,
            quiet: true,
            verbose: false,
            config: Default::default(),
        };
        let options = FilterOptions {
            notes: PathBuf::from("/nonexistent/notes.json"),
            ..opts(Some("content =="))
        };
        let result = execute(&ctx, &options).await;
        assert!(matches!(result, Err(CommandError::Filter(_))));
    }
}
