//! Common helper functions for output formatting.

use chrono::DateTime;
use memo_query_rs::Visibility;
use owo_colors::OwoColorize;

/// How timestamps are shown in tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeFormat {
    /// "3 days ago", falling back to a date after a week.
    #[default]
    Relative,
    /// RFC 3339 in UTC.
    Iso,
    /// Raw seconds.
    Unix,
}

impl TimeFormat {
    /// Reads the `output.time_format` setting. Unknown values use the default.
    pub fn from_config(value: Option<&str>) -> Self {
        match value {
            Some("iso") => TimeFormat::Iso,
            Some("unix") => TimeFormat::Unix,
            _ => TimeFormat::Relative,
        }
    }
}

/// Formats a Unix timestamp for display, relative to `now` if requested.
pub fn format_timestamp(ts: i64, format: TimeFormat, now: i64) -> String {
    let Some(datetime) = DateTime::from_timestamp(ts, 0) else {
        return ts.to_string();
    };

    match format {
        TimeFormat::Unix => ts.to_string(),
        TimeFormat::Iso => datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        TimeFormat::Relative => {
            let elapsed = now.saturating_sub(ts);
            match elapsed {
                0..=59 => "just now".to_string(),
                60..=3599 => format!("{} min ago", elapsed / 60),
                3600..=86_399 => format!("{} h ago", elapsed / 3600),
                86_400..=172_799 => "yesterday".to_string(),
                172_800..=604_799 => format!("{} days ago", elapsed / 86_400),
                _ => datetime.format("%Y-%m-%d").to_string(),
            }
        }
    }
}

/// Truncates a string to at most `max_chars` characters, adding `...`.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// First non-blank line of a note, truncated for a table cell.
pub fn preview(content: &str, max_chars: usize) -> String {
    let line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    truncate_str(line, max_chars)
}

/// Formats tags as `#a #b`.
pub fn format_tags<'a>(tags: impl IntoIterator<Item = &'a str>, max_chars: usize) -> String {
    let joined = tags
        .into_iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ");
    truncate_str(&joined, max_chars)
}

/// Short visibility label, colored by how widely the note is shared.
pub fn format_visibility(visibility: Visibility, use_colors: bool) -> String {
    let label = match visibility {
        Visibility::Public => "pub",
        Visibility::Protected => "prot",
        Visibility::Private => "priv",
    };

    if !use_colors {
        return label.to_string();
    }
    match visibility {
        Visibility::Public => label.green().to_string(),
        Visibility::Protected => label.yellow().to_string(),
        Visibility::Private => label.dimmed().to_string(),
    }
}

/// A yes/no cell.
pub fn format_flag(value: bool, use_colors: bool) -> String {
    match (value, use_colors) {
        (true, true) => "yes".green().to_string(),
        (true, false) => "yes".to_string(),
        (false, true) => "no".dimmed().to_string(),
        (false, false) => "no".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_relative_times() {
        let rel = |ago| format_timestamp(NOW - ago, TimeFormat::Relative, NOW);
        assert_eq!(rel(5), "just now");
        assert_eq!(rel(120), "2 min ago");
        assert_eq!(rel(7200), "2 h ago");
        assert_eq!(rel(90_000), "yesterday");
        assert_eq!(rel(3 * 86_400), "3 days ago");
        assert_eq!(rel(30 * 86_400), "2023-10-15");
    }

    #[test]
    fn test_future_time_shows_date() {
        assert_eq!(
            format_timestamp(NOW + 86_400, TimeFormat::Relative, NOW),
            "2023-11-15"
        );
    }

    #[test]
    fn test_iso_and_unix() {
        assert_eq!(format_timestamp(0, TimeFormat::Iso, NOW), "1970-01-01T00:00:00Z");
        assert_eq!(format_timestamp(NOW, TimeFormat::Unix, NOW), "1700000000");
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert_eq!(
            format_timestamp(i64::MAX, TimeFormat::Iso, NOW),
            i64::MAX.to_string()
        );
    }

    #[test]
    fn test_time_format_from_config() {
        assert_eq!(TimeFormat::from_config(Some("iso")), TimeFormat::Iso);
        assert_eq!(TimeFormat::from_config(Some("unix")), TimeFormat::Unix);
        assert_eq!(TimeFormat::from_config(Some("other")), TimeFormat::Relative);
        assert_eq!(TimeFormat::from_config(None), TimeFormat::Relative);
    }

    #[test]
    fn test_truncate_str_counts_chars() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("abcdefghij", 8), "abcde...");
        assert_eq!(truncate_str("机器学习很有趣", 5), "机器...");
    }

    #[test]
    fn test_preview_skips_blank_lines() {
        assert_eq!(preview("\n\n  # Title  \nbody", 40), "# Title");
        assert_eq!(preview("", 40), "");
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(format_tags(["a", "工作"], 40), "#a #工作");
        assert_eq!(format_tags(Vec::<&str>::new(), 40), "");
    }

    #[test]
    fn test_plain_cells() {
        assert_eq!(format_visibility(Visibility::Public, false), "pub");
        assert_eq!(format_flag(true, false), "yes");
        assert_eq!(format_flag(false, false), "no");
    }
}
