//! Autolinks: `<scheme:...>`, `<user@host>` and bare URLs in running text.

use super::{Match, Part};
use crate::ast::NodeKind;

/// Characters trimmed from the end of a bare URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ':', ';', '!', '?', '\'', '"', ')'];

/// Reads `<scheme:...>` or `<local@domain>` at the start of `input`.
pub(crate) fn recognize_angle(input: &str) -> Option<Match> {
    let inner_and_rest = input.strip_prefix('<')?;
    // Stops at the first character that cannot appear inside.
    let close = inner_and_rest.find(|c: char| c == '>' || c == '<' || c.is_whitespace())?;
    if close == 0 || !inner_and_rest[close..].starts_with('>') {
        return None;
    }
    let inner = &inner_and_rest[..close];

    let destination = if is_uri(inner) {
        inner.to_string()
    } else if is_email(inner) {
        format!("mailto:{inner}")
    } else {
        return None;
    };

    let len = close + 2;
    Some(Match {
        kind: NodeKind::Link {
            destination,
            title: None,
        },
        len,
        parts: vec![
            Part::Marker(0..1),
            Part::Text(1..close + 1),
            Part::Marker(close + 1..len),
        ],
    })
}

/// Reads a bare `http://`, `https://` or `www.` URL at the start of `input`.
pub(crate) fn recognize_bare(prev: Option<char>, input: &str) -> Option<Match> {
    if prev.is_some_and(char::is_alphanumeric) {
        return None;
    }

    let (prefix_len, needs_scheme) = if input.starts_with("https://") {
        (8, false)
    } else if input.starts_with("http://") {
        (7, false)
    } else if input.starts_with("www.") {
        (4, true)
    } else {
        return None;
    };

    let raw_end = input
        .find(|c: char| c.is_whitespace() || c == '<')
        .unwrap_or(input.len());
    let url = trim_trailing(&input[..raw_end]);

    if url.len() <= prefix_len {
        return None;
    }

    let destination = if needs_scheme {
        format!("http://{url}")
    } else {
        url.to_string()
    };

    Some(Match {
        kind: NodeKind::Link {
            destination,
            title: None,
        },
        len: url.len(),
        parts: vec![Part::Text(0..url.len())],
    })
}

/// Trims trailing punctuation, keeping a `)` that closes a `(` in the URL.
fn trim_trailing(url: &str) -> &str {
    let opens = url.matches('(').count();
    let mut closes = url.matches(')').count();
    let mut end = url.len();
    for last in url.chars().rev() {
        if !TRAILING_PUNCTUATION.contains(&last) {
            break;
        }
        if last == ')' {
            if opens >= closes {
                break;
            }
            closes -= 1;
        }
        end -= last.len_utf8();
    }
    &url[..end]
}

fn is_uri(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    (2..=32).contains(&scheme.len())
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c));
    let domain_ok = !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    local_ok && domain_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination(found: &Match) -> &str {
        match &found.kind {
            NodeKind::Link { destination, .. } => destination,
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_angle_uri() {
        let found = recognize_angle("<https://example.com/a?b=c> tail").unwrap();
        assert_eq!(destination(&found), "https://example.com/a?b=c");
        assert_eq!(found.len, 27);
    }

    #[test]
    fn test_angle_email() {
        let found = recognize_angle("<me@example.com>").unwrap();
        assert_eq!(destination(&found), "mailto:me@example.com");
    }

    #[test]
    fn test_angle_rejects_html_and_spaces() {
        assert!(recognize_angle("<b>").is_none());
        assert!(recognize_angle("<a href=x>").is_none());
        assert!(recognize_angle("<unclosed").is_none());
        assert!(recognize_angle("<>").is_none());
    }

    #[test]
    fn test_bare_https_url() {
        let found = recognize_bare(None, "https://example.com/page#section, more").unwrap();
        assert_eq!(destination(&found), "https://example.com/page#section");
        assert_eq!(found.len, 32);
    }

    #[test]
    fn test_bare_www_url_gets_scheme() {
        let found = recognize_bare(Some(' '), "www.rust-lang.org.").unwrap();
        assert_eq!(destination(&found), "http://www.rust-lang.org");
    }

    #[test]
    fn test_bare_url_keeps_balanced_paren() {
        let found = recognize_bare(None, "https://x.org/a_(b))").unwrap();
        assert_eq!(destination(&found), "https://x.org/a_(b)");
    }

    #[test]
    fn test_bare_url_requires_word_boundary() {
        assert!(recognize_bare(Some('x'), "https://example.com").is_none());
    }

    #[test]
    fn test_bare_prefix_only_declines() {
        assert!(recognize_bare(None, "https://").is_none());
        assert!(recognize_bare(None, "hello").is_none());
        assert!(recognize_bare(None, "www.").is_none());
    }

    #[test]
    fn test_angle_stops_at_next_open_bracket() {
        assert!(recognize_angle("<a <https://x.y>").is_none());
        assert!(recognize_angle("<https://x.y\n>").is_none());
        let found = recognize_angle("<https://x.y>").unwrap();
        assert_eq!(found.len, 13);
    }

    #[test]
    fn test_bare_url_trims_unbalanced_parens() {
        let found = recognize_bare(None, "https://x.org/(a)))),").unwrap();
        assert_eq!(destination(&found), "https://x.org/(a)");
    }
}
