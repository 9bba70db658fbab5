//! The two escaping dialects.
//!
//! Inside quotes only the backslash and the enclosing quote character may be
//! escaped. Bare values may escape the backslash, both quote characters, the
//! newline and the characters that are otherwise structural: `[`, `]`, `=`
//! and `#`.

use super::error::EscapeError;

const ESCAPE: char = '\\';
const BARE_ESCAPABLE: &[char] = &['\\', '\'', '"', '\n', '[', ']', '=', '#'];

/// Strips the quotes from a quoted value and decodes its escapes.
pub fn unquote(text: &str) -> Result<String, EscapeError> {
    let mut chars = text.chars();
    let (Some(open), Some(close)) = (chars.next(), chars.next_back()) else {
        return Err(EscapeError::Quote(text.to_string()));
    };
    if open != close || !matches!(open, '\'' | '"') {
        return Err(EscapeError::Quote(text.to_string()));
    }
    unescape(chars.as_str(), &[ESCAPE, open])
}

/// Decodes the escapes of an unquoted value.
pub fn unescape_bare(text: &str) -> Result<String, EscapeError> {
    unescape(text, BARE_ESCAPABLE)
}

/// Wraps `text` in double quotes, escaping what the quoted dialect requires.
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if c == ESCAPE || c == '"' {
            quoted.push(ESCAPE);
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Whether `text` survives a round trip as a bare value.
pub fn is_bare_safe(text: &str) -> bool {
    !text.is_empty()
        && text.trim() == text
        && !text.chars().any(|c| BARE_ESCAPABLE.contains(&c))
}

fn unescape(text: &str, escapable: &[char]) -> Result<String, EscapeError> {
    let mut result = String::with_capacity(text.len());
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            if !escapable.contains(&c) {
                return Err(EscapeError::Sequence(text.to_string()));
            }
            result.push(c);
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else {
            result.push(c);
        }
    }

    if escaped {
        return Err(EscapeError::Sequence(text.to_string()));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_quoted() {
        assert_eq!(unquote(r"'\\\''").unwrap(), r"\'");
        assert_eq!(unquote("'bar'").unwrap(), "bar");
        assert_eq!(unquote("''").unwrap(), "");
    }

    #[test]
    fn double_quoted() {
        assert_eq!(unquote(r#""\\\"""#).unwrap(), r#"\""#);
    }

    #[test]
    fn quoted_rejects_other_escapes() {
        assert!(matches!(unquote(r"'\n'"), Err(EscapeError::Sequence(_))));
        assert!(matches!(unquote(r#"'\"'"#), Err(EscapeError::Sequence(_))));
    }

    #[test]
    fn mismatched_quotes() {
        assert!(matches!(unquote("'bar\""), Err(EscapeError::Quote(_))));
        assert!(matches!(unquote("'"), Err(EscapeError::Quote(_))));
        assert!(matches!(unquote("bar"), Err(EscapeError::Quote(_))));
    }

    #[test]
    fn bare_dialect() {
        assert_eq!(
            unescape_bare("\\\n\\'\\\"\\\\\\[\\]\\=\\#").unwrap(),
            "\n'\"\\[]=#"
        );
        assert!(matches!(unescape_bare(r"\q"), Err(EscapeError::Sequence(_))));
        assert!(matches!(unescape_bare("foo\\"), Err(EscapeError::Sequence(_))));
    }

    #[test]
    fn quote_round_trips() {
        let text = r#"say "hi" \ bye"#;
        assert_eq!(unquote(&quote(text)).unwrap(), text);
    }

    #[test]
    fn bare_safety() {
        assert!(is_bare_safe("localhost"));
        assert!(is_bare_safe("a b"));
        assert!(!is_bare_safe(" padded"));
        assert!(!is_bare_safe("a=b"));
        assert!(!is_bare_safe(""));
    }
}
