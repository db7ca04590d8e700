//! Recognition of the privileged `LOAD '<path>'` statement.
//!
//! `LOAD` is the conventional way to trigger the extension loader through
//! the ordinary SQL surface. Only a lone `LOAD` statement is recognized
//! (optionally with a trailing semicolon); anything else falls through to
//! the engine, which reports its own parse error.

/// Extract the module path from a `LOAD` statement, if `sql` is one.
///
/// Accepts `LOAD 'path'`, `LOAD "path"`, and a bare unquoted token, case
/// insensitively, with optional trailing semicolon. Doubled quotes inside a
/// quoted path unescape to one quote.
pub(crate) fn parse_load(sql: &str) -> Option<String> {
    let mut s = sql.trim();
    if let Some(stripped) = s.strip_suffix(';') {
        s = stripped.trim_end();
    }
    let head = s.get(..4)?;
    if !head.eq_ignore_ascii_case("load") {
        return None;
    }
    let rest = &s[4..];
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    for quote in ['\'', '"'] {
        if let Some(inner) = rest.strip_prefix(quote) {
            let inner = inner.strip_suffix(quote)?;
            let escaped = format!("{quote}{quote}");
            return Some(inner.replace(&escaped, &quote.to_string()));
        }
    }

    // Bare token: a single word with no quoting.
    if rest.contains(char::is_whitespace) {
        return None;
    }
    Some(rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_load;

    #[test]
    fn single_quoted_path() {
        assert_eq!(parse_load("LOAD 'greet'"), Some("greet".into()));
        assert_eq!(
            parse_load("load '/opt/modules/greet.mod'"),
            Some("/opt/modules/greet.mod".into())
        );
    }

    #[test]
    fn trailing_semicolon_and_whitespace() {
        assert_eq!(parse_load("  LOAD 'greet';  "), Some("greet".into()));
    }

    #[test]
    fn double_quoted_and_bare() {
        assert_eq!(parse_load("LOAD \"greet\""), Some("greet".into()));
        assert_eq!(parse_load("LOAD greet"), Some("greet".into()));
    }

    #[test]
    fn doubled_quote_unescapes() {
        assert_eq!(parse_load("LOAD 'it''s'"), Some("it's".into()));
    }

    #[test]
    fn non_load_statements_pass_through() {
        assert_eq!(parse_load("SELECT 1"), None);
        assert_eq!(parse_load("LOADER 'x'"), None);
        assert_eq!(parse_load("LOAD"), None);
        assert_eq!(parse_load("LOAD 'a' extra"), None);
        assert_eq!(parse_load("LOAD 'a'; SELECT 1"), None);
    }

    #[test]
    fn unterminated_quote_is_not_load() {
        assert_eq!(parse_load("LOAD 'greet"), None);
    }
}
