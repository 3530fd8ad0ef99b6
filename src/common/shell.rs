//! Shell quoting for displaying native command lines.

/// Quote a word for display in a shell command line.
///
/// Words made only of characters with no special meaning in the shell are
/// returned as-is; anything else is single-quoted.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    if s.chars().all(|c| {
        c.is_alphanumeric() || matches!(c, '-' | '_' | '=' | '/' | '.' | ':' | ',' | '+' | '@')
    }) {
        return s.to_string();
    }

    format!("'{}'", s.replace('\'', r"'\''"))
}
