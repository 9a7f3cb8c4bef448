//! SQL text helpers for the `SQLite` adapter.

/// Escapes SQL LIKE wildcards so they match literally.
///
/// `%`, `_` and the escape character `\` are each prefixed with `\`; use with
/// `LIKE ? ESCAPE '\'`.
///
/// # Examples
///
/// ```
/// use graphrel::storage::sqlite::escape_like_wildcards;
///
/// assert_eq!(escape_like_wildcards("index_"), "index\\_");
/// assert_eq!(escape_like_wildcards("100%"), "100\\%");
/// ```
#[must_use]
pub fn escape_like_wildcards(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '\\' => {
                result.push('\\');
                result.push(c);
            },
            _ => result.push(c),
        }
    }
    result
}

/// Builds a LIKE pattern matching every name that starts with `prefix`.
#[must_use]
pub fn prefix_pattern(prefix: &str) -> String {
    format!("{}%", escape_like_wildcards(prefix))
}
