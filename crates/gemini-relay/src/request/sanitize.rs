//! Message content sanitization

/// Strip control characters (keeping line breaks and tabs) and trim
/// surrounding whitespace.
pub fn sanitize_content(content: &str) -> String {
    content
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect::<String>()
        .trim()
        .to_string()
}
