//! Outgoing text formatting for Telegram HTML parse mode.

/// Entities produced by [`escape_html`].
pub const HTML_ENTITIES: [&str; 4] = ["&amp;", "&lt;", "&gt;", "&quot;"];

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Prefix a post with its channel category, e.g. `[Alpha] ...`.
pub fn tag_with_category(category: Option<&str>, text: &str) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => format!("[{c}] {text}"),
        _ => text.to_string(),
    }
}
