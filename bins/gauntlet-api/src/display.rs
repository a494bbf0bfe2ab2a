// Display truncation for text echoed back to HTTP clients

const ELLIPSIS: &str = "...";

/// Cut `text` to at most `limit` characters, appending `...` when shortened.
/// A limit of zero disables truncation.
pub fn truncate_for_display(text: &str, limit: usize) -> String {
    if limit == 0 {
        return text.to_string();
    }
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}
