//! Media caption head/tail split.

use crate::chunking::{char_len, entity_safe_cut};

/// Caption head (sent with the media) and the remainder (sent as text).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptionSplit {
    pub head: String,
    pub tail: String,
}

/// Split already-escaped `text` at `caption_limit` characters.
///
/// The cut moves back to the start of an HTML entity rather than splitting
/// one such as `&amp;` across head and tail.
pub fn split_caption(text: &str, caption_limit: usize) -> CaptionSplit {
    if char_len(text) <= caption_limit {
        return CaptionSplit {
            head: text.to_string(),
            tail: String::new(),
        };
    }

    let cut = entity_safe_cut(text, caption_limit);
    CaptionSplit {
        head: text[..cut].to_string(),
        tail: text[cut..].to_string(),
    }
}
