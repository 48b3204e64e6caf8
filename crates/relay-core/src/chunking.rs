//! Transport-safe text splitting.
//!
//! Greedy and boundary-preferring: paragraphs first, then lines, then words,
//! and finally a hard cut for single tokens that are still too long. Lengths
//! are counted in characters (Unicode scalar values), not bytes.

use crate::{domain::Chunk, formatting::HTML_ENTITIES};

const PARAGRAPH_SEP: &str = "\n\n";
const LINE_SEP: &str = "\n";
const WORD_SEP: &str = " ";

/// Split `text` into ordered chunks of at most `limit` characters each.
///
/// Text that already fits is returned as a single chunk, unchanged (an empty
/// string yields one empty chunk). A `limit` of 0 is treated as 1.
pub fn split(text: &str, limit: usize) -> Vec<Chunk> {
    let parts = split_text(text, limit);
    let total_chunks = parts.len();
    parts
        .into_iter()
        .enumerate()
        .map(|(sequence_index, content)| Chunk {
            content,
            sequence_index,
            total_chunks,
        })
        .collect()
}

/// Same as [`split`], returning plain strings.
pub fn split_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if char_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut packer = Packer::new(limit);
    for paragraph in text.split(PARAGRAPH_SEP) {
        packer.add_paragraph(paragraph);
    }
    packer.finish()
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Longest prefix of `s` holding at most `max_chars` characters.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Byte offset of a cut at most `max_chars` characters into `text`.
///
/// Moves back to the `&` when the cut would land inside an HTML entity such
/// as `&amp;`, so both sides stay well-formed.
pub(crate) fn entity_safe_cut(text: &str, max_chars: usize) -> usize {
    let cut = truncate_chars(text, max_chars).len();
    if let Some(amp) = text[..cut].rfind('&') {
        let rest = &text[amp..];
        if HTML_ENTITIES
            .iter()
            .any(|e| rest.starts_with(e) && amp + e.len() > cut)
        {
            return amp;
        }
    }
    cut
}

/// Greedy accumulator shared by every split level.
///
/// `buf_len` counts characters including the separators re-appended to each
/// unit; separators are only dropped when a chunk is finalized.
struct Packer {
    limit: usize,
    chunks: Vec<String>,
    buf: String,
    buf_len: usize,
}

impl Packer {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            chunks: Vec::new(),
            buf: String::new(),
            buf_len: 0,
        }
    }

    /// Append `unit` + `sep` to the buffer, flushing first if it would
    /// overflow. Returns false when the unit cannot fit even in an empty
    /// buffer; the caller then descends one level.
    fn try_append(&mut self, unit: &str, sep: &str) -> bool {
        let len = char_len(unit) + char_len(sep);
        if self.buf_len + len > self.limit {
            self.flush();
        }
        if len > self.limit {
            return false;
        }
        self.buf.push_str(unit);
        self.buf.push_str(sep);
        self.buf_len += len;
        true
    }

    fn add_paragraph(&mut self, paragraph: &str) {
        if self.try_append(paragraph, PARAGRAPH_SEP) {
            return;
        }
        let mut lines = paragraph.split(LINE_SEP).peekable();
        while let Some(line) = lines.next() {
            let sep = if lines.peek().is_some() {
                LINE_SEP
            } else {
                PARAGRAPH_SEP
            };
            self.add_line(line, sep);
        }
    }

    fn add_line(&mut self, line: &str, sep: &str) {
        if self.try_append(line, sep) {
            return;
        }
        let mut words = line.split(WORD_SEP).peekable();
        while let Some(word) = words.next() {
            let word_sep = if words.peek().is_some() { WORD_SEP } else { sep };
            self.add_word(word, word_sep);
        }
    }

    fn add_word(&mut self, word: &str, sep: &str) {
        if self.try_append(word, sep) {
            return;
        }

        // Last resort: a single token longer than the limit is cut into
        // `limit`-sized pieces, shorter only where an entity straddles the
        // cut. Only the final piece carries the separator.
        let mut rest = word;
        while !rest.is_empty() {
            let cut = if char_len(rest) <= self.limit {
                rest.len()
            } else {
                match entity_safe_cut(rest, self.limit) {
                    // The entity alone exceeds the limit.
                    0 => truncate_chars(rest, self.limit).len(),
                    cut => cut,
                }
            };
            let (piece, tail) = rest.split_at(cut);
            rest = tail;
            let piece_sep = if rest.is_empty() { sep } else { "" };
            if !self.try_append(piece, piece_sep) {
                self.try_append(piece, "");
            }
        }
    }

    fn flush(&mut self) {
        let trimmed = self.buf.trim_end();
        if !trimmed.is_empty() {
            self.chunks
                .push(truncate_chars(trimmed, self.limit).to_string());
        }
        self.buf.clear();
        self.buf_len = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        if self.chunks.is_empty() {
            // Whitespace-only input longer than the limit.
            self.chunks.push(String::new());
        }
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatting::escape_html;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    fn joined_words(chunks: &[String]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|c| c.split_whitespace().map(str::to_string))
            .collect()
    }

    fn has_partial_entity(chunk: &str) -> bool {
        let opens_cleanly = chunk
            .match_indices('&')
            .all(|(i, _)| HTML_ENTITIES.iter().any(|e| chunk[i..].starts_with(e)));
        let closes_cleanly = chunk
            .match_indices(';')
            .all(|(i, _)| HTML_ENTITIES.iter().any(|e| chunk[..=i].ends_with(e)));
        !(opens_cleanly && closes_cleanly)
    }

    fn assert_bounded(chunks: &[String], limit: usize) {
        for c in chunks {
            assert!(
                char_len(c) <= limit,
                "chunk of {} chars exceeds {limit}",
                char_len(c)
            );
        }
    }

    #[test]
    fn short_text_is_a_single_unchanged_chunk() {
        let chunks = split("hello\n\nworld  ", 4096);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "hello\n\nworld  ");
        assert_eq!(chunks[0].sequence_index, 0);
        assert_eq!(chunks[0].total_chunks, 1);
    }

    #[test]
    fn empty_text_yields_one_empty_chunk() {
        assert_eq!(split_text("", 10), vec![String::new()]);
    }

    #[test]
    fn paragraphs_are_packed_greedily() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        let chunks = split_text(text, 12);
        assert_eq!(chunks, vec!["aaaa\n\nbbbb", "cccc"]);
    }

    #[test]
    fn oversized_paragraph_falls_back_to_lines() {
        let text = "intro\n\nline one\nline two\nline three";
        let chunks = split_text(text, 20);
        assert_bounded(&chunks, 20);
        assert_eq!(chunks, vec!["intro", "line one\nline two", "line three"]);
    }

    #[test]
    fn oversized_line_falls_back_to_words() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = split_text(text, 16);
        assert_bounded(&chunks, 16);
        assert_eq!(joined_words(&chunks), words(text));
        assert!(chunks.len() > 1);
    }

    #[test]
    fn single_huge_token_is_hard_cut_without_loss() {
        let text = "x".repeat(25);
        let chunks = split_text(&text, 10);
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn hard_cut_counts_characters_not_bytes() {
        let text = "é".repeat(7);
        let chunks = split_text(&text, 3);
        assert_eq!(chunks, vec!["ééé", "ééé", "é"]);
    }

    #[test]
    fn huge_token_between_words_keeps_order() {
        let text = format!("head {} tail", "y".repeat(12));
        let chunks = split_text(&text, 5);
        assert_bounded(&chunks, 5);
        assert_eq!(chunks, vec!["head", "yyyyy", "yyyyy", "yy", "tail"]);
    }

    #[test]
    fn chunks_have_no_trailing_whitespace() {
        let text = "one two   \nthree four   \n\nfive six   ";
        for c in split_text(text, 12) {
            assert_eq!(c, c.trim_end());
        }
    }

    #[test]
    fn whitespace_only_text_over_limit_yields_one_empty_chunk() {
        let text = "\n".repeat(30);
        assert_eq!(split_text(&text, 4), vec![String::new()]);
    }

    #[test]
    fn hard_cut_never_splits_an_html_entity() {
        let text = escape_html(&"a&b".repeat(10));
        let chunks = split_text(&text, 8);
        assert_bounded(&chunks, 8);
        assert_eq!(chunks.concat(), text);

        for c in &chunks {
            assert!(!has_partial_entity(c), "broken entity in {c:?}");
        }
        assert_eq!(chunks[0], "a&amp;ba");
        assert_eq!(chunks[1], "&amp;ba");
    }

    #[test]
    fn entity_safe_cut_backs_off_to_ampersand() {
        assert_eq!(entity_safe_cut("ab&amp;cd", 4), 2);
        assert_eq!(entity_safe_cut("ab&amp;cd", 7), 7);
        assert_eq!(entity_safe_cut("ab & cd", 3), 3);
    }

    #[test]
    fn zero_limit_is_treated_as_one() {
        let chunks = split_text("abc", 0);
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }

    #[test]
    fn bound_and_reconstruction_hold_across_limits() {
        let text = "Bitcoin rallied overnight.\n\nAnalysts point to ETF inflows and a \
                    weaker dollar.\nSome expect volatility to persist through the week.\n\n\
                    supercalifragilisticexpialidocious-token-without-any-spaces-at-all\n\
                    Closing remarks follow here with a few more words.";
        for limit in 1..=80 {
            let chunks = split_text(text, limit);
            assert_bounded(&chunks, limit);
            let rebuilt: String = chunks.concat().split_whitespace().collect();
            let original: String = text.split_whitespace().collect();
            assert_eq!(rebuilt, original, "limit {limit}");
        }
    }

    #[test]
    fn word_sequence_is_preserved_when_no_token_exceeds_limit() {
        let text = "Bitcoin rallied overnight.\n\nAnalysts point to ETF inflows and a \
                    weaker dollar.\nSome expect volatility to persist.";
        for limit in 12..=60 {
            let chunks = split_text(text, limit);
            assert_eq!(joined_words(&chunks), words(text), "limit {limit}");
        }
    }

    #[test]
    fn long_post_with_embedded_run_splits_into_two_chunks_at_word_level() {
        let mut text = String::new();
        for i in 0..300 {
            text.push_str(&format!("w{i:04} "));
        }
        text.push_str(&"z".repeat(30));
        text.push(' ');
        for i in 300..694 {
            text.push_str(&format!("w{i:04} "));
        }
        let filler = 4200 - char_len(&text);
        text.push_str(&"q".repeat(filler));
        assert_eq!(char_len(&text), 4200);

        let chunks = split(&text, 4096);
        assert_eq!(chunks.len(), 2);
        assert!(char_len(&chunks[0].content) <= 4096);
        assert!(char_len(&chunks[1].content) <= 4096);
        assert_eq!(chunks[1].total_chunks, 2);
        assert_eq!(chunks[1].label(), "2/2");

        let all: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.content.split_whitespace().map(str::to_string))
            .collect();
        assert_eq!(all, words(&text));
    }
}
