//! Snippet windowing around a match
//!
//! All window arithmetic is in characters, not bytes, so offsets line up
//! with what a browser client sees for non-ASCII text.

use std::ops::Range;

/// Opening highlight marker
pub const MARK_OPEN: &str = "<mark>";

/// Closing highlight marker
pub const MARK_CLOSE: &str = "</mark>";

/// Elision marker placed at both ends of a snippet
pub const ELLIPSIS: &str = "...";

/// Pre- and post-match context windows, in characters.
///
/// Both ranges always lie within `0..=text_len` and are never reversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetWindow {
    pub pre: Range<usize>,
    pub post: Range<usize>,
}

impl SnippetWindow {
    /// Compute the context windows for a match spanning `match_start..match_end`.
    ///
    /// The overflow branch moves the post window to `len - window .. len - 1`.
    /// That arithmetic is kept as clients have always received it, then
    /// clamped into the text so it can never index out of range. A real
    /// match never ends past the text, so the scan itself never takes it.
    // TODO: drop the overflow branch once consumers confirm they do not rely on its trimming of the final char.
    pub fn compute(text_len: usize, match_start: usize, match_end: usize, window: usize) -> Self {
        let len = to_i64(text_len);
        let window = to_i64(window);
        let match_start = to_i64(match_start);
        let match_end = to_i64(match_end).max(match_start);

        let pre_start = match_start.saturating_sub(window).max(0);
        let pre_end = match_start;

        let mut post_start = match_start + (match_end - match_start);
        let mut post_end = post_start.saturating_add(window);
        if post_start > len {
            post_start = len.saturating_sub(window);
            post_end = len - 1;
        }

        Self {
            pre: clamp_range(pre_start, pre_end, len),
            post: clamp_range(post_start, post_end, len),
        }
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn clamp_range(start: i64, end: i64, len: i64) -> Range<usize> {
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    start..end.max(start)
}

/// Where a match sits in its section, in both byte and char units
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchSpan {
    pub bytes: Range<usize>,
    pub chars: Range<usize>,
}

/// Render `...<pre><mark>match</mark><post>...` for a match given in characters.
///
/// Out-of-range offsets are clamped, never rejected.
pub fn render_snippet(text: &str, match_start: usize, match_end: usize, window: usize) -> String {
    let text_len = text.chars().count();
    let start = match_start.min(text_len);
    let end = match_end.clamp(start, text_len);
    let span = MatchSpan {
        bytes: byte_offset(text, 0, 0, start)..byte_offset(text, 0, 0, end),
        chars: start..end,
    };
    render_span(text, text_len, &span, window)
}

/// Render a snippet for a match whose byte and char positions are both known
pub(crate) fn render_span(text: &str, text_len: usize, span: &MatchSpan, window: usize) -> String {
    let windows = SnippetWindow::compute(text_len, span.chars.start, span.chars.end, window);
    let anchor = (span.bytes.start, span.chars.start);

    let pre = slice_chars(text, anchor, &windows.pre);
    let post = slice_chars(text, anchor, &windows.post);
    let matched = &text[span.bytes.clone()];

    let mut out = String::with_capacity(
        ELLIPSIS.len() * 2 + MARK_OPEN.len() + MARK_CLOSE.len() + pre.len() + matched.len() + post.len(),
    );
    out.push_str(ELLIPSIS);
    out.push_str(pre);
    out.push_str(MARK_OPEN);
    out.push_str(matched);
    out.push_str(MARK_CLOSE);
    out.push_str(post);
    out.push_str(ELLIPSIS);
    out
}

/// Slice `range` (chars) out of `text`, walking from a known (byte, char) anchor
fn slice_chars<'a>(text: &'a str, anchor: (usize, usize), range: &Range<usize>) -> &'a str {
    let start = byte_offset(text, anchor.0, anchor.1, range.start);
    let end = byte_offset(text, start, range.start, range.end);
    &text[start..end]
}

/// Byte offset of char index `target`, walking from the anchor at
/// (`anchor_byte`, `anchor_char`). Targets past the end map to `text.len()`.
pub(crate) fn byte_offset(text: &str, anchor_byte: usize, anchor_char: usize, target: usize) -> usize {
    if target >= anchor_char {
        text[anchor_byte..]
            .char_indices()
            .nth(target - anchor_char)
            .map_or(text.len(), |(i, _)| anchor_byte + i)
    } else {
        text[..anchor_byte]
            .char_indices()
            .rev()
            .nth(anchor_char - target - 1)
            .map_or(0, |(i, _)| i)
    }
}
