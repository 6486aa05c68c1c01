// skymsg — a terminal messaging client for the federated social web
// Copyright (C) 2025  The skymsg Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Rich text with byte-indexed facets (mentions, links, tags).
//!
//! Facet indices are UTF-8 byte offsets into the text, matching the wire
//! format. Link shortening runs before detection and seeds link facets with
//! the original URI so the display text can be rewritten without losing the
//! target.

use crate::api::Transport;

/// Longest link display text before it gets elided.
const MAX_LINK_DISPLAY: usize = 27;
/// Characters kept when eliding a long link (plus a `...` suffix).
const ELIDED_LINK_KEEP: usize = 24;
/// Hashtags longer than this are not worth linking.
const MAX_TAG_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: usize,
    pub byte_end: usize,
}

impl ByteSlice {
    #[must_use]
    pub fn overlaps(&self, other: &ByteSlice) -> bool {
        self.byte_start < other.byte_end && other.byte_start < self.byte_end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetFeature {
    /// `did` stays `None` until the handle resolves; unresolved mentions are
    /// dropped before sending.
    Mention { handle: String, did: Option<String> },
    Link { uri: String },
    Tag { tag: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub index: ByteSlice,
    pub features: Vec<FacetFeature>,
}

impl Facet {
    fn single(byte_start: usize, byte_end: usize, feature: FacetFeature) -> Self {
        Self { index: ByteSlice { byte_start, byte_end }, features: vec![feature] }
    }

    /// True when any feature is a mention whose subject never resolved.
    #[must_use]
    pub fn has_unresolved_mention(&self) -> bool {
        self.features
            .iter()
            .any(|f| matches!(f, FacetFeature::Mention { did: None, .. }))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    pub text: String,
    pub facets: Vec<Facet>,
}

impl RichText {
    /// Build rich text from raw composer input, normalizing newline runs.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self { text: clean_newlines(text), facets: Vec::new() }
    }

    /// Rewrite long URLs to elided display text, recording a link facet with
    /// the original URI over each rewritten span.
    pub fn shorten_links(&mut self) {
        let spans = find_url_spans(&self.text);
        if spans.is_empty() {
            return;
        }

        let mut out = String::with_capacity(self.text.len());
        let mut cursor = 0usize;
        for (start, end) in spans {
            out.push_str(&self.text[cursor..start]);
            let uri = &self.text[start..end];
            let display = to_short_url(uri);
            let new_start = out.len();
            out.push_str(&display);
            self.facets.push(Facet::single(
                new_start,
                out.len(),
                FacetFeature::Link { uri: uri.to_owned() },
            ));
            cursor = end;
        }
        out.push_str(&self.text[cursor..]);
        self.text = out;
    }

    /// Detect mention, link, and tag facets, resolving each mention's handle
    /// through the protocol client. Suspends on the network per mention;
    /// resolution failures leave `did` unset rather than erroring. Spans
    /// already covered by a facet (shortened links) are left alone.
    pub async fn detect_facets(&mut self, agent: &dyn Transport) {
        for (start, end, handle) in find_mention_spans(&self.text) {
            let did = match agent.resolve_handle(&handle).await {
                Ok(did) => Some(did),
                Err(e) => {
                    tracing::debug!(handle = %handle, error = %e, "mention did not resolve");
                    None
                }
            };
            self.push_non_overlapping(Facet::single(
                start,
                end,
                FacetFeature::Mention { handle, did },
            ));
        }

        for (start, end) in find_url_spans(&self.text) {
            let uri = self.text[start..end].to_owned();
            self.push_non_overlapping(Facet::single(start, end, FacetFeature::Link { uri }));
        }

        for (start, end, tag) in find_tag_spans(&self.text) {
            self.push_non_overlapping(Facet::single(start, end, FacetFeature::Tag { tag }));
        }

        self.facets.sort_by_key(|f| f.index.byte_start);
    }

    /// Drop facets carrying a mention whose subject identity failed to
    /// resolve, so no mention goes out without a resolvable target.
    pub fn retain_resolved_mentions(&mut self) {
        self.facets.retain(|f| !f.has_unresolved_mention());
    }

    fn push_non_overlapping(&mut self, facet: Facet) {
        if self.facets.iter().all(|f| !f.index.overlaps(&facet.index)) {
            self.facets.push(facet);
        }
    }
}

/// Collapse runs of three or more newlines down to two.
#[must_use]
pub fn clean_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            run += 1;
            if run <= 2 {
                out.push(ch);
            }
        } else {
            run = 0;
            out.push(ch);
        }
    }
    out.trim_end().to_owned()
}

/// Elide a URL for display: scheme stripped, long remainders truncated.
#[must_use]
pub fn to_short_url(uri: &str) -> String {
    let rest = uri
        .strip_prefix("https://")
        .or_else(|| uri.strip_prefix("http://"))
        .unwrap_or(uri);
    if rest.chars().count() <= MAX_LINK_DISPLAY {
        return rest.to_owned();
    }
    let kept: String = rest.chars().take(ELIDED_LINK_KEEP).collect();
    format!("{kept}...")
}

fn is_boundary_before(text: &str, byte_idx: usize) -> bool {
    byte_idx == 0
        || text[..byte_idx]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_whitespace() || c == '(')
}

/// Find `http(s)://` URL spans at word boundaries, trailing punctuation trimmed.
#[must_use]
pub fn find_url_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut search_from = 0usize;
    while let Some(rel) = text[search_from..].find("http") {
        let start = search_from + rel;
        let tail = &text[start..];
        let scheme_len = if tail.starts_with("https://") {
            8
        } else if tail.starts_with("http://") {
            7
        } else {
            search_from = start + 4;
            continue;
        };
        if !is_boundary_before(text, start) {
            search_from = start + scheme_len;
            continue;
        }

        let body_start = start + scheme_len;
        let mut end = body_start;
        for (i, ch) in text[body_start..].char_indices() {
            if ch.is_whitespace() {
                break;
            }
            end = body_start + i + ch.len_utf8();
        }
        if end == body_start {
            // Bare scheme with nothing after it.
            search_from = end;
            continue;
        }
        while let Some(last) = text[start..end].chars().next_back() {
            if matches!(last, '.' | ',' | ';' | ':' | '!' | '?' | ')' | '\'' | '"' | ']') {
                end -= last.len_utf8();
            } else {
                break;
            }
        }
        if end > body_start {
            spans.push((start, end));
        }
        search_from = end.max(body_start);
    }
    spans
}

/// Find `@handle` spans. The handle must look domain-like (contains a dot);
/// resolution decides whether it maps to a real identity.
#[must_use]
pub fn find_mention_spans(text: &str) -> Vec<(usize, usize, String)> {
    let mut spans = Vec::new();
    for (idx, ch) in text.char_indices() {
        if ch != '@' || !is_boundary_before(text, idx) {
            continue;
        }
        let body_start = idx + 1;
        let mut end = body_start;
        for (i, c) in text[body_start..].char_indices() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                end = body_start + i + c.len_utf8();
            } else {
                break;
            }
        }
        // Trailing dots belong to the sentence, not the handle.
        while text[body_start..end].ends_with('.') {
            end -= 1;
        }
        let handle = &text[body_start..end];
        if handle.contains('.') && !handle.starts_with('.') {
            spans.push((idx, end, handle.to_owned()));
        }
    }
    spans
}

/// Find `#tag` spans: alphanumeric/underscore, not purely numeric.
#[must_use]
pub fn find_tag_spans(text: &str) -> Vec<(usize, usize, String)> {
    let mut spans = Vec::new();
    for (idx, ch) in text.char_indices() {
        if ch != '#' || !is_boundary_before(text, idx) {
            continue;
        }
        let body_start = idx + 1;
        let mut end = body_start;
        for (i, c) in text[body_start..].char_indices() {
            if c.is_ascii_alphanumeric() || c == '_' {
                end = body_start + i + c.len_utf8();
            } else {
                break;
            }
        }
        let tag = &text[body_start..end];
        if tag.is_empty() || tag.len() > MAX_TAG_LEN || tag.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        spans.push((idx, end, tag.to_owned()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NullTransport;
    use pretty_assertions::assert_eq;

    #[test]
    fn clean_newlines_collapses_runs() {
        assert_eq!(clean_newlines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_newlines("a\nb"), "a\nb");
        assert_eq!(clean_newlines("a\n\n"), "a");
    }

    #[test]
    fn short_url_keeps_small_links() {
        assert_eq!(to_short_url("https://example.com/x"), "example.com/x");
    }

    #[test]
    fn short_url_elides_long_links() {
        let short = to_short_url("https://example.com/a/very/long/path/indeed/yes");
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), ELIDED_LINK_KEEP + 3);
    }

    #[test]
    fn url_spans_trim_trailing_punctuation() {
        let spans = find_url_spans("see https://example.com/a.");
        assert_eq!(spans, vec![(4, 25)]);
    }

    #[test]
    fn url_spans_require_word_boundary() {
        assert!(find_url_spans("xhttps://example.com").is_empty());
    }

    #[test]
    fn mention_spans_require_domain_shape() {
        let spans = find_mention_spans("hi @alice.test and @bob");
        assert_eq!(spans, vec![(3, 14, "alice.test".to_owned())]);
    }

    #[test]
    fn mention_spans_drop_trailing_dot() {
        let spans = find_mention_spans("ping @alice.test.");
        assert_eq!(spans, vec![(5, 16, "alice.test".to_owned())]);
    }

    #[test]
    fn tag_spans_skip_pure_numbers() {
        let spans = find_tag_spans("#2024 #rustlang");
        assert_eq!(spans, vec![(6, 15, "rustlang".to_owned())]);
    }

    #[test]
    fn shorten_links_records_original_uri() {
        let mut rt = RichText::new("go https://example.com/a/very/long/path/indeed/yes now");
        rt.shorten_links();
        assert_eq!(rt.facets.len(), 1);
        let facet = &rt.facets[0];
        assert_eq!(
            facet.features[0],
            FacetFeature::Link { uri: "https://example.com/a/very/long/path/indeed/yes".to_owned() }
        );
        let display = &rt.text[facet.index.byte_start..facet.index.byte_end];
        assert!(display.ends_with("..."));
        assert!(rt.text.ends_with(" now"));
    }

    #[test]
    fn shorten_links_multibyte_prefix_keeps_byte_offsets_valid() {
        let mut rt = RichText::new("héllo https://example.com/abc");
        rt.shorten_links();
        let facet = &rt.facets[0];
        assert_eq!(&rt.text[facet.index.byte_start..facet.index.byte_end], "example.com/abc");
    }

    #[tokio::test]
    async fn detect_facets_marks_unresolved_mentions() {
        let mut rt = RichText::new("hi @nobody.test");
        rt.detect_facets(&NullTransport).await;
        assert_eq!(rt.facets.len(), 1);
        assert!(rt.facets[0].has_unresolved_mention());
        rt.retain_resolved_mentions();
        assert!(rt.facets.is_empty());
    }

    #[tokio::test]
    async fn detect_facets_skips_spans_inside_link_facets() {
        let mut rt = RichText::new("https://example.com/#anchor_tag_like_path_segment_here");
        rt.shorten_links();
        let before = rt.facets.len();
        rt.detect_facets(&NullTransport).await;
        // The # inside the (shortened) link must not produce a tag facet.
        assert_eq!(rt.facets.len(), before);
    }

    #[tokio::test]
    async fn facets_sorted_by_start() {
        let mut rt = RichText::new("#ztag then @alice.test");
        rt.detect_facets(&NullTransport).await;
        let starts: Vec<usize> = rt.facets.iter().map(|f| f.index.byte_start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }
}
