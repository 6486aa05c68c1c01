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

//! Conversation item rendering: one closed enum, one exhaustive match.

use crate::api::richtext::{Facet, FacetFeature};
use crate::convo::ConvoItem;
use crate::ui::theme;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

const PAD: &str = "  ";

/// Render one conversation item into its lines, blank separator included.
#[must_use]
pub fn item_lines(item: &ConvoItem, own_did: &str, peer_label: &str) -> Vec<Line<'static>> {
    let mut lines = match item {
        ConvoItem::Message { message, .. } => {
            let mine = message.sender_did == own_did;
            let (label, color) = if mine {
                ("you".to_owned(), theme::SENDER_ME)
            } else {
                (peer_label.to_owned(), theme::SENDER_PEER)
            };
            let mut lines = vec![header_line(&label, &sent_at_clock(&message.sent_at), color)];
            lines.extend(text_lines(&message.text, &message.facets, Style::default()));
            lines
        }
        ConvoItem::PendingMessage { text, facets, .. } => {
            let mut lines = vec![header_line("you", "sending \u{25CC}", theme::PENDING)];
            lines.extend(text_lines(text, facets, Style::default().fg(theme::PENDING)));
            lines
        }
        ConvoItem::DeletedMessage { .. } => {
            vec![Line::from(Span::styled(
                format!("{PAD}Deleted message"),
                Style::default().fg(theme::DIM).add_modifier(Modifier::ITALIC),
            ))]
        }
        ConvoItem::Error { message, .. } => {
            vec![Line::from(Span::styled(
                format!("{PAD}\u{26A0} {message}"),
                Style::default().fg(theme::ERROR),
            ))]
        }
    };
    lines.push(Line::default());
    lines
}

fn header_line(label: &str, detail: &str, color: ratatui::style::Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{PAD}{label}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {detail}"), Style::default().fg(theme::DIM)),
    ])
}

/// HH:MM from an RFC 3339 timestamp; empty when unparsable.
fn sent_at_clock(sent_at: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(sent_at)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

fn text_lines(text: &str, facets: &[Facet], base: Style) -> Vec<Line<'static>> {
    let segments = styled_segments(text, facets, base);
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = vec![Span::raw(PAD)];
    for (chunk, style) in segments {
        let mut parts = chunk.split('\n');
        if let Some(first) = parts.next()
            && !first.is_empty()
        {
            current.push(Span::styled(first.to_owned(), style));
        }
        for part in parts {
            lines.push(Line::from(std::mem::replace(&mut current, vec![Span::raw(PAD)])));
            if !part.is_empty() {
                current.push(Span::styled(part.to_owned(), style));
            }
        }
    }
    lines.push(Line::from(current));
    lines
}

/// Split text into `(chunk, style)` pairs along facet boundaries. Facets with
/// indices that fall outside the text or off a char boundary render plain.
fn styled_segments(text: &str, facets: &[Facet], base: Style) -> Vec<(String, Style)> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;
    for facet in facets {
        let (start, end) = (facet.index.byte_start, facet.index.byte_end);
        if start < cursor || end > text.len() || start >= end {
            continue;
        }
        let Some(span_text) = text.get(start..end) else {
            continue;
        };
        if start > cursor
            && let Some(before) = text.get(cursor..start)
        {
            segments.push((before.to_owned(), base));
        }
        segments.push((span_text.to_owned(), facet_style(facet, base)));
        cursor = end;
    }
    if cursor < text.len()
        && let Some(rest) = text.get(cursor..)
    {
        segments.push((rest.to_owned(), base));
    }
    segments
}

fn facet_style(facet: &Facet, base: Style) -> Style {
    match facet.features.first() {
        Some(FacetFeature::Mention { .. }) => base.fg(theme::FACET_MENTION),
        Some(FacetFeature::Link { .. }) => {
            base.fg(theme::FACET_LINK).add_modifier(Modifier::UNDERLINED)
        }
        Some(FacetFeature::Tag { .. }) => base.fg(theme::FACET_TAG),
        None => base,
    }
}
