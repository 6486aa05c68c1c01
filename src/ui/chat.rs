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

//! The conversation body: builds the item lines, measures the content, runs
//! the viewport's resize transition, applies the resulting scroll, and feeds
//! the scroll tracker. All scroll policy lives in `app::viewport`; this file
//! only executes its effects.

use crate::app::App;
use crate::app::viewport::{PillState, ScrollSample, ScrollTo};
use crate::convo::ConvoStatus;
use crate::ui::{message, pill, theme};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};
use std::time::Instant;

/// Height of the history loader header. Always rendered, spinner or not, so
/// content measurements stay stable while fetching toggles.
pub const LOADER_ROWS: u16 = 2;

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn render(frame: &mut Frame, area: Rect, app: &mut App) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let fetching = app.convo.is_fetching_history();
    let mut all_lines = loader_lines(fetching, app.spinner_frame);

    if matches!(app.convo.status(), ConvoStatus::Uninitialized | ConvoStatus::Initializing) {
        all_lines.push(Line::from(Span::styled(
            format!("  {} opening conversation...", theme::spinner(app.spinner_frame)),
            Style::default().fg(theme::DIM),
        )));
    }

    let item_count = app.convo.items().len();
    // First paint renders only the most recent page-ish of items; once the
    // viewport settles, everything that is loaded gets rendered.
    let start = if app.viewport.is_settled() {
        0
    } else {
        item_count.saturating_sub(app.viewport.tuning().initial_render)
    };
    let peer = peer_label(&app.convo.title);
    for item in &app.convo.items()[start..] {
        all_lines.extend(message::item_lines(item, &app.did, &peer));
    }

    let paragraph = Paragraph::new(Text::from(all_lines)).wrap(Wrap { trim: false });
    let content_height = paragraph.line_count(area.width) as f64;
    let viewport_height = f64::from(area.height);

    // One growth decision per resize; repeats of the same extent are inert.
    let effects = app.viewport.on_content_resize(content_height, item_count, fetching);
    if let Some(scroll) = effects.scroll {
        app.scroll.apply(scroll);
    }
    if effects.schedule_settle {
        app.settle_deadline = Some(Instant::now() + app.viewport.tuning().settle_delay);
    }

    app.rendered_chat_area = area;
    if content_height <= viewport_height {
        // Short content stacks from the bottom, directly above the composer.
        let gap = (viewport_height - content_height) as u16;
        let render_area = Rect {
            y: area.y + gap,
            height: area.height - gap,
            ..area
        };
        app.scroll.apply(ScrollTo { offset: 0.0, animated: false });
        app.scroll.step(0.0);
        frame.render_widget(paragraph, render_area);
        app.tracker.observe(ScrollSample {
            offset: 0.0,
            layout_height: viewport_height,
            content_height,
        });
    } else {
        let max_scroll = content_height - viewport_height;
        let offset = app.scroll.step(max_scroll);
        frame.render_widget(paragraph.scroll((offset as u16, 0)), area);
        app.tracker.observe(ScrollSample { offset, layout_height: viewport_height, content_height });
    }

    // Nearing the top asks for older history; the store collapses refires.
    if app.viewport.cells().at_top() && app.viewport.should_fetch_history(item_count) {
        app.convo.fetch_message_history();
    }

    app.rendered_pill_area = if matches!(app.viewport.pill(), PillState::Shown { .. }) {
        pill::render(frame, area)
    } else {
        Rect::default()
    };
}

fn loader_lines(fetching: bool, spinner_frame: usize) -> Vec<Line<'static>> {
    let first = if fetching {
        Line::from(Span::styled(
            format!("  {} loading older messages...", theme::spinner(spinner_frame)),
            Style::default().fg(theme::DIM),
        ))
    } else {
        Line::default()
    };
    vec![first, Line::default()]
}

fn peer_label(title: &str) -> String {
    let first = title.split(',').next().unwrap_or("").trim();
    if first.is_empty() { "them".to_owned() } else { first.to_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loader_keeps_fixed_height_in_both_states() {
        assert_eq!(loader_lines(false, 0).len(), usize::from(LOADER_ROWS));
        assert_eq!(loader_lines(true, 3).len(), usize::from(LOADER_ROWS));
    }

    #[test]
    fn peer_label_takes_first_member() {
        assert_eq!(peer_label("alice.test, bob.test"), "alice.test");
        assert_eq!(peer_label(""), "them");
    }
}
