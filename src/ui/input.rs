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

use crate::app::App;
use crate::convo::ConvoStatus;
use crate::ui::theme;
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

const PROMPT_WIDTH: u16 = 2;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    // A disabled conversation replaces the composer entirely.
    if app.convo.status() == ConvoStatus::Disabled {
        let notice = Line::from(Span::styled(
            "Messaging is unavailable for this conversation.",
            Style::default().fg(theme::DIM),
        ));
        frame.render_widget(Paragraph::new(notice), area);
        return;
    }

    let mut lines: Vec<Line> = Vec::with_capacity(app.input.lines.len());
    if app.input.is_empty() {
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", theme::PROMPT_CHAR), Style::default().fg(theme::SKY_BLUE)),
            Span::styled("Write a message...", Style::default().fg(theme::DIM)),
        ]));
    } else {
        for (i, text) in app.input.lines.iter().enumerate() {
            let prompt = if i == 0 { format!("{} ", theme::PROMPT_CHAR) } else { "  ".to_owned() };
            lines.push(Line::from(vec![
                Span::styled(prompt, Style::default().fg(theme::SKY_BLUE)),
                Span::raw(text.clone()),
            ]));
        }
    }
    frame.render_widget(Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }), area);

    let (row, col) = cursor_position(app, area.width);
    if row < area.height {
        frame.set_cursor_position(Position::new(area.x + col, area.y + row));
    }
}

/// Cursor cell within the composer area, accounting for soft wraps.
fn cursor_position(app: &App, area_width: u16) -> (u16, u16) {
    let inner = usize::from(area_width.saturating_sub(PROMPT_WIDTH)).max(1);
    let mut row = 0usize;
    for line in app.input.lines.iter().take(app.input.cursor_row) {
        let cols = UnicodeWidthStr::width(line.as_str());
        row += 1 + cols.saturating_sub(1) / inner;
    }
    let prefix: String =
        app.input.lines[app.input.cursor_row].chars().take(app.input.cursor_col).collect();
    let prefix_cols = UnicodeWidthStr::width(prefix.as_str());
    row += prefix_cols / inner;
    let col = PROMPT_WIDTH + u16::try_from(prefix_cols % inner).unwrap_or(0);
    (u16::try_from(row).unwrap_or(u16::MAX), col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cursor_tracks_simple_typing() {
        let mut app = App::test_default();
        app.input.insert_str("abc");
        assert_eq!(cursor_position(&app, 80), (0, PROMPT_WIDTH + 3));
    }

    #[test]
    fn cursor_moves_to_second_line_after_newline() {
        let mut app = App::test_default();
        app.input.insert_str("abc\nd");
        assert_eq!(cursor_position(&app, 80), (1, PROMPT_WIDTH + 1));
    }

    #[test]
    fn cursor_wraps_on_narrow_area() {
        let mut app = App::test_default();
        app.input.insert_str("abcdefgh");
        // Inner width 4: "abcd" / "efgh", cursor after the h on visual row 2.
        let (row, col) = cursor_position(&app, PROMPT_WIDTH + 4);
        assert_eq!(row, 2);
        assert_eq!(col, PROMPT_WIDTH);
    }
}
