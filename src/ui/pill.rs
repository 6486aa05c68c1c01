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

use crate::ui::theme;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

const PILL_TEXT: &str = " ↓ new messages · End to jump ";

/// Draw the new-messages pill floating over the bottom of the chat area and
/// return where it landed, for mouse hit-testing.
pub fn render(frame: &mut Frame, chat_area: Rect) -> Rect {
    #[allow(clippy::cast_possible_truncation)]
    let width = (PILL_TEXT.chars().count() as u16).min(chat_area.width);
    if width == 0 || chat_area.height == 0 {
        return Rect::default();
    }
    let x = chat_area.x + (chat_area.width - width) / 2;
    let y = chat_area.bottom().saturating_sub(1);
    let area = Rect { x, y, width, height: 1 };
    let line = Line::from(Span::styled(
        PILL_TEXT,
        Style::default().fg(theme::PILL_FG).bg(theme::PILL_BG).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(line), area);
    area
}
