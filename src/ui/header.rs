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

use crate::app::{App, Screen};
use crate::convo::ConvoStatus;
use crate::ui::theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    if area.height == 0 {
        return;
    }

    let screen_name = match app.screen {
        Screen::Conversation => {
            if app.convo.title.is_empty() {
                "messages".to_owned()
            } else {
                app.convo.title.clone()
            }
        }
        Screen::Notifications => "notifications".to_owned(),
        Screen::Discover => "discover".to_owned(),
        Screen::StarterPack => "starter pack".to_owned(),
    };

    let left = Line::from(vec![
        Span::styled(
            "  skymsg",
            Style::default().fg(theme::SKY_BLUE).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" · {screen_name}"), Style::default().fg(theme::DIM)),
        status_span(app.convo.status()),
    ]);
    frame.render_widget(Paragraph::new(left), area);

    let unread = app.notifications.unread_count();
    let right_text = if unread > 0 {
        format!("@{} · {unread} unread  ", app.handle)
    } else {
        format!("@{}  ", app.handle)
    };
    let right = Line::from(Span::styled(right_text, Style::default().fg(theme::DIM)));
    frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), area);
}

fn status_span(status: ConvoStatus) -> Span<'static> {
    let (text, color) = match status {
        ConvoStatus::Ready => ("", theme::DIM),
        ConvoStatus::Backgrounded => (" (backgrounded)", theme::DIM),
        ConvoStatus::Initializing | ConvoStatus::Uninitialized => (" (connecting)", theme::DIM),
        ConvoStatus::Suspended => (" (suspended)", theme::DIM),
        ConvoStatus::Disabled => (" (disabled)", theme::ERROR),
        ConvoStatus::Error => (" (error)", theme::ERROR),
    };
    Span::styled(text, Style::default().fg(color))
}
