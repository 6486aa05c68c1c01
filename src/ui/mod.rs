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

pub mod chat;
mod header;
mod input;
mod layout;
mod message;
mod pill;
mod screens;
pub mod theme;

use crate::app::{App, PICKER_EMOJI, Screen};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, app: &mut App) {
    let frame_area = frame.area();
    let input_lines = app.input.visual_line_count(frame_area.width.saturating_sub(2));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bottom_margin = app.viewport.bottom_margin().round().max(0.0) as u16;
    let areas = layout::compute(frame_area, input_lines, bottom_margin);

    if areas.header.height > 0 {
        header::render(frame, areas.header, app);
        render_separator(frame, areas.header_sep);
    }

    match app.screen {
        Screen::Conversation => chat::render(frame, areas.body, app),
        Screen::Notifications => screens::render_notifications(frame, areas.body, app),
        Screen::Discover => screens::render_discover(frame, areas.body, app),
        Screen::StarterPack => screens::render_starter_pack(frame, areas.body, app),
    }

    if areas.overlay.height > 0 {
        render_picker(frame, areas.overlay, app);
    }

    render_separator(frame, areas.input_sep);
    if app.screen == Screen::Conversation {
        input::render(frame, areas.input, app);
    } else {
        let hint = Line::from(Span::styled(
            "  Esc returns to the conversation",
            Style::default().fg(theme::DIM),
        ));
        frame.render_widget(Paragraph::new(hint), areas.input);
    }

    if let Some(footer_area) = areas.footer {
        render_footer(frame, footer_area, app);
    }
}

/// The emoji picker panel occupying the list's bottom margin while open.
fn render_picker(frame: &mut Frame, area: Rect, app: &App) {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let visible_rows = (app.picker.height.round().max(0.0) as u16).min(area.height);
    if visible_rows == 0 || !app.picker.open && !app.picker.is_transitioning() {
        return;
    }
    // The panel grows upward from the composer.
    let panel = Rect {
        y: area.bottom().saturating_sub(visible_rows),
        height: visible_rows,
        ..area
    };

    let mut spans = vec![Span::styled("  ", Style::default())];
    for (i, emoji) in PICKER_EMOJI.iter().enumerate() {
        let style = if i == app.picker.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {emoji} "), style));
    }
    let mut lines = vec![
        Line::from(Span::styled("  emoji", Style::default().fg(theme::DIM))),
        Line::from(spans),
    ];
    lines.truncate(usize::from(visible_rows));
    frame.render_widget(Paragraph::new(ratatui::text::Text::from(lines)), panel);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let hints = match app.screen {
        Screen::Conversation => "Ctrl+O tabs · Ctrl+E emoji · Enter send · Esc/Ctrl+C",
        Screen::Notifications => "r refresh · j/k scroll · Esc back",
        Screen::Discover => "g top · j/k scroll · Esc back",
        Screen::StarterPack => "Esc back",
    };
    let mut spans = vec![Span::styled(format!("  {hints}"), Style::default().fg(theme::DIM))];
    if app.convo.is_fetching_history() {
        spans.push(Span::styled(
            format!("   {} history", theme::spinner(app.spinner_frame)),
            Style::default().fg(theme::SKY_BLUE),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_separator(frame: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let sep = theme::SEPARATOR_CHAR.repeat(usize::from(area.width));
    let line = Line::from(Span::styled(sep, Style::default().fg(theme::DIM)));
    frame.render_widget(Paragraph::new(line), area);
}
