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

//! Rendering for the non-conversation tabs.

use crate::api::NotificationView;
use crate::app::App;
use crate::app::starter_pack::StarterPackScreen;
use crate::ui::theme;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

pub fn render_notifications(frame: &mut Frame, area: Rect, app: &App) {
    let feed = &app.notifications;
    if feed.loading && feed.items.is_empty() {
        return render_centered(frame, area, &format!("{} loading...", theme::spinner(app.spinner_frame)));
    }
    if let Some(error) = &feed.error {
        return render_centered(frame, area, &format!("Could not load notifications: {error}"));
    }
    if feed.items.is_empty() {
        return render_centered(frame, area, "Nothing here yet.");
    }

    let mut lines = Vec::new();
    for item in feed.items.iter().skip(feed.scroll) {
        lines.push(notification_line(item));
    }
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn notification_line(item: &NotificationView) -> Line<'static> {
    let name = item.author_display_name.clone().unwrap_or_else(|| item.author_handle.clone());
    let what = match item.reason.as_str() {
        "like" => "liked your post",
        "repost" => "reposted your post",
        "follow" => "followed you",
        "mention" => "mentioned you",
        "reply" => "replied to you",
        "quote" => "quoted your post",
        other => other,
    };
    let style = if item.is_read {
        Style::default().fg(theme::DIM)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    Line::from(vec![
        Span::styled(format!("  {name} "), style),
        Span::styled(what.to_owned(), Style::default().fg(theme::DIM)),
    ])
}

pub fn render_discover(frame: &mut Frame, area: Rect, app: &App) {
    let screen = &app.discover;
    if screen.loading && screen.suggestions.is_empty() {
        return render_centered(frame, area, &format!("{} loading...", theme::spinner(app.spinner_frame)));
    }
    if let Some(error) = &screen.error {
        return render_centered(frame, area, &format!("Could not load suggestions: {error}"));
    }
    if screen.suggestions.is_empty() {
        return render_centered(frame, area, "No suggestions right now.");
    }

    let mut lines = vec![Line::from(Span::styled(
        "  Who to follow",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::default());
    for profile in screen.suggestions.iter().skip(screen.scroll) {
        let name = profile.display_name.clone().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!("  @{}", profile.handle), Style::default().fg(theme::SKY_BLUE)),
            Span::styled(if name.is_empty() { String::new() } else { format!("  {name}") }, Style::default()),
        ]));
        if let Some(description) = &profile.description {
            let first = description.lines().next().unwrap_or_default();
            lines.push(Line::from(Span::styled(
                format!("    {first}"),
                Style::default().fg(theme::DIM),
            )));
        }
    }
    frame.render_widget(Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }), area);
}

pub fn render_starter_pack(frame: &mut Frame, area: Rect, app: &App) {
    match &app.starter_pack {
        StarterPackScreen::Unloaded => {
            render_centered(frame, area, "Pass --starter-pack <at://uri> to view one.");
        }
        StarterPackScreen::Loading => {
            render_centered(frame, area, &format!("{} loading...", theme::spinner(app.spinner_frame)));
        }
        StarterPackScreen::Failed(message) => render_centered(frame, area, message),
        StarterPackScreen::Ready { pack, record } => {
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("  {}", record.name),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("  by @{} · {} people", pack.creator.handle, pack.list_item_count),
                    Style::default().fg(theme::DIM),
                )),
                Line::default(),
            ];
            if let Some(description) = &record.description {
                for row in description.lines() {
                    lines.push(Line::from(format!("  {row}")));
                }
            }
            frame.render_widget(Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }), area);
        }
    }
}

fn render_centered(frame: &mut Frame, area: Rect, text: &str) {
    let y = area.y + area.height / 2;
    let row = Rect { y, height: 1.min(area.height), ..area };
    let line = Line::from(Span::styled(text.to_owned(), Style::default().fg(theme::DIM)));
    frame.render_widget(
        Paragraph::new(line).alignment(ratatui::layout::Alignment::Center),
        row,
    );
}
