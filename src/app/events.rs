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

use crate::app::keys;
use crate::app::state::{App, Screen, UiEvent};
use crate::convo::{ConvoEvent, ConvoStatus};
use crate::error::AppError;
use crossterm::event::{Event, KeyEventKind, MouseEvent, MouseEventKind};

const MOUSE_SCROLL_LINES: f64 = 3.0;

pub fn handle_terminal_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            keys::handle_key(app, key);
        }
        Event::Mouse(mouse) => {
            handle_mouse_event(app, mouse);
        }
        Event::Paste(text) => {
            if app.screen == Screen::Conversation {
                app.input.insert_str(&text);
            }
        }
        Event::FocusGained => {
            if app.screen == Screen::Conversation {
                app.convo.set_background(false);
            }
        }
        Event::FocusLost => {
            background_convo(app);
        }
        // Resize is handled automatically by ratatui
        _ => {}
    }
}

/// Background the conversation and arm the viewport's one-shot flag.
fn background_convo(app: &mut App) {
    app.convo.set_background(true);
    if app.convo.status() == ConvoStatus::Backgrounded {
        app.viewport.mark_backgrounded();
    }
}

/// Move to another tab. Leaving the conversation backgrounds it; screens
/// refresh themselves on focus.
pub fn switch_screen(app: &mut App, next: Screen) {
    if next == app.screen {
        return;
    }
    if app.screen == Screen::Conversation {
        background_convo(app);
    }
    app.screen = next;
    match next {
        Screen::Conversation => {
            app.convo.set_background(false);
        }
        Screen::Notifications => {
            app.notifications.on_focus(&app.agent, &app.ui_tx);
        }
        Screen::Discover => {
            app.discover.on_focus(&app.agent, &app.ui_tx);
        }
        Screen::StarterPack => {
            if let Some(uri) = app.starter_pack_uri.clone() {
                app.starter_pack.load(&app.agent, &app.ui_tx, &uri);
            }
        }
    }
}

pub fn handle_convo_event(app: &mut App, event: ConvoEvent) {
    let opened = matches!(event, ConvoEvent::Opened { .. });
    let open_failed = matches!(event, ConvoEvent::OpenFailed(_));
    app.convo.apply(event);
    if opened {
        app.convo.start_log_poll();
        // Opening completed while the user was on another tab.
        if app.screen != Screen::Conversation {
            background_convo(app);
        }
    }
    if open_failed {
        // Nothing to show without a conversation; exit with the typed code.
        app.exit_error = Some(AppError::ConvoNotFound);
        app.should_quit = true;
    }
}

pub fn handle_ui_event(app: &mut App, event: UiEvent) {
    match event {
        UiEvent::NotificationsLoaded(items) => app.notifications.apply_loaded(items),
        UiEvent::NotificationsFailed(message) => app.notifications.apply_failed(message),
        UiEvent::SuggestionsLoaded(profiles) => app.discover.apply_loaded(profiles),
        UiEvent::SuggestionsFailed(message) => app.discover.apply_failed(message),
        UiEvent::StarterPackLoaded(pack) => app.starter_pack.apply_loaded(*pack),
        UiEvent::StarterPackFailed(message) => app.starter_pack.apply_failed(message),
        UiEvent::SendReady(payload) => app.convo.send_message(payload),
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if let MouseEventKind::Down(crossterm::event::MouseButton::Left) = mouse.kind {
        let pill = app.rendered_pill_area;
        if pill.height > 0
            && mouse.column >= pill.x
            && mouse.column < pill.right()
            && mouse.row >= pill.y
            && mouse.row < pill.bottom()
            && let Some(scroll) = app.viewport.press_pill()
        {
            app.scroll.apply(scroll);
            return;
        }
    }

    match mouse.kind {
        MouseEventKind::ScrollUp => scroll_active_screen(app, -MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown => scroll_active_screen(app, MOUSE_SCROLL_LINES),
        _ => {}
    }
}

pub(super) fn scroll_active_screen(app: &mut App, delta: f64) {
    match app.screen {
        Screen::Conversation => app.scroll.nudge(delta),
        #[allow(clippy::cast_possible_truncation)]
        Screen::Notifications => app.notifications.scroll_by(delta as isize),
        #[allow(clippy::cast_possible_truncation)]
        Screen::Discover => app.discover.scroll_by(delta as isize),
        Screen::StarterPack => {}
    }
}
