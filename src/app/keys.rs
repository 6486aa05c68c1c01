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

use crate::app::events::{scroll_active_screen, switch_screen};
use crate::app::input_submit::submit_input;
use crate::app::state::{App, PICKER_EMOJI, Screen};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const PAGE_SCROLL_LINES: f64 = 10.0;

pub fn handle_key(app: &mut App, key: KeyEvent) {
    if app.picker.open && handle_picker_key(app, key) {
        return;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        (KeyCode::Char('o'), m) if m.contains(KeyModifiers::CONTROL) => {
            switch_screen(app, app.screen.next());
        }
        (KeyCode::Char('e'), m) if m.contains(KeyModifiers::CONTROL) => {
            toggle_picker(app);
        }
        (KeyCode::Char('l'), m) if m.contains(KeyModifiers::CONTROL) => {
            app.force_redraw = true;
        }
        (KeyCode::Esc, _) => {
            if app.screen != Screen::Conversation {
                switch_screen(app, Screen::Conversation);
            }
        }
        _ => match app.screen {
            Screen::Conversation => handle_conversation_key(app, key),
            Screen::Notifications => handle_notifications_key(app, key),
            Screen::Discover => handle_discover_key(app, key),
            Screen::StarterPack => {}
        },
    }
}

fn handle_conversation_key(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Enter, m) if m.contains(KeyModifiers::SHIFT) || m.contains(KeyModifiers::ALT) => {
            app.input.insert_newline();
        }
        (KeyCode::Enter, _) => submit_input(app),
        (KeyCode::Backspace, _) => app.input.delete_char_before(),
        (KeyCode::Delete, _) => app.input.delete_char_after(),
        (KeyCode::Left, _) => app.input.move_left(),
        (KeyCode::Right, _) => app.input.move_right(),
        (KeyCode::Up, _) => app.input.move_up(),
        (KeyCode::Down, _) => app.input.move_down(),
        (KeyCode::Home, _) => app.input.move_line_start(),
        // End: pill press when it is showing, otherwise ride to the bottom.
        (KeyCode::End, _) => {
            if let Some(scroll) = app.viewport.press_pill() {
                app.scroll.apply(scroll);
            } else {
                app.input.move_line_end();
            }
        }
        (KeyCode::PageUp, _) => scroll_active_screen(app, -PAGE_SCROLL_LINES),
        (KeyCode::PageDown, _) => scroll_active_screen(app, PAGE_SCROLL_LINES),
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => {
            app.input.insert_char(c);
        }
        _ => {}
    }
}

fn handle_notifications_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.notifications.on_focus(&app.agent, &app.ui_tx),
        KeyCode::Char('j') | KeyCode::Down => app.notifications.scroll_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.notifications.scroll_by(-1),
        _ => {}
    }
}

fn handle_discover_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('g') => app.discover.soft_reset(),
        KeyCode::Char('j') | KeyCode::Down => app.discover.scroll_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.discover.scroll_by(-1),
        _ => {}
    }
}

fn toggle_picker(app: &mut App) {
    app.picker.open = !app.picker.open;
    app.viewport.overlay_open_started();
}

/// Keys the open picker consumes. Everything else falls through so typing
/// keeps working while it is open.
fn handle_picker_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Left => {
            app.picker.selected = app.picker.selected.saturating_sub(1);
            true
        }
        KeyCode::Right => {
            app.picker.selected = (app.picker.selected + 1).min(PICKER_EMOJI.len() - 1);
            true
        }
        KeyCode::Enter => {
            if let Some(emoji) = PICKER_EMOJI.get(app.picker.selected) {
                app.input.insert_str(emoji);
            }
            true
        }
        KeyCode::Esc => {
            toggle_picker(app);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::PICKER_HEIGHT;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_reaches_the_composer() {
        let mut app = App::test_default();
        handle_key(&mut app, key(KeyCode::Char('h')));
        handle_key(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.input.text(), "hi");
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let mut app = App::test_default();
        handle_key(&mut app, key(KeyCode::Char('a')));
        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        handle_key(&mut app, key(KeyCode::Char('b')));
        assert_eq!(app.input.text(), "a\nb");
    }

    #[tokio::test]
    async fn ctrl_o_cycles_screens() {
        // Screen focus handlers spawn fetches, so this needs a LocalSet.
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let mut app = App::test_default();
                handle_key(&mut app, KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL));
                assert_eq!(app.screen, Screen::Notifications);
            })
            .await;
    }

    #[test]
    fn picker_enter_inserts_selected_emoji() {
        let mut app = App::test_default();
        app.picker.open = true;
        app.picker.height = PICKER_HEIGHT;
        app.picker.selected = 0;
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.input.text(), PICKER_EMOJI[0]);
    }

    #[test]
    fn picker_escape_closes_instead_of_leaving_screen() {
        let mut app = App::test_default();
        app.picker.open = true;
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.picker.open);
        assert_eq!(app.screen, Screen::Conversation);
    }
}
