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

mod events;
mod input;
mod input_submit;
mod keys;
pub mod notifications;
pub mod search;
pub mod starter_pack;
mod state;
pub mod viewport;

// Re-export the public surface so `crate::app::App` etc. keep working.
pub use events::{handle_convo_event, handle_terminal_event, handle_ui_event, switch_screen};
pub use input::InputState;
pub use state::{
    App, EmojiPicker, ListScroll, PICKER_EMOJI, PICKER_HEIGHT, PICKER_STEP, Screen, UiEvent,
};

use crate::Cli;
use crate::api::{ApiError, Transport, XrpcAgent, session};
use crate::error::AppError;
use crate::app::viewport::ViewportTuning;
use crossterm::event::{
    EventStream, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use futures::{FutureExt as _, StreamExt};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Terminals narrower than this get the compact list profile.
const COMPACT_WIDTH_THRESHOLD: u16 = 100;

/// Authenticate against the service: cached session first, fresh sign-in
/// otherwise. Runs before `ratatui::init()` so errors print normally.
pub async fn sign_in(cli: &Cli) -> anyhow::Result<Rc<XrpcAgent>> {
    let http = reqwest::Client::new();

    if let Some(tokens) = session::load_cached(&cli.service) {
        tracing::info!(handle = %tokens.handle, "using cached session");
        return Ok(Rc::new(XrpcAgent::new(http, cli.service.clone(), tokens)));
    }

    let identifier = cli
        .identifier
        .clone()
        .or_else(|| std::env::var("SKYMSG_IDENTIFIER").ok())
        .ok_or(AppError::AuthRequired)?;
    let password = cli
        .app_password
        .clone()
        .or_else(|| std::env::var("SKYMSG_APP_PASSWORD").ok())
        .ok_or(AppError::AuthRequired)?;

    eprintln!("Signing in as {identifier}...");
    let tokens = session::create_session(&http, &cli.service, &identifier, &password)
        .await
        .map_err(|e| match e {
            ApiError::Http(_) => anyhow::Error::new(AppError::ConnectionFailed),
            ApiError::Xrpc { status: 400 | 401, .. } => anyhow::Error::new(AppError::AuthRejected),
            other => anyhow::Error::new(other),
        })?;
    if let Err(e) = session::store_cached(&tokens) {
        tracing::warn!(error = %e, "failed to cache session");
    }
    tracing::info!(handle = %tokens.handle, did = %tokens.did, "signed in");
    Ok(Rc::new(XrpcAgent::new(http, cli.service.clone(), tokens)))
}

/// Build the app in its pre-conversation state (instant, no I/O).
#[must_use]
pub fn create_app(cli: &Cli, agent: Rc<XrpcAgent>) -> App {
    let handle = agent.handle();
    let did = agent.did();
    let transport: Rc<dyn Transport> = agent;
    let mut app = App::new(transport, handle, did, resolve_tuning(cli.compact));
    app.starter_pack_uri = cli.starter_pack.clone();
    app
}

/// Kick off the conversation load; completion re-enters via `ConvoEvent`.
pub fn start_conversation(app: &mut App, convo_id: Option<&str>) {
    app.convo.open(convo_id);
}

fn resolve_tuning(force_compact: bool) -> ViewportTuning {
    let profile = if force_compact {
        ViewportTuning::compact()
    } else {
        match crossterm::terminal::size() {
            Ok((cols, _rows)) if cols < COMPACT_WIDTH_THRESHOLD => ViewportTuning::compact(),
            _ => ViewportTuning::full(),
        }
    };
    // The growth threshold must equal the real height of the history loader
    // header the chat renders, or the first resize would be ignored.
    ViewportTuning { loader_height: f64::from(crate::ui::chat::LOADER_ROWS), ..profile }
}

// ---------------------------------------------------------------------------
// TUI event loop
// ---------------------------------------------------------------------------

pub async fn run_tui(app: &mut App) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Enable bracketed paste, mouse capture, focus reporting (ignore errors on
    // terminals that lack them).
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::EnableBracketedPaste,
        crossterm::event::EnableMouseCapture,
        crossterm::event::EnableFocusChange,
        // Enhanced keyboard protocol for reliable Shift+Enter detection
        PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
        )
    );

    let mut events = EventStream::new();
    let tick_duration = Duration::from_millis(16);
    let mut last_render = Instant::now();

    loop {
        // Phase 1: wait for at least one event or the next frame tick
        let time_to_next = tick_duration.saturating_sub(last_render.elapsed());
        tokio::select! {
            Some(Ok(event)) = events.next() => {
                events::handle_terminal_event(app, event);
            }
            Some(event) = app.convo_rx.recv() => {
                events::handle_convo_event(app, event);
            }
            Some(event) = app.ui_rx.recv() => {
                events::handle_ui_event(app, event);
            }
            Some(notice) = app.notice_rx.recv() => {
                app.viewport.apply_notice(&notice);
            }
            () = tokio::time::sleep(time_to_next) => {}
        }

        // Phase 2: drain all remaining queued events (non-blocking)
        loop {
            // Terminal events first (keeps typing responsive)
            if let Some(Some(Ok(event))) = events.next().now_or_never() {
                events::handle_terminal_event(app, event);
                continue;
            }
            if let Ok(event) = app.convo_rx.try_recv() {
                events::handle_convo_event(app, event);
                continue;
            }
            if let Ok(event) = app.ui_rx.try_recv() {
                events::handle_ui_event(app, event);
                continue;
            }
            match app.notice_rx.try_recv() {
                Ok(notice) => app.viewport.apply_notice(&notice),
                Err(_) => break,
            }
        }

        if app.should_quit {
            break;
        }

        // Phase 3: timers, then render once
        if let Some(deadline) = app.settle_deadline
            && Instant::now() >= deadline
        {
            app.viewport.settle();
            app.settle_deadline = None;
        }
        step_picker(app);
        if busy(app) {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
        }
        if app.force_redraw {
            terminal.clear()?;
            app.force_redraw = false;
        }
        terminal.draw(|f| crate::ui::render(f, app))?;
        last_render = Instant::now();
    }

    // Restore terminal
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableBracketedPaste,
        crossterm::event::DisableMouseCapture,
        crossterm::event::DisableFocusChange,
        PopKeyboardEnhancementFlags
    );
    ratatui::restore();

    Ok(())
}

fn busy(app: &App) -> bool {
    app.convo.is_fetching_history()
        || matches!(app.convo.status(), crate::convo::ConvoStatus::Initializing)
        || app.notifications.loading
        || app.discover.loading
}

/// Advance the picker's open/close animation one frame, feeding the viewport
/// the live overlay height exactly as it will land in the layout.
fn step_picker(app: &mut App) {
    if !app.picker.is_transitioning() {
        return;
    }
    let target = app.picker.target_height();
    let height = if target > app.picker.height {
        (app.picker.height + PICKER_STEP).min(target)
    } else {
        (app.picker.height - PICKER_STEP).max(target)
    };
    app.picker.height = height;
    if let Some(snap) = app.viewport.overlay_height_changed(height) {
        app.scroll.apply(snap);
    }
    if !app.picker.is_transitioning() {
        app.viewport.overlay_open_ended();
        // The list finished resizing around the overlay.
        if let Some(follow) = app.viewport.on_layout_settled() {
            app.scroll.apply(follow);
        }
    }
}
