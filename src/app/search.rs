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

//! Discover screen: who-to-follow suggestions with a reload window, so the
//! list only refetches when the user comes back after a while.

use crate::api::{ProfileView, Transport};
use crate::app::state::UiEvent;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Suggestions older than this are reloaded on the next focus.
pub const RELOAD_WINDOW: Duration = Duration::from_secs(5 * 60);

const SUGGESTIONS_PAGE: usize = 25;

#[derive(Default)]
pub struct DiscoverScreen {
    pub suggestions: Vec<ProfileView>,
    pub loading: bool,
    pub error: Option<String>,
    pub scroll: usize,
    last_loaded: Option<Instant>,
}

impl DiscoverScreen {
    /// Focus handler: refetch only when the reload window has elapsed.
    pub fn on_focus(&mut self, agent: &Rc<dyn Transport>, ui_tx: &mpsc::UnboundedSender<UiEvent>) {
        if !self.should_reload(Instant::now()) || self.loading {
            return;
        }
        self.loading = true;
        let agent = Rc::clone(agent);
        let tx = ui_tx.clone();
        tokio::task::spawn_local(async move {
            match agent.get_suggestions(SUGGESTIONS_PAGE).await {
                Ok(profiles) => {
                    let _ = tx.send(UiEvent::SuggestionsLoaded(profiles));
                }
                Err(e) => {
                    let _ = tx.send(UiEvent::SuggestionsFailed(e.to_string()));
                }
            }
        });
    }

    #[must_use]
    pub fn should_reload(&self, now: Instant) -> bool {
        match self.last_loaded {
            None => true,
            Some(at) => now.duration_since(at) > RELOAD_WINDOW,
        }
    }

    pub fn apply_loaded(&mut self, profiles: Vec<ProfileView>) {
        self.loading = false;
        self.error = None;
        self.suggestions = profiles;
        self.last_loaded = Some(Instant::now());
    }

    pub fn apply_failed(&mut self, message: String) {
        self.loading = false;
        if self.suggestions.is_empty() {
            self.error = Some(message);
        }
    }

    /// Soft reset: back to the top without refetching.
    pub fn soft_reset(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.suggestions.len().saturating_sub(1);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }
}
