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

//! Notifications feed: refreshed on focus, read state updated after the
//! refresh lands. Update failures keep the stale feed and log instead of
//! replacing it with an error screen.

use crate::api::{NotificationView, Transport};
use crate::app::state::UiEvent;
use std::rc::Rc;
use tokio::sync::mpsc;

const NOTIFICATIONS_PAGE: usize = 40;

#[derive(Default)]
pub struct NotificationsFeed {
    pub items: Vec<NotificationView>,
    pub loading: bool,
    /// Shown only when there is nothing else to render.
    pub error: Option<String>,
    pub scroll: usize,
    loaded_once: bool,
}

impl NotificationsFeed {
    /// The screen came into focus: refresh, then mark the feed seen.
    pub fn on_focus(&mut self, agent: &Rc<dyn Transport>, ui_tx: &mpsc::UnboundedSender<UiEvent>) {
        if self.loading {
            return;
        }
        tracing::debug!("updating notifications feed");
        self.loading = true;
        let agent = Rc::clone(agent);
        let tx = ui_tx.clone();
        tokio::task::spawn_local(async move {
            match agent.list_notifications(NOTIFICATIONS_PAGE).await {
                Ok(items) => {
                    let _ = tx.send(UiEvent::NotificationsLoaded(items));
                    // Read state only advances after a successful refresh.
                    if let Err(e) = agent.update_seen().await {
                        tracing::warn!(error = %e, "failed to update notification read state");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "error while updating notifications feed");
                    let _ = tx.send(UiEvent::NotificationsFailed(e.to_string()));
                }
            }
        });
    }

    pub fn apply_loaded(&mut self, items: Vec<NotificationView>) {
        self.loading = false;
        self.error = None;
        self.items = items;
        self.loaded_once = true;
        self.scroll = self.scroll.min(self.items.len().saturating_sub(1));
    }

    pub fn apply_failed(&mut self, message: String) {
        self.loading = false;
        // A feed we already have beats an error banner.
        if !self.loaded_once {
            self.error = Some(message);
        }
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.items.len().saturating_sub(1);
        let next = self.scroll.saturating_add_signed(delta);
        self.scroll = next.min(max);
    }
}
