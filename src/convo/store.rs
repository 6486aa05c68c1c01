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

//! The conversation state store.
//!
//! Owns the ordered item log (oldest first, newest at the bottom) and all
//! network-bound conversation work. Methods mutate synchronously on the main
//! loop; network completions re-enter through [`ConvoEvent`]s which the app
//! feeds back into [`ConvoState::apply`].

use crate::api::{LogEntry, MessagePage, MessageRecord, SendPayload, Transport};
use crate::convo::types::{ConvoEvent, ConvoItem, ConvoStatus};
use std::rc::Rc;
use tokio::sync::mpsc;

/// How often the conversation log is polled for new messages.
const LOG_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3);

pub struct ConvoState {
    agent: Rc<dyn Transport>,
    event_tx: mpsc::UnboundedSender<ConvoEvent>,
    convo_id: Option<String>,
    /// Other members' handles, for the header line.
    pub title: String,
    items: Vec<ConvoItem>,
    status: ConvoStatus,
    is_fetching_history: bool,
    history_cursor: Option<String>,
    reached_oldest: bool,
    /// History page size (the list profile's cap).
    page_size: usize,
}

impl ConvoState {
    #[must_use]
    pub fn new(
        agent: Rc<dyn Transport>,
        event_tx: mpsc::UnboundedSender<ConvoEvent>,
        page_size: usize,
    ) -> Self {
        Self {
            agent,
            event_tx,
            convo_id: None,
            title: String::new(),
            items: Vec::new(),
            status: ConvoStatus::Uninitialized,
            is_fetching_history: false,
            history_cursor: None,
            reached_oldest: false,
            page_size,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[ConvoItem] {
        &self.items
    }

    #[must_use]
    pub fn status(&self) -> ConvoStatus {
        self.status
    }

    #[must_use]
    pub fn is_fetching_history(&self) -> bool {
        self.is_fetching_history
    }

    /// Open a conversation: the given ID, or the most recent one when `None`.
    /// Completion arrives as `Opened` / `OpenFailed`.
    pub fn open(&mut self, convo_id: Option<&str>) {
        if matches!(self.status, ConvoStatus::Initializing) {
            return;
        }
        self.status = ConvoStatus::Initializing;
        let agent = Rc::clone(&self.agent);
        let tx = self.event_tx.clone();
        let wanted = convo_id.map(str::to_owned);
        let limit = self.page_size;
        tokio::task::spawn_local(async move {
            let resolved = match wanted {
                Some(id) => Ok((id, String::new())),
                None => match agent.list_convos(1).await {
                    Ok(convos) => match convos.into_iter().next() {
                        Some(info) => Ok((info.id, info.member_handles.join(", "))),
                        None => Err("no conversations yet".to_owned()),
                    },
                    Err(e) => Err(e.to_string()),
                },
            };
            let (id, title) = match resolved {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = tx.send(ConvoEvent::OpenFailed(e));
                    return;
                }
            };
            match agent.fetch_messages(&id, None, limit).await {
                Ok(page) => {
                    let _ = tx.send(ConvoEvent::Opened { convo_id: id, title, page });
                }
                Err(e) => {
                    let _ = tx.send(ConvoEvent::OpenFailed(e.to_string()));
                }
            }
        });
    }

    /// Request one page of older history. Idempotent while a fetch is in
    /// flight: concurrent calls collapse into the running one.
    pub fn fetch_message_history(&mut self) {
        if self.is_fetching_history || self.reached_oldest {
            return;
        }
        let Some(convo_id) = self.convo_id.clone() else {
            return;
        };
        self.is_fetching_history = true;
        let agent = Rc::clone(&self.agent);
        let tx = self.event_tx.clone();
        let cursor = self.history_cursor.clone();
        let limit = self.page_size;
        tokio::task::spawn_local(async move {
            match agent.fetch_messages(&convo_id, cursor.as_deref(), limit).await {
                Ok(page) => {
                    let _ = tx.send(ConvoEvent::HistoryFetched(page));
                }
                Err(e) => {
                    let _ = tx.send(ConvoEvent::HistoryFailed(e.to_string()));
                }
            }
        });
    }

    /// Optimistically append a pending item and submit the message. The
    /// pending item resolves to a message on success or an error item on
    /// failure; retry policy lives with the caller of a future send, not here.
    pub fn send_message(&mut self, payload: SendPayload) {
        let Some(convo_id) = self.convo_id.clone() else {
            return;
        };
        let pending_key = format!("pending-{}", uuid::Uuid::new_v4());
        self.items.push(ConvoItem::PendingMessage {
            key: pending_key.clone(),
            text: payload.text.clone(),
            facets: payload.facets.clone(),
        });
        let agent = Rc::clone(&self.agent);
        let tx = self.event_tx.clone();
        tokio::task::spawn_local(async move {
            match agent.send_message(&convo_id, &payload).await {
                Ok(message) => {
                    let _ = tx.send(ConvoEvent::Sent { pending_key, message });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "send failed");
                    let _ = tx.send(ConvoEvent::SendFailed { pending_key, error: e.to_string() });
                }
            }
        });
    }

    /// Start the background log poller that feeds new-message events.
    pub fn start_log_poll(&self) {
        let agent = Rc::clone(&self.agent);
        let tx = self.event_tx.clone();
        tokio::task::spawn_local(async move {
            let mut cursor: Option<String> = None;
            loop {
                tokio::time::sleep(LOG_POLL_INTERVAL).await;
                match agent.get_log(cursor.as_deref()).await {
                    Ok(page) => {
                        if page.cursor.is_some() {
                            cursor = page.cursor;
                        }
                        if !page.entries.is_empty()
                            && tx.send(ConvoEvent::LogEntries(page.entries)).is_err()
                        {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "log poll failed");
                    }
                }
            }
        });
    }

    /// Foreground/background the conversation. Only flips between the two
    /// live states; a disabled or errored conversation stays put.
    pub fn set_background(&mut self, background: bool) {
        self.status = match (self.status, background) {
            (ConvoStatus::Ready, true) => ConvoStatus::Backgrounded,
            (ConvoStatus::Backgrounded, false) => ConvoStatus::Ready,
            (other, _) => other,
        };
    }

    /// Apply a completion event. Pure state mutation, no spawning.
    pub fn apply(&mut self, event: ConvoEvent) {
        match event {
            ConvoEvent::Opened { convo_id, title, page } => {
                self.convo_id = Some(convo_id);
                if !title.is_empty() {
                    self.title = title;
                }
                self.items = items_from_page(&page);
                self.history_cursor = page.cursor;
                self.reached_oldest = self.history_cursor.is_none();
                self.status = ConvoStatus::Ready;
            }
            ConvoEvent::OpenFailed(message) => {
                tracing::error!(%message, "failed to open conversation");
                self.status = ConvoStatus::Error;
                self.items.push(ConvoItem::Error {
                    key: format!("error-{}", uuid::Uuid::new_v4()),
                    message,
                });
            }
            ConvoEvent::HistoryFetched(page) => {
                self.is_fetching_history = false;
                let mut older = items_from_page(&page);
                // The service repeats the boundary message on some cursors.
                older.retain(|item| !self.contains_key(item.key()));
                let mut items = std::mem::take(&mut self.items);
                older.append(&mut items);
                self.items = older;
                if page.cursor.is_none() {
                    self.reached_oldest = true;
                } else {
                    self.history_cursor = page.cursor;
                }
            }
            ConvoEvent::HistoryFailed(message) => {
                self.is_fetching_history = false;
                tracing::warn!(%message, "history fetch failed");
                self.items.insert(
                    0,
                    ConvoItem::Error {
                        key: format!("error-{}", uuid::Uuid::new_v4()),
                        message,
                    },
                );
            }
            ConvoEvent::LogEntries(entries) => {
                for entry in entries {
                    self.apply_log_entry(entry);
                }
            }
            ConvoEvent::Sent { pending_key, message } => {
                let key = message.id.clone();
                let resolved = ConvoItem::Message { key, message };
                if !self.replace_item(&pending_key, resolved.clone())
                    && !self.contains_key(resolved.key())
                {
                    self.items.push(resolved);
                }
            }
            ConvoEvent::SendFailed { pending_key, error } => {
                let failed = ConvoItem::Error { key: pending_key.clone(), message: error };
                if !self.replace_item(&pending_key, failed.clone()) {
                    self.items.push(failed);
                }
            }
        }
    }

    fn apply_log_entry(&mut self, entry: LogEntry) {
        match entry {
            LogEntry::MessageCreated { convo_id, message } => {
                if self.convo_id.as_deref() != Some(convo_id.as_str()) {
                    return;
                }
                if self.contains_key(&message.id) {
                    return;
                }
                let key = message.id.clone();
                self.items.push(ConvoItem::Message { key, message });
            }
            LogEntry::MessageDeleted { convo_id, id } => {
                if self.convo_id.as_deref() != Some(convo_id.as_str()) {
                    return;
                }
                let tombstone = ConvoItem::DeletedMessage { key: id.clone() };
                self.replace_item(&id, tombstone);
            }
        }
    }

    fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }

    fn replace_item(&mut self, key: &str, replacement: ConvoItem) -> bool {
        if let Some(slot) = self.items.iter_mut().find(|item| item.key() == key) {
            *slot = replacement;
            true
        } else {
            false
        }
    }
}

/// Convert a newest-first history page into oldest-first items.
fn items_from_page(page: &MessagePage) -> Vec<ConvoItem> {
    page.messages
        .iter()
        .rev()
        .map(|record| match record {
            MessageRecord::Message(message) => {
                ConvoItem::Message { key: message.id.clone(), message: message.clone() }
            }
            MessageRecord::Deleted { id } => ConvoItem::DeletedMessage { key: id.clone() },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MessageView, NullTransport};
    use pretty_assertions::assert_eq;

    fn message(id: &str, text: &str) -> MessageView {
        MessageView {
            id: id.to_owned(),
            rev: format!("rev-{id}"),
            sender_did: "did:plc:peer".to_owned(),
            text: text.to_owned(),
            facets: Vec::new(),
            sent_at: "2025-01-01T00:00:00Z".to_owned(),
        }
    }

    fn page(ids_newest_first: &[&str], cursor: Option<&str>) -> MessagePage {
        MessagePage {
            messages: ids_newest_first
                .iter()
                .map(|id| MessageRecord::Message(message(id, "hi")))
                .collect(),
            cursor: cursor.map(str::to_owned),
        }
    }

    fn test_store() -> ConvoState {
        let (tx, _rx) = mpsc::unbounded_channel();
        ConvoState::new(Rc::new(NullTransport), tx, 30)
    }

    fn opened_store(ids_newest_first: &[&str]) -> ConvoState {
        let mut store = test_store();
        store.apply(ConvoEvent::Opened {
            convo_id: "c1".to_owned(),
            title: "alice.test".to_owned(),
            page: page(ids_newest_first, Some("cur1")),
        });
        store
    }

    #[test]
    fn opened_reverses_to_oldest_first() {
        let store = opened_store(&["m3", "m2", "m1"]);
        let keys: Vec<&str> = store.items().iter().map(ConvoItem::key).collect();
        assert_eq!(keys, vec!["m1", "m2", "m3"]);
        assert_eq!(store.status(), ConvoStatus::Ready);
    }

    #[test]
    fn history_prepends_older_items() {
        let mut store = opened_store(&["m3", "m2"]);
        store.apply(ConvoEvent::HistoryFetched(page(&["m1", "m0"], Some("cur2"))));
        let keys: Vec<&str> = store.items().iter().map(ConvoItem::key).collect();
        assert_eq!(keys, vec!["m0", "m1", "m2", "m3"]);
    }

    #[test]
    fn history_drops_boundary_duplicates() {
        let mut store = opened_store(&["m2", "m1"]);
        store.apply(ConvoEvent::HistoryFetched(page(&["m1", "m0"], None)));
        let keys: Vec<&str> = store.items().iter().map(ConvoItem::key).collect();
        assert_eq!(keys, vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn history_failure_clears_flag_and_surfaces_error_item() {
        let mut store = opened_store(&["m1"]);
        store.apply(ConvoEvent::HistoryFailed("boom".to_owned()));
        assert!(!store.is_fetching_history());
        assert!(matches!(store.items().first(), Some(ConvoItem::Error { .. })));
    }

    #[tokio::test]
    async fn concurrent_history_fetches_deduplicate() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let (tx, mut rx) = mpsc::unbounded_channel();
                let mut store = ConvoState::new(Rc::new(NullTransport), tx, 30);
                store.apply(ConvoEvent::Opened {
                    convo_id: "c1".to_owned(),
                    title: String::new(),
                    page: page(&["m1"], Some("cur")),
                });
                store.fetch_message_history();
                assert!(store.is_fetching_history());
                // Second call while in flight must not spawn another fetch.
                store.fetch_message_history();
                // Drain: exactly one completion event.
                let first = rx.recv().await;
                assert!(matches!(first, Some(ConvoEvent::HistoryFetched(_))));
                assert!(rx.try_recv().is_err());
            })
            .await;
    }

    #[test]
    fn sent_replaces_pending_item_in_place() {
        let mut store = opened_store(&["m1"]);
        store.items.push(ConvoItem::PendingMessage {
            key: "pending-1".to_owned(),
            text: "out".to_owned(),
            facets: Vec::new(),
        });
        store.apply(ConvoEvent::Sent { pending_key: "pending-1".to_owned(), message: message("m2", "out") });
        let keys: Vec<&str> = store.items().iter().map(ConvoItem::key).collect();
        assert_eq!(keys, vec!["m1", "m2"]);
        assert!(matches!(store.items().last(), Some(ConvoItem::Message { .. })));
    }

    #[test]
    fn send_failure_becomes_error_item() {
        let mut store = opened_store(&["m1"]);
        store.items.push(ConvoItem::PendingMessage {
            key: "pending-1".to_owned(),
            text: "out".to_owned(),
            facets: Vec::new(),
        });
        store.apply(ConvoEvent::SendFailed {
            pending_key: "pending-1".to_owned(),
            error: "no".to_owned(),
        });
        assert!(matches!(store.items().last(), Some(ConvoItem::Error { .. })));
    }

    #[test]
    fn log_create_dedupes_already_known_ids() {
        let mut store = opened_store(&["m1"]);
        store.apply(ConvoEvent::LogEntries(vec![
            LogEntry::MessageCreated { convo_id: "c1".to_owned(), message: message("m1", "hi") },
            LogEntry::MessageCreated { convo_id: "c1".to_owned(), message: message("m2", "new") },
            LogEntry::MessageCreated { convo_id: "other".to_owned(), message: message("x", "no") },
        ]));
        let keys: Vec<&str> = store.items().iter().map(ConvoItem::key).collect();
        assert_eq!(keys, vec!["m1", "m2"]);
    }

    #[test]
    fn log_delete_leaves_tombstone() {
        let mut store = opened_store(&["m1"]);
        store.apply(ConvoEvent::LogEntries(vec![LogEntry::MessageDeleted {
            convo_id: "c1".to_owned(),
            id: "m1".to_owned(),
        }]));
        assert!(matches!(store.items().first(), Some(ConvoItem::DeletedMessage { .. })));
    }

    #[test]
    fn background_flips_only_live_states() {
        let mut store = opened_store(&["m1"]);
        store.set_background(true);
        assert_eq!(store.status(), ConvoStatus::Backgrounded);
        store.set_background(false);
        assert_eq!(store.status(), ConvoStatus::Ready);

        let mut fresh = test_store();
        fresh.set_background(true);
        assert_eq!(fresh.status(), ConvoStatus::Uninitialized);
    }
}
