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

use crate::api::richtext::Facet;
use crate::api::{LogEntry, MessagePage, MessageView};

/// Lifecycle of the active conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvoStatus {
    Uninitialized,
    Initializing,
    Ready,
    /// The conversation screen is not in the foreground; messages keep
    /// arriving but the viewport must not follow them.
    Backgrounded,
    Suspended,
    /// Messaging is not available for this conversation (e.g. blocked).
    Disabled,
    Error,
}

/// One renderable unit in the conversation. Every variant carries a stable
/// key used for list reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvoItem {
    Message { key: String, message: MessageView },
    PendingMessage { key: String, text: String, facets: Vec<Facet> },
    DeletedMessage { key: String },
    Error { key: String, message: String },
}

impl ConvoItem {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Message { key, .. }
            | Self::PendingMessage { key, .. }
            | Self::DeletedMessage { key }
            | Self::Error { key, .. } => key,
        }
    }
}

/// Completion events from the store's background tasks, applied on the main
/// event loop.
#[derive(Debug)]
pub enum ConvoEvent {
    Opened { convo_id: String, title: String, page: MessagePage },
    OpenFailed(String),
    HistoryFetched(MessagePage),
    HistoryFailed(String),
    LogEntries(Vec<LogEntry>),
    Sent { pending_key: String, message: MessageView },
    SendFailed { pending_key: String, error: String },
}
