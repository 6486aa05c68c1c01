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

pub mod agent;
pub mod richtext;
pub mod session;

pub use agent::{
    ConvoInfo, LogEntry, LogPage, MessagePage, MessageRecord, MessageView, NotificationView,
    NullTransport, ProfileView, SendPayload, StarterPackRecord, StarterPackView, Transport,
    XrpcAgent,
};
pub use session::SessionTokens;

/// Error surface of the protocol client. Converted to `error::AppError` at the
/// app boundary where a typed exit code is needed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with an XRPC error body.
    #[error("{error}: {message}")]
    Xrpc { status: u16, error: String, message: String },
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("session expired")]
    ExpiredSession,
    #[error("not signed in")]
    NoSession,
}

impl ApiError {
    /// True when the access token was rejected and a refresh may help.
    #[must_use]
    pub fn is_expired_token(&self) -> bool {
        match self {
            Self::ExpiredSession => true,
            Self::Xrpc { error, .. } => error == "ExpiredToken",
            _ => false,
        }
    }
}
