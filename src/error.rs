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

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    AuthRequired,
    #[error("Authentication rejected")]
    AuthRejected,
    #[error("Service connection failed")]
    ConnectionFailed,
    #[error("Session expired")]
    SessionExpired,
    #[error("Conversation not found")]
    ConvoNotFound,
}

impl AppError {
    pub const AUTH_REQUIRED_EXIT_CODE: i32 = 20;
    pub const AUTH_REJECTED_EXIT_CODE: i32 = 21;
    pub const CONNECTION_FAILED_EXIT_CODE: i32 = 22;
    pub const SESSION_EXPIRED_EXIT_CODE: i32 = 23;
    pub const CONVO_NOT_FOUND_EXIT_CODE: i32 = 24;

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthRequired => Self::AUTH_REQUIRED_EXIT_CODE,
            Self::AuthRejected => Self::AUTH_REJECTED_EXIT_CODE,
            Self::ConnectionFailed => Self::CONNECTION_FAILED_EXIT_CODE,
            Self::SessionExpired => Self::SESSION_EXPIRED_EXIT_CODE,
            Self::ConvoNotFound => Self::CONVO_NOT_FOUND_EXIT_CODE,
        }
    }

    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthRequired => {
                "No credentials. Pass --identifier/--app-password or set \
                 SKYMSG_IDENTIFIER and SKYMSG_APP_PASSWORD."
            }
            Self::AuthRejected => {
                "The service rejected the credentials. Check the identifier and app password."
            }
            Self::ConnectionFailed => "Failed to reach the service. Check the network and --service URL.",
            Self::SessionExpired => "The cached session expired and could not be refreshed. Sign in again.",
            Self::ConvoNotFound => "The requested conversation was not found.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            AppError::AuthRequired.exit_code(),
            AppError::AuthRejected.exit_code(),
            AppError::ConnectionFailed.exit_code(),
            AppError::SessionExpired.exit_code(),
            AppError::ConvoNotFound.exit_code(),
        ];
        let mut deduped = codes.to_vec();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), codes.len());
    }

    #[test]
    fn user_messages_are_nonempty() {
        for err in [
            AppError::AuthRequired,
            AppError::AuthRejected,
            AppError::ConnectionFailed,
            AppError::SessionExpired,
            AppError::ConvoNotFound,
        ] {
            assert!(!err.user_message().is_empty());
        }
    }
}
