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

//! Session creation, refresh, and on-disk token caching.

use crate::api::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub did: String,
    pub handle: String,
    pub access_jwt: String,
    pub refresh_jwt: String,
    /// Service the tokens were minted for; a cached session from a different
    /// service is ignored.
    pub service: String,
}

/// Exchange identifier + app password for a fresh session.
pub async fn create_session(
    http: &reqwest::Client,
    service: &str,
    identifier: &str,
    password: &str,
) -> Result<SessionTokens, ApiError> {
    let body = serde_json::json!({ "identifier": identifier, "password": password });
    let resp = http
        .post(format!("{}/xrpc/com.atproto.server.createSession", service.trim_end_matches('/')))
        .json(&body)
        .send()
        .await?;
    decode_tokens(resp, service).await
}

/// Trade the refresh token for a new access token.
pub async fn refresh_session(
    http: &reqwest::Client,
    service: &str,
    refresh_jwt: &str,
) -> Result<SessionTokens, ApiError> {
    let resp = http
        .post(format!("{}/xrpc/com.atproto.server.refreshSession", service.trim_end_matches('/')))
        .bearer_auth(refresh_jwt)
        .send()
        .await?;
    decode_tokens(resp, service).await
}

async fn decode_tokens(resp: reqwest::Response, service: &str) -> Result<SessionTokens, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        #[derive(Deserialize)]
        struct ErrBody {
            error: Option<String>,
            message: Option<String>,
        }
        let body: ErrBody = resp.json().await.unwrap_or(ErrBody { error: None, message: None });
        let error = body.error.unwrap_or_else(|| "Unknown".to_owned());
        if error == "ExpiredToken" {
            return Err(ApiError::ExpiredSession);
        }
        return Err(ApiError::Xrpc {
            status: status.as_u16(),
            error,
            message: body.message.unwrap_or_else(|| status.to_string()),
        });
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Wire {
        did: String,
        handle: String,
        access_jwt: String,
        refresh_jwt: String,
    }
    let wire: Wire = serde_json::from_str(&resp.text().await?)?;
    Ok(SessionTokens {
        did: wire.did,
        handle: wire.handle,
        access_jwt: wire.access_jwt,
        refresh_jwt: wire.refresh_jwt,
        service: service.to_owned(),
    })
}

fn cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("skymsg").join("session.json"))
}

/// Load the cached session for this service, if any. Unreadable or mismatched
/// caches are treated as absent.
#[must_use]
pub fn load_cached(service: &str) -> Option<SessionTokens> {
    let path = cache_path()?;
    let data = std::fs::read_to_string(&path).ok()?;
    let tokens: SessionTokens = serde_json::from_str(&data).ok()?;
    if tokens.service != service {
        tracing::debug!(cached = %tokens.service, requested = %service, "ignoring session cache for other service");
        return None;
    }
    Some(tokens)
}

/// Persist tokens for the next run. Best-effort; callers log failures.
pub fn store_cached(tokens: &SessionTokens) -> std::io::Result<()> {
    let Some(path) = cache_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(tokens).map_err(std::io::Error::other)?;
    std::fs::write(path, data)
}
