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

//! The protocol client surface this app consumes, and its XRPC implementation.
//!
//! Everything network-shaped goes through [`Transport`] so the store, the
//! send pipeline, and the screens can be driven by a stub in tests.

use crate::api::richtext::{ByteSlice, Facet, FacetFeature};
use crate::api::session::{self, SessionTokens};
use crate::api::ApiError;
use serde::Deserialize;
use std::cell::RefCell;

/// One message as rendered in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: String,
    pub rev: String,
    pub sender_did: String,
    pub text: String,
    pub facets: Vec<Facet>,
    pub sent_at: String,
}

/// Union over the message history wire shape: live messages and tombstones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRecord {
    Message(MessageView),
    Deleted { id: String },
}

/// One page of history, newest first as the service returns it.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub messages: Vec<MessageRecord>,
    pub cursor: Option<String>,
}

/// Outgoing message: text plus the facets that survived mention filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPayload {
    pub text: String,
    pub facets: Vec<Facet>,
}

/// A live update from the conversation log.
#[derive(Debug, Clone)]
pub enum LogEntry {
    MessageCreated { convo_id: String, message: MessageView },
    MessageDeleted { convo_id: String, id: String },
}

#[derive(Debug, Clone, Default)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConvoInfo {
    pub id: String,
    pub member_handles: Vec<String>,
    pub unread_count: u64,
}

#[derive(Debug, Clone)]
pub struct NotificationView {
    pub reason: String,
    pub author_handle: String,
    pub author_display_name: Option<String>,
    pub indexed_at: String,
    pub is_read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub did: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// A starter pack as fetched; `record` stays raw until validated.
#[derive(Debug, Clone)]
pub struct StarterPackView {
    pub uri: String,
    pub creator: ProfileView,
    pub record: serde_json::Value,
    pub list_item_count: u64,
}

/// The validated subset of a starter pack record the UI renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarterPackRecord {
    pub name: String,
    pub description: Option<String>,
    pub list: String,
}

impl StarterPackView {
    /// Validate the raw record. Malformed records are an error the screen
    /// turns into a placeholder view, never a crash.
    pub fn validated_record(&self) -> Result<StarterPackRecord, ApiError> {
        #[derive(Deserialize)]
        struct Wire {
            name: String,
            description: Option<String>,
            list: String,
        }
        let wire: Wire = serde_json::from_value(self.record.clone())?;
        if wire.name.trim().is_empty() || !wire.list.starts_with("at://") {
            return Err(ApiError::Xrpc {
                status: 400,
                error: "InvalidRecord".to_owned(),
                message: "starter pack record failed validation".to_owned(),
            });
        }
        Ok(StarterPackRecord { name: wire.name, description: wire.description, list: wire.list })
    }
}

/// The operations this client consumes from the protocol service.
#[async_trait::async_trait(?Send)]
pub trait Transport {
    async fn resolve_handle(&self, handle: &str) -> Result<String, ApiError>;
    async fn list_convos(&self, limit: usize) -> Result<Vec<ConvoInfo>, ApiError>;
    async fn fetch_messages(
        &self,
        convo_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<MessagePage, ApiError>;
    async fn send_message(
        &self,
        convo_id: &str,
        payload: &SendPayload,
    ) -> Result<MessageView, ApiError>;
    async fn get_log(&self, cursor: Option<&str>) -> Result<LogPage, ApiError>;
    async fn list_notifications(&self, limit: usize) -> Result<Vec<NotificationView>, ApiError>;
    async fn update_seen(&self) -> Result<(), ApiError>;
    async fn get_suggestions(&self, limit: usize) -> Result<Vec<ProfileView>, ApiError>;
    async fn get_starter_pack(&self, uri: &str) -> Result<StarterPackView, ApiError>;
}

// ---------------------------------------------------------------------------
// XRPC implementation
// ---------------------------------------------------------------------------

pub struct XrpcAgent {
    http: reqwest::Client,
    service: String,
    session: RefCell<SessionTokens>,
}

#[derive(Deserialize)]
struct XrpcErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl XrpcAgent {
    #[must_use]
    pub fn new(http: reqwest::Client, service: String, tokens: SessionTokens) -> Self {
        Self { http, service, session: RefCell::new(tokens) }
    }

    #[must_use]
    pub fn did(&self) -> String {
        self.session.borrow().did.clone()
    }

    #[must_use]
    pub fn handle(&self) -> String {
        self.session.borrow().handle.clone()
    }

    fn access_jwt(&self) -> String {
        self.session.borrow().access_jwt.clone()
    }

    fn endpoint(&self, nsid: &str) -> String {
        format!("{}/xrpc/{nsid}", self.service.trim_end_matches('/'))
    }

    async fn refresh(&self) -> Result<(), ApiError> {
        let refresh_jwt = self.session.borrow().refresh_jwt.clone();
        let tokens = session::refresh_session(&self.http, &self.service, &refresh_jwt).await?;
        if let Err(e) = session::store_cached(&tokens) {
            tracing::warn!(error = %e, "failed to cache refreshed session");
        }
        *self.session.borrow_mut() = tokens;
        Ok(())
    }

    async fn get_once(
        &self,
        nsid: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, ApiError> {
        let resp = self
            .http
            .get(self.endpoint(nsid))
            .query(params)
            .bearer_auth(self.access_jwt())
            .send()
            .await?;
        decode_response(resp).await
    }

    async fn post_once(
        &self,
        nsid: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        let resp = self
            .http
            .post(self.endpoint(nsid))
            .json(body)
            .bearer_auth(self.access_jwt())
            .send()
            .await?;
        decode_response(resp).await
    }

    /// GET with a single token refresh + retry when the access token expired.
    async fn get(&self, nsid: &str, params: &[(&str, &str)]) -> Result<serde_json::Value, ApiError> {
        match self.get_once(nsid, params).await {
            Err(e) if e.is_expired_token() => {
                self.refresh().await?;
                self.get_once(nsid, params).await
            }
            other => other,
        }
    }

    async fn post(&self, nsid: &str, body: &serde_json::Value) -> Result<serde_json::Value, ApiError> {
        match self.post_once(nsid, body).await {
            Err(e) if e.is_expired_token() => {
                self.refresh().await?;
                self.post_once(nsid, body).await
            }
            other => other,
        }
    }
}

async fn decode_response(resp: reqwest::Response) -> Result<serde_json::Value, ApiError> {
    let status = resp.status();
    if status.is_success() {
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(serde_json::Value::Null);
        }
        let text = resp.text().await?;
        if text.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        return Ok(serde_json::from_str(&text)?);
    }
    let body: XrpcErrorBody = resp.json().await.unwrap_or(XrpcErrorBody { error: None, message: None });
    Err(ApiError::Xrpc {
        status: status.as_u16(),
        error: body.error.unwrap_or_else(|| "Unknown".to_owned()),
        message: body.message.unwrap_or_else(|| status.to_string()),
    })
}

#[async_trait::async_trait(?Send)]
impl Transport for XrpcAgent {
    async fn resolve_handle(&self, handle: &str) -> Result<String, ApiError> {
        let value = self
            .get("com.atproto.identity.resolveHandle", &[("handle", handle)])
            .await?;
        #[derive(Deserialize)]
        struct Out {
            did: String,
        }
        let out: Out = serde_json::from_value(value)?;
        Ok(out.did)
    }

    async fn list_convos(&self, limit: usize) -> Result<Vec<ConvoInfo>, ApiError> {
        let limit = limit.to_string();
        let value = self.get("chat.bsky.convo.listConvos", &[("limit", limit.as_str())]).await?;
        let convos = value
            .get("convos")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(convos.iter().filter_map(convo_info_from_wire).collect())
    }

    async fn fetch_messages(
        &self,
        convo_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<MessagePage, ApiError> {
        let limit = limit.to_string();
        let mut params = vec![("convoId", convo_id), ("limit", limit.as_str())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor));
        }
        let value = self.get("chat.bsky.convo.getMessages", &params).await?;
        let messages = value
            .get("messages")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(message_record_from_wire).collect())
            .unwrap_or_default();
        let cursor = value.get("cursor").and_then(|v| v.as_str()).map(str::to_owned);
        Ok(MessagePage { messages, cursor })
    }

    async fn send_message(
        &self,
        convo_id: &str,
        payload: &SendPayload,
    ) -> Result<MessageView, ApiError> {
        let body = serde_json::json!({
            "convoId": convo_id,
            "message": {
                "text": payload.text,
                "facets": payload.facets.iter().filter_map(facet_to_wire).collect::<Vec<_>>(),
            },
        });
        let value = self.post("chat.bsky.convo.sendMessage", &body).await?;
        message_view_from_wire(&value).ok_or_else(|| ApiError::Xrpc {
            status: 200,
            error: "InvalidResponse".to_owned(),
            message: "sendMessage returned no message view".to_owned(),
        })
    }

    async fn get_log(&self, cursor: Option<&str>) -> Result<LogPage, ApiError> {
        let params: Vec<(&str, &str)> = match cursor {
            Some(c) => vec![("cursor", c)],
            None => Vec::new(),
        };
        let value = self.get("chat.bsky.convo.getLog", &params).await?;
        let entries = value
            .get("logs")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(log_entry_from_wire).collect())
            .unwrap_or_default();
        let cursor = value.get("cursor").and_then(|v| v.as_str()).map(str::to_owned);
        Ok(LogPage { entries, cursor })
    }

    async fn list_notifications(&self, limit: usize) -> Result<Vec<NotificationView>, ApiError> {
        let limit = limit.to_string();
        let value = self
            .get("app.bsky.notification.listNotifications", &[("limit", limit.as_str())])
            .await?;
        let items = value
            .get("notifications")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(items.iter().filter_map(notification_from_wire).collect())
    }

    async fn update_seen(&self) -> Result<(), ApiError> {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let body = serde_json::json!({ "seenAt": now });
        self.post("app.bsky.notification.updateSeen", &body).await?;
        Ok(())
    }

    async fn get_suggestions(&self, limit: usize) -> Result<Vec<ProfileView>, ApiError> {
        let limit = limit.to_string();
        let value = self.get("app.bsky.actor.getSuggestions", &[("limit", limit.as_str())]).await?;
        let actors = value
            .get("actors")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(actors.iter().filter_map(profile_from_wire).collect())
    }

    async fn get_starter_pack(&self, uri: &str) -> Result<StarterPackView, ApiError> {
        let value = self.get("app.bsky.graph.getStarterPack", &[("starterPack", uri)]).await?;
        let pack = value.get("starterPack").ok_or_else(|| ApiError::Xrpc {
            status: 200,
            error: "InvalidResponse".to_owned(),
            message: "getStarterPack returned no starterPack".to_owned(),
        })?;
        starter_pack_from_wire(pack).ok_or_else(|| ApiError::Xrpc {
            status: 400,
            error: "InvalidRecord".to_owned(),
            message: "starter pack view was malformed".to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire conversion
// ---------------------------------------------------------------------------

const MESSAGE_VIEW_TYPE: &str = "chat.bsky.convo.defs#messageView";
const DELETED_VIEW_TYPE: &str = "chat.bsky.convo.defs#deletedMessageView";
const MENTION_TYPE: &str = "app.bsky.richtext.facet#mention";
const LINK_TYPE: &str = "app.bsky.richtext.facet#link";
const TAG_TYPE: &str = "app.bsky.richtext.facet#tag";

/// Serialize a facet; unresolved mentions have no wire form and are skipped.
fn facet_to_wire(facet: &Facet) -> Option<serde_json::Value> {
    let mut features = Vec::new();
    for feature in &facet.features {
        let value = match feature {
            FacetFeature::Mention { did: Some(did), .. } => {
                serde_json::json!({ "$type": MENTION_TYPE, "did": did })
            }
            FacetFeature::Mention { did: None, .. } => return None,
            FacetFeature::Link { uri } => serde_json::json!({ "$type": LINK_TYPE, "uri": uri }),
            FacetFeature::Tag { tag } => serde_json::json!({ "$type": TAG_TYPE, "tag": tag }),
        };
        features.push(value);
    }
    Some(serde_json::json!({
        "index": { "byteStart": facet.index.byte_start, "byteEnd": facet.index.byte_end },
        "features": features,
    }))
}

fn facet_from_wire(value: &serde_json::Value) -> Option<Facet> {
    let index = value.get("index")?;
    let byte_start = index.get("byteStart")?.as_u64()? as usize;
    let byte_end = index.get("byteEnd")?.as_u64()? as usize;
    let mut features = Vec::new();
    for feature in value.get("features")?.as_array()? {
        let kind = feature.get("$type").and_then(|v| v.as_str())?;
        match kind {
            MENTION_TYPE => features.push(FacetFeature::Mention {
                handle: String::new(),
                did: feature.get("did").and_then(|v| v.as_str()).map(str::to_owned),
            }),
            LINK_TYPE => features.push(FacetFeature::Link {
                uri: feature.get("uri").and_then(|v| v.as_str())?.to_owned(),
            }),
            TAG_TYPE => features.push(FacetFeature::Tag {
                tag: feature.get("tag").and_then(|v| v.as_str())?.to_owned(),
            }),
            _ => {}
        }
    }
    Some(Facet { index: ByteSlice { byte_start, byte_end }, features })
}

fn message_view_from_wire(value: &serde_json::Value) -> Option<MessageView> {
    let facets = value
        .get("facets")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(facet_from_wire).collect())
        .unwrap_or_default();
    Some(MessageView {
        id: value.get("id")?.as_str()?.to_owned(),
        rev: value.get("rev").and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
        sender_did: value
            .get("sender")
            .and_then(|s| s.get("did"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_owned(),
        text: value.get("text")?.as_str()?.to_owned(),
        facets,
        sent_at: value.get("sentAt").and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
    })
}

fn message_record_from_wire(value: &serde_json::Value) -> Option<MessageRecord> {
    match value.get("$type").and_then(|v| v.as_str()) {
        Some(DELETED_VIEW_TYPE) => {
            Some(MessageRecord::Deleted { id: value.get("id")?.as_str()?.to_owned() })
        }
        Some(MESSAGE_VIEW_TYPE) | None => message_view_from_wire(value).map(MessageRecord::Message),
        Some(_) => None,
    }
}

fn log_entry_from_wire(value: &serde_json::Value) -> Option<LogEntry> {
    let kind = value.get("$type").and_then(|v| v.as_str())?;
    let convo_id = value.get("convoId")?.as_str()?.to_owned();
    match kind {
        "chat.bsky.convo.defs#logCreateMessage" => {
            let message = message_view_from_wire(value.get("message")?)?;
            Some(LogEntry::MessageCreated { convo_id, message })
        }
        "chat.bsky.convo.defs#logDeleteMessage" => {
            let id = value.get("message")?.get("id")?.as_str()?.to_owned();
            Some(LogEntry::MessageDeleted { convo_id, id })
        }
        _ => None,
    }
}

fn convo_info_from_wire(value: &serde_json::Value) -> Option<ConvoInfo> {
    let id = value.get("id")?.as_str()?.to_owned();
    let member_handles = value
        .get("members")
        .and_then(|v| v.as_array())
        .map(|members| {
            members
                .iter()
                .filter_map(|m| m.get("handle").and_then(|v| v.as_str()).map(str::to_owned))
                .collect()
        })
        .unwrap_or_default();
    let unread_count = value.get("unreadCount").and_then(|v| v.as_u64()).unwrap_or(0);
    Some(ConvoInfo { id, member_handles, unread_count })
}

fn notification_from_wire(value: &serde_json::Value) -> Option<NotificationView> {
    let author = value.get("author")?;
    Some(NotificationView {
        reason: value.get("reason")?.as_str()?.to_owned(),
        author_handle: author.get("handle")?.as_str()?.to_owned(),
        author_display_name: author
            .get("displayName")
            .and_then(|v| v.as_str())
            .map(str::to_owned),
        indexed_at: value.get("indexedAt").and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
        is_read: value.get("isRead").and_then(|v| v.as_bool()).unwrap_or(false),
    })
}

fn profile_from_wire(value: &serde_json::Value) -> Option<ProfileView> {
    Some(ProfileView {
        did: value.get("did")?.as_str()?.to_owned(),
        handle: value.get("handle")?.as_str()?.to_owned(),
        display_name: value.get("displayName").and_then(|v| v.as_str()).map(str::to_owned),
        description: value.get("description").and_then(|v| v.as_str()).map(str::to_owned),
    })
}

fn starter_pack_from_wire(value: &serde_json::Value) -> Option<StarterPackView> {
    Some(StarterPackView {
        uri: value.get("uri")?.as_str()?.to_owned(),
        creator: profile_from_wire(value.get("creator")?)?,
        record: value.get("record")?.clone(),
        list_item_count: value.get("listItemCount").and_then(|v| v.as_u64()).unwrap_or(0),
    })
}

// ---------------------------------------------------------------------------
// Offline transport
// ---------------------------------------------------------------------------

/// Transport that answers as an unreachable service. Used by `App::test_default`
/// and anywhere a `Transport` is required without a session.
pub struct NullTransport;

fn offline<T>() -> Result<T, ApiError> {
    Err(ApiError::Xrpc {
        status: 0,
        error: "Offline".to_owned(),
        message: "no transport configured".to_owned(),
    })
}

#[async_trait::async_trait(?Send)]
impl Transport for NullTransport {
    async fn resolve_handle(&self, _handle: &str) -> Result<String, ApiError> {
        offline()
    }
    async fn list_convos(&self, _limit: usize) -> Result<Vec<ConvoInfo>, ApiError> {
        Ok(Vec::new())
    }
    async fn fetch_messages(
        &self,
        _convo_id: &str,
        _cursor: Option<&str>,
        _limit: usize,
    ) -> Result<MessagePage, ApiError> {
        Ok(MessagePage::default())
    }
    async fn send_message(
        &self,
        _convo_id: &str,
        _payload: &SendPayload,
    ) -> Result<MessageView, ApiError> {
        offline()
    }
    async fn get_log(&self, _cursor: Option<&str>) -> Result<LogPage, ApiError> {
        Ok(LogPage::default())
    }
    async fn list_notifications(&self, _limit: usize) -> Result<Vec<NotificationView>, ApiError> {
        Ok(Vec::new())
    }
    async fn update_seen(&self) -> Result<(), ApiError> {
        Ok(())
    }
    async fn get_suggestions(&self, _limit: usize) -> Result<Vec<ProfileView>, ApiError> {
        Ok(Vec::new())
    }
    async fn get_starter_pack(&self, _uri: &str) -> Result<StarterPackView, ApiError> {
        offline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn facet_roundtrip_preserves_link() {
        let facet = Facet {
            index: ByteSlice { byte_start: 3, byte_end: 18 },
            features: vec![FacetFeature::Link { uri: "https://example.com".to_owned() }],
        };
        let wire = facet_to_wire(&facet).expect("wire form");
        let back = facet_from_wire(&wire).expect("parsed");
        assert_eq!(back.index, facet.index);
        assert_eq!(back.features, facet.features);
    }

    #[test]
    fn unresolved_mention_has_no_wire_form() {
        let facet = Facet {
            index: ByteSlice { byte_start: 0, byte_end: 10 },
            features: vec![FacetFeature::Mention { handle: "x.test".to_owned(), did: None }],
        };
        assert!(facet_to_wire(&facet).is_none());
    }

    #[test]
    fn message_record_parses_deleted_union() {
        let value = serde_json::json!({
            "$type": DELETED_VIEW_TYPE,
            "id": "3kabc",
            "rev": "r1",
        });
        let record = message_record_from_wire(&value).expect("record");
        assert!(matches!(record, MessageRecord::Deleted { ref id } if id == "3kabc"));
    }

    #[test]
    fn message_view_parses_sender_and_facets() {
        let value = serde_json::json!({
            "id": "3kdef",
            "rev": "r2",
            "text": "hi @alice.test",
            "sender": { "did": "did:plc:sender" },
            "sentAt": "2025-01-01T00:00:00Z",
            "facets": [{
                "index": { "byteStart": 3, "byteEnd": 14 },
                "features": [{ "$type": MENTION_TYPE, "did": "did:plc:alice" }],
            }],
        });
        let view = message_view_from_wire(&value).expect("view");
        assert_eq!(view.sender_did, "did:plc:sender");
        assert_eq!(view.facets.len(), 1);
    }

    #[test]
    fn starter_pack_record_validation_rejects_empty_name() {
        let pack = StarterPackView {
            uri: "at://did:plc:x/app.bsky.graph.starterpack/1".to_owned(),
            creator: ProfileView {
                did: "did:plc:x".to_owned(),
                handle: "x.test".to_owned(),
                display_name: None,
                description: None,
            },
            record: serde_json::json!({ "name": "  ", "list": "at://did:plc:x/list/1" }),
            list_item_count: 0,
        };
        assert!(pack.validated_record().is_err());
    }

    #[test]
    fn starter_pack_record_validation_accepts_wellformed() {
        let pack = StarterPackView {
            uri: "at://did:plc:x/app.bsky.graph.starterpack/1".to_owned(),
            creator: ProfileView {
                did: "did:plc:x".to_owned(),
                handle: "x.test".to_owned(),
                display_name: None,
                description: None,
            },
            record: serde_json::json!({
                "name": "Rustaceans",
                "description": "systems people",
                "list": "at://did:plc:x/app.bsky.graph.list/1",
            }),
            list_item_count: 12,
        };
        let record = pack.validated_record().expect("valid");
        assert_eq!(record.name, "Rustaceans");
        assert_eq!(record.description.as_deref(), Some("systems people"));
    }

}
