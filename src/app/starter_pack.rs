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

//! Starter pack screen. Records are validated after fetch; anything
//! malformed or unresolvable becomes a placeholder view rather than a crash.

use crate::api::{StarterPackRecord, StarterPackView, Transport};
use crate::app::state::UiEvent;
use std::rc::Rc;
use tokio::sync::mpsc;

pub const NOT_FOUND_MESSAGE: &str = "That starter pack could not be found.";

pub enum StarterPackScreen {
    Unloaded,
    Loading,
    Ready { pack: StarterPackView, record: StarterPackRecord },
    Failed(String),
}

impl StarterPackScreen {
    /// Kick off the fetch if it has not started yet.
    pub fn load(
        &mut self,
        agent: &Rc<dyn Transport>,
        ui_tx: &mpsc::UnboundedSender<UiEvent>,
        uri: &str,
    ) {
        if !matches!(self, Self::Unloaded) {
            return;
        }
        *self = Self::Loading;
        let agent = Rc::clone(agent);
        let tx = ui_tx.clone();
        let uri = uri.to_owned();
        tokio::task::spawn_local(async move {
            match agent.get_starter_pack(&uri).await {
                Ok(pack) => {
                    let _ = tx.send(UiEvent::StarterPackLoaded(Box::new(pack)));
                }
                Err(e) => {
                    tracing::warn!(error = %e, %uri, "starter pack fetch failed");
                    let _ = tx.send(UiEvent::StarterPackFailed(NOT_FOUND_MESSAGE.to_owned()));
                }
            }
        });
    }

    /// Validate and store the fetched pack. A record that fails validation is
    /// indistinguishable from a missing one as far as the user is concerned.
    pub fn apply_loaded(&mut self, pack: StarterPackView) {
        match pack.validated_record() {
            Ok(record) => *self = Self::Ready { pack, record },
            Err(e) => {
                tracing::warn!(error = %e, uri = %pack.uri, "starter pack record failed validation");
                *self = Self::Failed(NOT_FOUND_MESSAGE.to_owned());
            }
        }
    }

    pub fn apply_failed(&mut self, message: String) {
        *self = Self::Failed(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ProfileView;

    fn pack_with_record(record: serde_json::Value) -> StarterPackView {
        StarterPackView {
            uri: "at://did:plc:x/app.bsky.graph.starterpack/1".to_owned(),
            creator: ProfileView {
                did: "did:plc:x".to_owned(),
                handle: "x.test".to_owned(),
                display_name: None,
                description: None,
            },
            record,
            list_item_count: 5,
        }
    }

    #[test]
    fn wellformed_record_becomes_ready() {
        let mut screen = StarterPackScreen::Loading;
        screen.apply_loaded(pack_with_record(serde_json::json!({
            "name": "Rust folks",
            "list": "at://did:plc:x/app.bsky.graph.list/1",
        })));
        assert!(matches!(screen, StarterPackScreen::Ready { .. }));
    }

    #[test]
    fn malformed_record_becomes_placeholder_not_panic() {
        let mut screen = StarterPackScreen::Loading;
        screen.apply_loaded(pack_with_record(serde_json::json!({ "unexpected": true })));
        match screen {
            StarterPackScreen::Failed(message) => assert_eq!(message, NOT_FOUND_MESSAGE),
            _ => panic!("expected placeholder"),
        }
    }

    #[test]
    fn invalid_list_uri_fails_validation() {
        let mut screen = StarterPackScreen::Loading;
        screen.apply_loaded(pack_with_record(serde_json::json!({
            "name": "ok",
            "list": "https://not-an-at-uri",
        })));
        assert!(matches!(screen, StarterPackScreen::Failed(_)));
    }
}
