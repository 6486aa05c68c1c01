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

use crate::api::SendPayload;
use crate::api::richtext::RichText;
use crate::app::state::{App, Screen, UiEvent};
use crate::convo::ConvoStatus;
use std::rc::Rc;

/// Submit the composer: build rich text, shorten links, detect facets (which
/// suspends on mention resolution), drop unresolved mentions, then hand the
/// payload to the store via `SendReady`. Send failures are the store's to
/// surface as error items, not ours.
pub(super) fn submit_input(app: &mut App) {
    if app.screen != Screen::Conversation {
        return;
    }
    if !matches!(app.convo.status(), ConvoStatus::Ready | ConvoStatus::Backgrounded) {
        return;
    }

    let text = app.input.text();
    if text.trim().is_empty() {
        return;
    }
    app.input.clear();

    let agent = Rc::clone(&app.agent);
    let tx = app.ui_tx.clone();
    tokio::task::spawn_local(async move {
        let mut rt = RichText::new(&text);
        rt.shorten_links();
        rt.detect_facets(agent.as_ref()).await;
        rt.retain_resolved_mentions();
        let _ = tx.send(UiEvent::SendReady(SendPayload { text: rt.text, facets: rt.facets }));
    });
}
