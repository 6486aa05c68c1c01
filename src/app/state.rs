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

use crate::api::{NullTransport, Transport};
use crate::app::input::InputState;
use crate::app::notifications::NotificationsFeed;
use crate::app::search::DiscoverScreen;
use crate::app::starter_pack::StarterPackScreen;
use crate::app::viewport::{
    ConvoViewport, MainGate, ScrollTracker, ViewportNotice, ViewportTuning,
};
use crate::convo::{ConvoEvent, ConvoState};
use crate::error::AppError;
use std::rc::Rc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Which tab is in the foreground. Every screen other than the conversation
/// backgrounds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Conversation,
    Notifications,
    Discover,
    StarterPack,
}

impl Screen {
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Conversation => Self::Notifications,
            Self::Notifications => Self::Discover,
            Self::Discover => Self::StarterPack,
            Self::StarterPack => Self::Conversation,
        }
    }
}

/// Completion events from screen fetches and the send pipeline.
pub enum UiEvent {
    NotificationsLoaded(Vec<crate::api::NotificationView>),
    NotificationsFailed(String),
    SuggestionsLoaded(Vec<crate::api::ProfileView>),
    SuggestionsFailed(String),
    StarterPackLoaded(Box<crate::api::StarterPackView>),
    StarterPackFailed(String),
    /// Facet detection finished; hand the payload to the store.
    SendReady(crate::api::SendPayload),
}

/// Smoothed scroll position of the chat list, in rows from content start.
#[derive(Debug, Default)]
pub struct ListScroll {
    /// Where the list wants to be.
    pub target: f64,
    /// Where the list currently is (fractional, mid-animation).
    pub pos: f64,
}

impl ListScroll {
    /// Apply a viewport scroll command. Animated scrolls move the target and
    /// let the per-frame smoothing catch up; unanimated ones snap.
    pub fn apply(&mut self, scroll: crate::app::viewport::ScrollTo) {
        self.target = scroll.offset;
        if !scroll.animated {
            self.pos = scroll.offset;
        }
    }

    pub fn nudge(&mut self, delta: f64) {
        self.target = (self.target + delta).max(0.0);
    }

    /// One animation frame: close half the remaining distance, clamped to
    /// the scrollable range. Returns the rounded row offset to render at.
    pub fn step(&mut self, max_scroll: f64) -> f64 {
        self.target = self.target.clamp(0.0, max_scroll);
        let delta = self.target - self.pos;
        if delta.abs() < 0.01 {
            self.pos = self.target;
        } else {
            self.pos += delta * 0.5;
        }
        self.pos = self.pos.clamp(0.0, max_scroll);
        self.pos.round()
    }
}

/// The emoji picker panel under the chat: the bottom overlay that compresses
/// the list while it animates open.
pub struct EmojiPicker {
    pub open: bool,
    pub height: f64,
    pub selected: usize,
}

/// Rows the picker occupies when fully open.
pub const PICKER_HEIGHT: f64 = 8.0;
/// Rows the picker grows or shrinks per frame.
pub const PICKER_STEP: f64 = 2.0;

pub const PICKER_EMOJI: &[&str] = &[
    "😀", "😂", "🥲", "😍", "🤔", "👍", "👎", "🙏", "🔥", "✨", "🎉", "❤️", "🦀", "👀", "💯", "😭",
];

impl EmojiPicker {
    #[must_use]
    pub fn closed() -> Self {
        Self { open: false, height: 0.0, selected: 0 }
    }

    /// Height the picker is animating toward.
    #[must_use]
    pub fn target_height(&self) -> f64 {
        if self.open { PICKER_HEIGHT } else { 0.0 }
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        (self.height - self.target_height()).abs() > f64::EPSILON
    }
}

pub struct App {
    pub agent: Rc<dyn Transport>,
    pub convo: ConvoState,
    pub viewport: ConvoViewport,
    pub tracker: ScrollTracker,
    pub scroll: ListScroll,
    pub input: InputState,
    pub screen: Screen,
    pub notifications: NotificationsFeed,
    pub discover: DiscoverScreen,
    pub starter_pack: StarterPackScreen,
    pub starter_pack_uri: Option<String>,
    pub picker: EmojiPicker,

    pub handle: String,
    pub did: String,

    pub convo_rx: mpsc::UnboundedReceiver<ConvoEvent>,
    pub ui_tx: mpsc::UnboundedSender<UiEvent>,
    pub ui_rx: mpsc::UnboundedReceiver<UiEvent>,
    pub notice_rx: mpsc::UnboundedReceiver<ViewportNotice>,

    /// When set, `viewport.settle()` runs once this instant passes.
    pub settle_deadline: Option<Instant>,

    pub should_quit: bool,
    pub exit_error: Option<AppError>,
    pub spinner_frame: usize,
    pub force_redraw: bool,

    /// Area where the chat content was last rendered.
    pub rendered_chat_area: ratatui::layout::Rect,
    /// Area where the pill was last rendered (zero when hidden).
    pub rendered_pill_area: ratatui::layout::Rect,
}

impl App {
    #[must_use]
    pub fn new(agent: Rc<dyn Transport>, handle: String, did: String, tuning: ViewportTuning) -> Self {
        let (convo_tx, convo_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let viewport = ConvoViewport::new(tuning.clone());
        let tracker = viewport.tracker(MainGate::new(notice_tx));
        let convo = ConvoState::new(Rc::clone(&agent), convo_tx, tuning.page_cap);

        Self {
            agent,
            convo,
            viewport,
            tracker,
            scroll: ListScroll::default(),
            input: InputState::new(),
            screen: Screen::Conversation,
            notifications: NotificationsFeed::default(),
            discover: DiscoverScreen::default(),
            starter_pack: StarterPackScreen::Unloaded,
            starter_pack_uri: None,
            picker: EmojiPicker::closed(),
            handle,
            did,
            convo_rx,
            ui_tx,
            ui_rx,
            notice_rx,
            settle_deadline: None,
            should_quit: false,
            exit_error: None,
            spinner_frame: 0,
            force_redraw: false,
            rendered_chat_area: ratatui::layout::Rect::default(),
            rendered_pill_area: ratatui::layout::Rect::default(),
        }
    }

    /// Minimal app for tests: no session, offline transport, full profile.
    #[must_use]
    pub fn test_default() -> Self {
        Self::new(
            Rc::new(NullTransport),
            "me.test".to_owned(),
            "did:plc:me".to_owned(),
            ViewportTuning::full(),
        )
    }
}
