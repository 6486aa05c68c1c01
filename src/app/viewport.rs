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

//! The conversation viewport controller.
//!
//! Coordinates the three forces that fight over the scroll position: content
//! growth (new messages appended, older history prepended), the user's own
//! scrolling, and the bottom overlay compressing the list. All decisions are
//! transition functions on [`ConvoViewport`] returning effect values, so the
//! chat renderer applies them and tests drive them directly.
//!
//! Scroll bookkeeping runs through [`ScrollTracker`] against shared atomic
//! cells. The tracker never mutates viewport state; the one thing it may do
//! is ask the main loop to dismiss the new-messages pill, and that crossing
//! goes through [`MainGate`] only.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Presentation tuning. The distances are in list rows; none of them are
/// derived, they are product tuning carried as configuration.
#[derive(Debug, Clone)]
pub struct ViewportTuning {
    /// How close to the content end still counts as "at the bottom".
    pub bottom_tolerance: f64,
    /// How close to the content start counts as "at the top".
    pub top_tolerance: f64,
    /// Scrolling this far past the pill anchor dismisses the pill.
    pub pill_dismiss_distance: f64,
    /// Height of the history loader header; content must outgrow it before
    /// any scroll decision is made.
    pub loader_height: f64,
    /// The pill anchors this far above the previous content end.
    pub pill_anchor_leadin: f64,
    /// Delay before the first stabilized render counts as "settled".
    pub settle_delay: Duration,
    /// Minimum loaded items before backward pagination may fire.
    pub page_cap: usize,
    /// Items rendered on the first paint.
    pub initial_render: usize,
    /// Rows reserved under the list when no overlay is open.
    pub static_bottom_inset: f64,
    /// Whether the list widget keeps prepended content visually stable on
    /// its own. Ours does not, so resizes compensate manually.
    pub maintains_visible_position: bool,
}

impl ViewportTuning {
    /// Profile for constrained terminals: smaller history pages.
    #[must_use]
    pub fn compact() -> Self {
        Self { page_cap: 30, initial_render: 32, static_bottom_inset: 3.0, ..Self::full() }
    }

    /// Profile for full-size terminals.
    #[must_use]
    pub fn full() -> Self {
        Self {
            bottom_tolerance: 100.0,
            top_tolerance: 1.0,
            pill_dismiss_distance: 200.0,
            loader_height: 50.0,
            pill_anchor_leadin: 65.0,
            settle_delay: Duration::from_millis(100),
            page_cap: 60,
            initial_render: 62,
            static_bottom_inset: 0.0,
            maintains_visible_position: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared cells + tracker
// ---------------------------------------------------------------------------

/// Scroll state shared between the tracking context and the main loop.
/// Plain atomic loads/stores; no cell participates in compound invariants.
pub struct ScrollCells {
    at_bottom: AtomicBool,
    at_top: AtomicBool,
    layout_height: AtomicU64,
    /// Pill anchor as f64 bits; NaN means no pill.
    pill_anchor: AtomicU64,
}

impl Default for ScrollCells {
    fn default() -> Self {
        Self {
            at_bottom: AtomicBool::new(true),
            at_top: AtomicBool::new(true),
            layout_height: AtomicU64::new(0f64.to_bits()),
            pill_anchor: AtomicU64::new(f64::NAN.to_bits()),
        }
    }
}

impl ScrollCells {
    #[must_use]
    pub fn at_bottom(&self) -> bool {
        self.at_bottom.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn at_top(&self) -> bool {
        self.at_top.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn layout_height(&self) -> f64 {
        f64::from_bits(self.layout_height.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn pill_anchor(&self) -> Option<f64> {
        let value = f64::from_bits(self.pill_anchor.load(Ordering::Relaxed));
        if value.is_nan() { None } else { Some(value) }
    }

    fn set_pill_anchor(&self, anchor: Option<f64>) {
        let bits = anchor.unwrap_or(f64::NAN).to_bits();
        self.pill_anchor.store(bits, Ordering::Relaxed);
    }
}

/// Requests the tracking context is allowed to make of the main loop.
#[derive(Debug, PartialEq, Eq)]
pub enum ViewportNotice {
    DismissPill,
}

/// The single audited crossing from the tracking context back to main state.
#[derive(Clone)]
pub struct MainGate {
    tx: mpsc::UnboundedSender<ViewportNotice>,
}

impl MainGate {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<ViewportNotice>) -> Self {
        Self { tx }
    }

    fn dismiss_pill(&self) {
        let _ = self.tx.send(ViewportNotice::DismissPill);
    }
}

/// One observed scroll frame.
#[derive(Debug, Clone, Copy)]
pub struct ScrollSample {
    /// Distance from content start to the viewport top.
    pub offset: f64,
    pub layout_height: f64,
    pub content_height: f64,
}

/// Per-frame scroll bookkeeping. Writes the shared cells and nothing else;
/// main-state changes go through the gate.
pub struct ScrollTracker {
    cells: Arc<ScrollCells>,
    bottom_tolerance: f64,
    top_tolerance: f64,
    pill_dismiss_distance: f64,
    gate: MainGate,
}

impl ScrollTracker {
    pub fn observe(&self, sample: ScrollSample) {
        self.cells.layout_height.store(sample.layout_height.to_bits(), Ordering::Relaxed);

        let bottom_offset = sample.offset + sample.layout_height;
        let at_bottom = sample.content_height - self.bottom_tolerance < bottom_offset;
        self.cells.at_bottom.store(at_bottom, Ordering::Relaxed);
        self.cells.at_top.store(sample.offset <= self.top_tolerance, Ordering::Relaxed);

        if let Some(anchor) = self.cells.pill_anchor()
            && (sample.offset > anchor + self.pill_dismiss_distance || at_bottom)
        {
            self.gate.dismiss_pill();
        }
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// A scroll the renderer must perform. `offset` may be `f64::MAX` meaning
/// "all the way to the end"; the renderer clamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTo {
    pub offset: f64,
    pub animated: bool,
}

/// Outcome of one content-resize transition.
#[derive(Debug, Default, PartialEq)]
pub struct ResizeEffects {
    pub scroll: Option<ScrollTo>,
    /// The pill became visible this transition.
    pub pill_shown: bool,
    /// Start the settle timer (`ViewportTuning::settle_delay`).
    pub schedule_settle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PillState {
    Hidden,
    Shown { anchor: f64 },
}

// ---------------------------------------------------------------------------
// The controller
// ---------------------------------------------------------------------------

pub struct ConvoViewport {
    tuning: ViewportTuning,
    cells: Arc<ScrollCells>,
    /// Content height at the previous resize.
    prev_extent: f64,
    /// Item count at the previous resize.
    prev_item_count: usize,
    /// One-shot: the conversation was backgrounded since the last resize.
    backgrounded: bool,
    /// The user's first scroll has completed; animations and pagination are
    /// allowed from here on.
    settled: bool,
    settle_pending: bool,
    pill: PillState,
    overlay_height: f64,
    overlay_opening: bool,
}

impl ConvoViewport {
    #[must_use]
    pub fn new(tuning: ViewportTuning) -> Self {
        Self {
            tuning,
            cells: Arc::new(ScrollCells::default()),
            prev_extent: 0.0,
            prev_item_count: 0,
            backgrounded: false,
            settled: false,
            settle_pending: false,
            pill: PillState::Hidden,
            overlay_height: 0.0,
            overlay_opening: false,
        }
    }

    #[must_use]
    pub fn tuning(&self) -> &ViewportTuning {
        &self.tuning
    }

    #[must_use]
    pub fn cells(&self) -> Arc<ScrollCells> {
        Arc::clone(&self.cells)
    }

    /// Build the scroll tracker bound to this viewport's cells.
    #[must_use]
    pub fn tracker(&self, gate: MainGate) -> ScrollTracker {
        ScrollTracker {
            cells: Arc::clone(&self.cells),
            bottom_tolerance: self.tuning.bottom_tolerance,
            top_tolerance: self.tuning.top_tolerance,
            pill_dismiss_distance: self.tuning.pill_dismiss_distance,
            gate,
        }
    }

    /// Record that the conversation went to the background. Consumed by the
    /// next content resize.
    pub fn mark_backgrounded(&mut self) {
        self.backgrounded = true;
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// The settle timer fired: the first render has stabilized.
    pub fn settle(&mut self) {
        self.settled = true;
        self.settle_pending = false;
    }

    #[must_use]
    pub fn pill(&self) -> PillState {
        self.pill
    }

    /// Decide what one content-size change means. Exactly one scroll action
    /// comes out of a growth event, and the pill is only ever shown instead
    /// of (never in addition to) a bottom follow.
    pub fn on_content_resize(
        &mut self,
        new_extent: f64,
        item_count: usize,
        fetching_history: bool,
    ) -> ResizeEffects {
        let mut effects = ResizeEffects::default();

        // Unchanged size is not a growth event; same-size re-reports (e.g.
        // from redraws) must not re-trigger scrolls or consume the
        // backgrounded flag.
        if (new_extent - self.prev_extent).abs() < f64::EPSILON
            && item_count == self.prev_item_count
        {
            return effects;
        }

        // Keep prepended history visually stable: without native support for
        // maintaining the visible position, shift by exactly the height delta.
        if !self.tuning.maintains_visible_position && self.cells.at_top() && self.settled {
            effects.scroll =
                Some(ScrollTo { offset: new_extent - self.prev_extent, animated: false });
        }

        if new_extent > self.tuning.loader_height && self.cells.at_bottom() {
            let growth = new_extent - self.prev_extent;
            let new_items = item_count.saturating_sub(self.prev_item_count);
            if self.backgrounded
                && self.settled
                && growth > self.cells.layout_height() - self.tuning.loader_height
                && new_items > 1
            {
                // More arrived than fits on screen: park the user just above
                // the new content and offer the pill instead of jumping.
                let anchor = self.prev_extent - self.tuning.pill_anchor_leadin;
                effects.scroll = Some(ScrollTo { offset: anchor, animated: true });
                self.pill = PillState::Shown { anchor };
                self.cells.set_pill_anchor(Some(anchor));
                effects.pill_shown = true;
            } else {
                // Follow the bottom. The very first resize jumps without
                // animation; animation is only enabled once settled.
                effects.scroll = Some(ScrollTo { offset: new_extent, animated: self.settled });
                if !self.settled && !fetching_history && !self.settle_pending {
                    self.settle_pending = true;
                    effects.schedule_settle = true;
                }
            }
        }

        self.prev_extent = new_extent;
        self.prev_item_count = item_count;
        self.backgrounded = false;
        effects
    }

    /// Whether nearing the top of the list should request older history.
    /// Quiet until the initial backfill reaches the page cap; the store
    /// de-duplicates rapid refires.
    #[must_use]
    pub fn should_fetch_history(&self, item_count: usize) -> bool {
        self.settled && item_count >= self.tuning.page_cap
    }

    /// Main-loop handler for tracker notices.
    pub fn apply_notice(&mut self, notice: &ViewportNotice) {
        match notice {
            ViewportNotice::DismissPill => self.hide_pill(),
        }
    }

    pub fn hide_pill(&mut self) {
        self.pill = PillState::Hidden;
        self.cells.set_pill_anchor(None);
    }

    /// The pill was pressed: hide it and ride down to the latest known
    /// content end.
    pub fn press_pill(&mut self) -> Option<ScrollTo> {
        if matches!(self.pill, PillState::Hidden) {
            return None;
        }
        self.hide_pill();
        Some(ScrollTo { offset: self.prev_extent, animated: true })
    }

    // -- Bottom overlay (composer growth, emoji picker) --

    pub fn overlay_open_started(&mut self) {
        self.overlay_opening = true;
    }

    /// Live overlay height update. Once the overlay clears the static inset
    /// the list is about to be compressed, so snap to the bottom immediately.
    pub fn overlay_height_changed(&mut self, height: f64) -> Option<ScrollTo> {
        self.overlay_height = height;
        if height > self.tuning.static_bottom_inset {
            Some(ScrollTo { offset: f64::MAX, animated: false })
        } else {
            None
        }
    }

    pub fn overlay_open_ended(&mut self) {
        self.overlay_opening = false;
    }

    /// Rows to reserve under the list so the composer and the last message
    /// stay above the overlay.
    #[must_use]
    pub fn bottom_margin(&self) -> f64 {
        self.overlay_height.max(self.tuning.static_bottom_inset)
    }

    /// The list finished a layout pass (e.g. the picker resized it). Follow
    /// to the end unless the overlay is mid-transition, which would fight
    /// the animation.
    #[must_use]
    pub fn on_layout_settled(&self) -> Option<ScrollTo> {
        if self.overlay_opening {
            None
        } else {
            Some(ScrollTo { offset: f64::MAX, animated: true })
        }
    }
}
