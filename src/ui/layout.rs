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

use ratatui::layout::{Constraint, Layout, Rect};

pub struct AppLayout {
    pub header: Rect,
    pub header_sep: Rect,
    pub body: Rect,
    /// Rows reserved under the body: the bottom margin the viewport demands,
    /// where the emoji picker renders while open.
    pub overlay: Rect,
    pub input_sep: Rect,
    pub input: Rect,
    pub footer: Option<Rect>,
}

/// `bottom_margin` is the viewport's `bottom_margin()` rounded to rows; the
/// body always shrinks by exactly that much so the composer and the last
/// message stay above whatever occupies the margin.
pub fn compute(area: Rect, input_lines: u16, bottom_margin: u16) -> AppLayout {
    let input_height = input_lines.max(1);
    let zero = Rect::new(area.x, area.y, area.width, 0);

    if area.height < 8 {
        // Ultra-compact: body and input only
        let [body, overlay, input] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(bottom_margin),
            Constraint::Length(input_height),
        ])
        .areas(area);
        AppLayout {
            header: zero,
            header_sep: zero,
            body,
            overlay,
            input_sep: Rect::new(area.x, input.y, area.width, 0),
            input,
            footer: None,
        }
    } else {
        let [header, header_sep, body, overlay, input_sep, input, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(bottom_margin),
            Constraint::Length(1),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .areas(area);
        AppLayout { header, header_sep, body, overlay, input_sep, input, footer: Some(footer) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn area(w: u16, h: u16) -> Rect {
        Rect::new(0, 0, w, h)
    }

    fn total_height(layout: &AppLayout) -> u16 {
        layout.header.height
            + layout.header_sep.height
            + layout.body.height
            + layout.overlay.height
            + layout.input_sep.height
            + layout.input.height
            + layout.footer.map_or(0, |f| f.height)
    }

    fn assert_ordered(layout: &AppLayout) {
        let mut areas = vec![
            layout.header,
            layout.header_sep,
            layout.body,
            layout.overlay,
            layout.input_sep,
            layout.input,
        ];
        if let Some(f) = layout.footer {
            areas.push(f);
        }
        let visible: Vec<Rect> = areas.into_iter().filter(|r| r.height > 0).collect();
        for pair in visible.windows(2) {
            assert!(
                pair[0].y + pair[0].height <= pair[1].y,
                "{:?} overlaps {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn normal_terminal_has_all_areas() {
        let layout = compute(area(80, 24), 1, 0);
        assert_eq!(layout.header.height, 1);
        assert!(layout.body.height >= 3);
        assert_eq!(layout.overlay.height, 0);
        assert!(layout.footer.is_some());
        assert_eq!(total_height(&layout), 24);
    }

    #[test]
    fn bottom_margin_shrinks_body_not_input() {
        let without = compute(area(80, 24), 1, 0);
        let with = compute(area(80, 24), 1, 8);
        assert_eq!(with.overlay.height, 8);
        assert_eq!(with.input.height, without.input.height);
        assert_eq!(with.body.height, without.body.height - 8);
        assert_eq!(total_height(&with), 24);
    }

    #[test]
    fn input_keeps_requested_lines() {
        let layout = compute(area(80, 24), 4, 0);
        assert_eq!(layout.input.height, 4);
    }

    #[test]
    fn ultra_compact_drops_chrome() {
        let layout = compute(area(80, 6), 1, 0);
        assert_eq!(layout.header.height, 0);
        assert!(layout.footer.is_none());
        assert_eq!(total_height(&layout), 6);
    }

    #[test]
    fn overlay_present_in_compact_mode() {
        let layout = compute(area(80, 7), 1, 3);
        assert_eq!(layout.overlay.height, 3);
        assert_eq!(total_height(&layout), 7);
    }

    #[test]
    fn no_overlap_across_sizes() {
        for h in [1, 2, 6, 8, 24, 60] {
            for margin in [0, 3, 8] {
                let layout = compute(area(80, h), 2, margin);
                assert_ordered(&layout);
                assert_eq!(total_height(&layout), h, "height mismatch at h={h} margin={margin}");
            }
        }
    }

    #[test]
    fn offset_origin_is_respected() {
        let layout = compute(Rect::new(5, 3, 70, 20), 1, 0);
        assert_eq!(layout.header.x, 5);
        assert_eq!(layout.header.y, 3);
        assert_eq!(layout.body.width, 70);
    }
}
