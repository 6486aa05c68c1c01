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

use ratatui::style::Color;

// Accent
pub const SKY_BLUE: Color = Color::Rgb(32, 139, 254);

// UI chrome
pub const DIM: Color = Color::DarkGray;
pub const PROMPT_CHAR: &str = "❯";
pub const SEPARATOR_CHAR: &str = "─";

// Message authorship
pub const SENDER_ME: Color = SKY_BLUE;
pub const SENDER_PEER: Color = Color::White;

// Facet styling
pub const FACET_MENTION: Color = SKY_BLUE;
pub const FACET_LINK: Color = Color::Cyan;
pub const FACET_TAG: Color = Color::Magenta;

// Item states
pub const PENDING: Color = Color::DarkGray;
pub const ERROR: Color = Color::Red;

// Pill
pub const PILL_FG: Color = Color::Black;
pub const PILL_BG: Color = SKY_BLUE;

pub const SPINNER_FRAMES: &[char] = &[
    '\u{280B}', '\u{2819}', '\u{2839}', '\u{2838}', '\u{283C}', '\u{2834}', '\u{2826}', '\u{2827}',
    '\u{2807}', '\u{280F}',
];

/// Current spinner glyph for a frame counter.
#[must_use]
pub fn spinner(frame: usize) -> char {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}
