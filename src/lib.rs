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

pub mod api;
pub mod app;
pub mod convo;
pub mod error;
pub mod media;
pub mod ui;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "skymsg", about = "Terminal messenger for the open social web")]
pub struct Cli {
    /// Account identifier (handle or email). Falls back to $SKYMSG_IDENTIFIER.
    #[arg(long, short)]
    pub identifier: Option<String>,

    /// App password. Falls back to $SKYMSG_APP_PASSWORD.
    #[arg(long)]
    pub app_password: Option<String>,

    /// Service base URL.
    #[arg(long, default_value = "https://bsky.social")]
    pub service: String,

    /// Conversation ID to open on startup.
    #[arg(long)]
    pub convo: Option<String>,

    /// Starter pack at:// URI to show on the starter pack tab.
    #[arg(long)]
    pub starter_pack: Option<String>,

    /// Force the compact list profile (smaller history page size).
    #[arg(long)]
    pub compact: bool,

    /// Write diagnostics to this file (tracing is disabled without it).
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,

    /// Tracing filter directives (overrides RUST_LOG).
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Append to the log file instead of truncating it.
    #[arg(long)]
    pub log_append: bool,
}
