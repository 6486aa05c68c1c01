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

//! Video compression for message attachments, via the system `ffmpeg`.
//!
//! The original file is deleted once compression succeeds; a failed deletion
//! is logged and the result still returned.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// Target video bitrate, 3 Mbps.
const TARGET_BITRATE: u32 = 3_000_000;
/// Longest output edge.
const MAX_DIMENSION: u32 = 1920;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedVideo {
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Default)]
pub struct CompressOptions {
    /// Called with completion in `0.0..=1.0` as the encoder reports progress.
    pub on_progress: Option<Box<dyn Fn(f64)>>,
    pub cancel: Option<CancellationToken>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("failed to run encoder: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("encoder exited with {status}")]
    Encoder { status: std::process::ExitStatus },
    #[error("compression cancelled")]
    Cancelled,
}

/// Compress `file` next to itself and return the new path and byte size.
pub async fn compress_video(
    file: &Path,
    opts: CompressOptions,
) -> Result<CompressedVideo, CompressError> {
    let output = output_path(file);
    let duration_us = probe_duration_us(file).await;

    let mut child = tokio::process::Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(file)
        .args(["-b:v", &TARGET_BITRATE.to_string()])
        .args(["-vf", &scale_filter(MAX_DIMENSION)])
        .args(["-progress", "pipe:1", "-nostats", "-loglevel", "error"])
        .arg(&output)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take();
    let progress = async {
        let Some(stdout) = stdout else {
            return;
        };
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let (Some(cb), Some(total)) = (opts.on_progress.as_ref(), duration_us)
                && let Some(fraction) = parse_progress_line(&line, total)
            {
                cb(fraction);
            }
        }
    };

    let cancelled = async {
        match opts.cancel.as_ref() {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    };

    let status = tokio::select! {
        () = cancelled => {
            let _ = child.kill().await;
            let _ = tokio::fs::remove_file(&output).await;
            return Err(CompressError::Cancelled);
        }
        (status, ()) = async { tokio::join!(child.wait(), progress) } => status?,
    };
    if !status.success() {
        let _ = tokio::fs::remove_file(&output).await;
        return Err(CompressError::Encoder { status });
    }

    remove_original(file).await;

    // Read the metadata back so the reported size is the real on-disk size.
    let size = tokio::fs::metadata(&output).await.map(|m| m.len())?;
    Ok(CompressedVideo { path: output, size })
}

/// Delete the pre-compression file. Failure is logged, never raised.
async fn remove_original(file: &Path) {
    if let Err(e) = tokio::fs::remove_file(file).await {
        tracing::warn!(path = %file.display(), error = %e, "failed to delete original video");
    }
}

fn output_path(file: &Path) -> PathBuf {
    let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("video");
    file.with_file_name(format!("{stem}.compressed.mp4"))
}

fn scale_filter(max: u32) -> String {
    format!("scale=w='min({max},iw)':h='min({max},ih)':force_original_aspect_ratio=decrease")
}

/// Total duration in microseconds, via ffprobe. `None` disables progress.
async fn probe_duration_us(file: &Path) -> Option<u64> {
    let output = tokio::process::Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0"])
        .arg(file)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let seconds: f64 = String::from_utf8(output.stdout).ok()?.trim().parse().ok()?;
    if seconds <= 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some((seconds * 1_000_000.0) as u64)
}

/// Parse one `-progress` line into a completion fraction.
fn parse_progress_line(line: &str, duration_us: u64) -> Option<f64> {
    let value = line.strip_prefix("out_time_us=")?.trim().parse::<u64>().ok()?;
    #[allow(clippy::cast_precision_loss)]
    Some((value as f64 / duration_us as f64).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn output_lands_next_to_input() {
        let out = output_path(Path::new("/tmp/clips/holiday.mov"));
        assert_eq!(out, PathBuf::from("/tmp/clips/holiday.compressed.mp4"));
    }

    #[test]
    fn scale_filter_caps_both_edges() {
        let filter = scale_filter(1920);
        assert!(filter.contains("min(1920,iw)"));
        assert!(filter.contains("min(1920,ih)"));
        assert!(filter.contains("force_original_aspect_ratio=decrease"));
    }

    #[test]
    fn progress_line_parses_fraction() {
        assert_eq!(parse_progress_line("out_time_us=500000", 1_000_000), Some(0.5));
        assert_eq!(parse_progress_line("fps=30", 1_000_000), None);
        // Encoder overshoot clamps.
        assert_eq!(parse_progress_line("out_time_us=2000000", 1_000_000), Some(1.0));
    }

    #[tokio::test]
    async fn remove_original_tolerates_missing_file() {
        // Must not panic or error the pipeline.
        remove_original(Path::new("/nonexistent/video.mov")).await;
    }

    #[tokio::test]
    async fn remove_original_deletes_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("original.mov");
        tokio::fs::write(&path, b"fake").await.expect("write");
        remove_original(&path).await;
        assert!(!path.exists());
    }
}
