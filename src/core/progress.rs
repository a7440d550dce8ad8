//! Progress tracking for downloads
//!
//! The engine reports raw events through its hook; [`ProgressState`]
//! folds them into a small record that presentation layers can render.

use serde::{Deserialize, Serialize};

/// Engine event status. The engine may emit statuses beyond these two;
/// they are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Downloading,
    /// Raw transfer finished. For audio downloads this fires *before*
    /// the conversion post-processor runs, so the file is not final yet.
    Finished,
    Other,
}

/// Narrow internal shape of one engine progress event. The raw engine
/// payload is translated into this immediately at the boundary and not
/// passed any further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: EventStatus,
    pub downloaded_bytes: u64,
    /// `None` when the engine does not know the total size
    pub total_bytes: Option<u64>,
    pub speed: f64,
}

impl ProgressEvent {
    pub fn finished() -> Self {
        Self {
            status: EventStatus::Finished,
            downloaded_bytes: 0,
            total_bytes: None,
            speed: 0.0,
        }
    }
}

/// Phase of the transfer within one `download()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Downloading,
    Finished,
}

/// Progress record for one in-flight download call.
///
/// Owned by the call itself and mutated only from the engine hook, so a
/// single instance never has two writers. Overlapping calls on one
/// downloader would interleave observer snapshots; use one downloader
/// per in-flight URL instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressState {
    pub phase: Phase,
    pub downloaded_bytes: u64,
    /// 0 = unknown
    pub total_bytes: u64,
    pub speed: f64,
    /// In [0, 100]; stays at its previous value while the total is unknown
    pub percent: f64,
}

impl ProgressState {
    /// Fold one engine event into the state.
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event.status {
            EventStatus::Downloading => {
                self.phase = Phase::Downloading;
                self.downloaded_bytes = event.downloaded_bytes;
                self.speed = event.speed;
                if let Some(total) = event.total_bytes.filter(|t| *t > 0) {
                    self.total_bytes = total;
                    self.percent = (event.downloaded_bytes as f64 / total as f64) * 100.0;
                }
            }
            EventStatus::Finished => {
                self.phase = Phase::Finished;
            }
            EventStatus::Other => {}
        }
    }
}

/// Convert bytes to a human-readable size string, e.g. `"10.50 MB"`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.2} TB")
}

/// Human-readable transfer speed, e.g. `"1.00 MB/s"`.
pub fn format_speed(bytes_per_second: f64) -> String {
    format!("{}/s", format_size(bytes_per_second as u64))
}
