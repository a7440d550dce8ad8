//! Extraction engine boundary
//!
//! The engine is the external collaborator that resolves a URL into
//! media streams, performs the transfer, and (for audio) runs the
//! conversion post-processor. The downloader only derives options,
//! consumes progress events, and interprets the result.

pub mod ytdlp;

use crate::config::{MediaFormat, Settings};
pub use crate::core::progress::{EventStatus, ProgressEvent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
pub use ytdlp::YtDlpEngine;

/// Output template filename part; the engine substitutes its own
/// sanitized title and the chosen container extension.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Audio-conversion instruction handed to the engine's post-processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postprocessor {
    /// Target codec, e.g. `"mp3"`
    pub codec: String,
    /// Preferred bitrate in kbps, as a string
    pub quality: String,
}

/// Option set the engine is constructed from for one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Stream-selection spec, e.g. `"best"` or
    /// `"bestvideo[height<=720]+bestaudio/best"`
    pub format_spec: String,
    /// Directory part of the output template
    pub save_directory: PathBuf,
    /// Single proxy URL passed through to the engine
    pub proxy: Option<String>,
    /// Present only for audio downloads
    pub postprocessor: Option<Postprocessor>,
}

impl EngineOptions {
    /// Derive engine options from resolved settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let (format_spec, postprocessor) = match settings.format {
            MediaFormat::Video => (video_format_spec(&settings.video_quality), None),
            MediaFormat::Audio => (
                "bestaudio/best".to_string(),
                Some(Postprocessor {
                    codec: "mp3".to_string(),
                    quality: settings.audio_quality.clone(),
                }),
            ),
        };

        Self {
            format_spec,
            save_directory: settings.save_directory.clone(),
            proxy: settings.proxy.clone(),
            postprocessor,
        }
    }

    /// Full output template, `<save_directory>/%(title)s.%(ext)s`.
    pub fn output_template(&self) -> String {
        self.save_directory.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned()
    }
}

/// Stream-selection spec for a video download at the given quality.
fn video_format_spec(quality: &str) -> String {
    match quality {
        "highest" => "best".to_string(),
        "lowest" => "worst".to_string(),
        // Height-capped combined video+audio, e.g. "720p" -> 720
        other => format!(
            "bestvideo[height<={}]+bestaudio/best",
            other.trim_end_matches('p')
        ),
    }
}

/// One downloadable item as described by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Option<String>,
    pub title: String,
    /// Container extension of the stream the engine selected
    pub ext: String,
}

/// Result of one engine invocation: a single item, or a playlist.
#[derive(Debug, Clone)]
pub enum Extraction {
    Single(MediaItem),
    Playlist(Vec<MediaItem>),
}

impl Extraction {
    /// Reduce to the single target item. For a playlist only the first
    /// entry counts; the flag reports that a reduction happened. `None`
    /// for an empty playlist.
    pub fn into_target(self) -> Option<(MediaItem, bool)> {
        match self {
            Extraction::Single(item) => Some((item, false)),
            Extraction::Playlist(items) => {
                items.into_iter().next().map(|item| (item, true))
            }
        }
    }
}

/// External extraction-and-download engine.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Discover streams for `url`, download per `options`, and report
    /// progress through `on_progress`. Blocks (logically) until the
    /// transfer and any post-processing complete or fail.
    async fn extract_and_download(
        &self,
        url: &str,
        options: &EngineOptions,
        on_progress: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> crate::Result<Extraction>;

    /// Predict the on-disk path the engine writes `item` to, given the
    /// same options. Pure and deterministic; for audio this is the
    /// pre-conversion path, the caller accounts for the rename.
    fn prepare_filename(&self, item: &MediaItem, options: &EngineOptions) -> PathBuf;
}
