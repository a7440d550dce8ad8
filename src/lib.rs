//! # ytgrab - YouTube download orchestrator
//!
//! Fetches a single video or audio track from YouTube by delegating the
//! actual extraction and transfer to an external engine (yt-dlp) and
//! normalizing its progress events and results into a small, uniform
//! contract.
//!
//! ## Features
//!
//! - Video (MP4) and extracted-audio (MP3) downloads
//! - Quality selection (`highest`, `lowest`, `<N>p`, audio kbps)
//! - Live progress reporting through a callback
//! - Playlist URLs reduced to their first entry
//! - Proxy passthrough to the engine
//!
//! ## Example
//!
//! ```rust,no_run
//! use ytgrab::{ConfigMap, DownloadOutcome, Downloader, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::resolve(None, None, &ConfigMap::new())?;
//!     let downloader = Downloader::new(settings);
//!
//!     match downloader.download("VIDEO_URL").await {
//!         DownloadOutcome::Success { file_path, .. } => {
//!             println!("Saved to: {}", file_path.display());
//!         }
//!         DownloadOutcome::Failure { message } => eprintln!("{message}"),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod utils;

// Re-export main types
pub use config::{ConfigMap, MediaFormat, Settings};
pub use core::{DownloadOutcome, Downloader, Phase, ProgressState};
pub use engine::{EngineOptions, Extraction, ExtractionEngine, MediaItem, ProgressEvent};
pub use error::YtGrabError;

/// Result type alias for ytgrab operations
pub type Result<T> = std::result::Result<T, YtGrabError>;
