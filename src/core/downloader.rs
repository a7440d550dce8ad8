//! Download orchestration
//!
//! [`Downloader`] validates the input URL, derives engine options from
//! its resolved settings, invokes the extraction engine, folds progress
//! events into a per-call [`ProgressState`], reduces playlist results to
//! their first entry, derives the final on-disk path, and returns a
//! uniform [`DownloadOutcome`]. Nothing is retried; engine failures are
//! surfaced as values, never as panics or propagated errors.

use crate::config::Settings;
use crate::core::progress::{EventStatus, ProgressEvent, ProgressState};
use crate::engine::{EngineOptions, ExtractionEngine, YtDlpEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

pub(crate) const EMPTY_URL_MESSAGE: &str = "URL cannot be empty";
pub(crate) const INVALID_URL_MESSAGE: &str =
    "Invalid YouTube URL. URL must contain 'youtube.com' or 'youtu.be'";

/// Callback observing progress snapshots during one download call.
pub type ProgressObserver = Arc<dyn Fn(&ProgressState) + Send + Sync>;

/// Terminal result of one `download()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success {
        /// Final path, extension consistent with the requested format
        file_path: PathBuf,
        /// True when the URL resolved to a playlist and only its first
        /// entry was downloaded (informational, not an error)
        playlist_truncated: bool,
    },
    Failure {
        message: String,
    },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    fn failure(message: impl Into<String>) -> Self {
        DownloadOutcome::Failure {
            message: message.into(),
        }
    }
}

/// Syntactic whitelist check only: a scheme separator plus one of the
/// two recognized host markers, anywhere in the string. Deliberately
/// accepts any string containing the markers regardless of position;
/// this is an input filter, not a security boundary.
fn is_youtube_url(url: &str) -> bool {
    url.contains("://") && (url.contains("youtube.com") || url.contains("youtu.be"))
}

/// Orchestrates one download at a time against an extraction engine.
///
/// A single instance is not safe for two overlapping `download()` calls:
/// progress snapshots from concurrent calls would interleave at the
/// observer. Use one instance per in-flight URL.
pub struct Downloader {
    settings: Settings,
    engine: Box<dyn ExtractionEngine>,
    observer: Option<ProgressObserver>,
}

impl Downloader {
    /// Create a downloader backed by the yt-dlp engine.
    pub fn new(settings: Settings) -> Self {
        Self::with_engine(settings, YtDlpEngine::new())
    }

    /// Create a downloader backed by a specific engine.
    pub fn with_engine(settings: Settings, engine: impl ExtractionEngine + 'static) -> Self {
        info!(
            format = %settings.format,
            directory = %settings.save_directory.display(),
            "initialized downloader"
        );
        Self {
            settings,
            engine: Box::new(engine),
            observer: None,
        }
    }

    /// Register a progress observer, called after every engine event.
    pub fn with_progress(
        mut self,
        callback: impl Fn(&ProgressState) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(callback));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Download the media resource at `url` per the resolved settings.
    ///
    /// Never returns an error: every failure mode ends up as a
    /// [`DownloadOutcome::Failure`] with a human-readable message.
    pub async fn download(&self, url: &str) -> DownloadOutcome {
        if url.is_empty() {
            error!("empty URL provided");
            return DownloadOutcome::failure(EMPTY_URL_MESSAGE);
        }
        if !is_youtube_url(url) {
            error!(%url, "invalid URL");
            return DownloadOutcome::failure(INVALID_URL_MESSAGE);
        }

        let options = EngineOptions::from_settings(&self.settings);
        info!(%url, format = %self.settings.format, engine = self.engine.name(), "starting download");

        // Progress state lives on this call's stack; the engine hook is
        // its only writer. Observers get snapshots by reference.
        let mut state = ProgressState::default();
        let observer = self.observer.clone();
        let mut on_progress = move |event: ProgressEvent| {
            state.apply(&event);
            match event.status {
                EventStatus::Downloading => {
                    // Approximately every 10%; the check skips when no
                    // event lands on a round percentage
                    if state.total_bytes > 0 && (state.percent as u64) % 10 == 0 {
                        debug!("download progress: {}%", state.percent as u64);
                    }
                }
                EventStatus::Finished => {
                    // Raw transfer done; for audio the conversion
                    // post-processor still runs after this
                    info!("download finished, processing file...");
                }
                EventStatus::Other => {}
            }
            if let Some(observer) = &observer {
                observer(&state);
            }
        };

        let extraction = match self
            .engine
            .extract_and_download(url, &options, &mut on_progress)
            .await
        {
            Ok(extraction) => extraction,
            Err(e) => {
                let message = format!("Download failed: {e}");
                error!("{message}");
                return DownloadOutcome::failure(message);
            }
        };

        let (item, playlist_truncated) = match extraction.into_target() {
            Some(target) => target,
            None => {
                return DownloadOutcome::failure(
                    "Download failed: playlist contained no entries",
                )
            }
        };
        if playlist_truncated {
            info!("playlist detected, downloading only the first entry");
        }

        let mut file_path = self.engine.prepare_filename(&item, &options);
        // The audio post-processor swaps the container on disk; predict
        // its output name by substituting the extension
        if let Some(ext) = self.settings.format.forced_extension() {
            file_path.set_extension(ext);
        }

        info!("download completed: {}", file_path.display());
        DownloadOutcome::Success {
            file_path,
            playlist_truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigMap, MediaFormat};
    use crate::engine::{Extraction, MediaItem};
    use crate::error::YtGrabError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    const VALID_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    /// Engine double that replays canned events and records invocations.
    struct MockEngine {
        extraction: Result<Extraction, String>,
        events: Vec<ProgressEvent>,
        calls: Arc<AtomicUsize>,
    }

    impl MockEngine {
        fn ok(extraction: Extraction) -> Self {
            Self {
                extraction: Ok(extraction),
                events: Vec::new(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                extraction: Err(message.to_string()),
                events: Vec::new(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_events(mut self, events: Vec<ProgressEvent>) -> Self {
            self.events = events;
            self
        }

        fn call_counter(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl ExtractionEngine for MockEngine {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn extract_and_download(
            &self,
            _url: &str,
            _options: &EngineOptions,
            on_progress: &mut (dyn FnMut(ProgressEvent) + Send),
        ) -> crate::Result<Extraction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for event in &self.events {
                on_progress(event.clone());
            }
            match &self.extraction {
                Ok(extraction) => Ok(extraction.clone()),
                Err(message) => Err(YtGrabError::Engine(message.clone())),
            }
        }

        fn prepare_filename(&self, item: &MediaItem, options: &EngineOptions) -> PathBuf {
            options
                .save_directory
                .join(format!("{}.{}", item.title, item.ext))
        }
    }

    fn item(title: &str, ext: &str) -> MediaItem {
        MediaItem {
            id: None,
            title: title.to_string(),
            ext: ext.to_string(),
        }
    }

    fn downloader(format: MediaFormat, engine: MockEngine) -> (TempDir, Downloader) {
        let dir = tempdir().unwrap();
        let settings =
            Settings::resolve(Some(dir.path().to_path_buf()), Some(format), &ConfigMap::new())
                .unwrap();
        (dir, Downloader::with_engine(settings, engine))
    }

    #[test]
    fn test_url_validation() {
        assert!(is_youtube_url(VALID_URL));
        assert!(is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(!is_youtube_url(""));
        assert!(!is_youtube_url("https://www.example.com"));
        // Missing scheme separator
        assert!(!is_youtube_url("youtube.com"));
        assert!(!is_youtube_url("www.youtube.com/watch?v=dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_empty_url_skips_engine() {
        let engine = MockEngine::ok(Extraction::Single(item("x", "mp4")));
        let calls = engine.call_counter();
        let (_dir, downloader) = downloader(MediaFormat::Video, engine);

        let outcome = downloader.download("").await;
        assert_eq!(
            outcome,
            DownloadOutcome::Failure {
                message: EMPTY_URL_MESSAGE.to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_skips_engine() {
        let engine = MockEngine::ok(Extraction::Single(item("x", "mp4")));
        let calls = engine.call_counter();
        let (_dir, downloader) = downloader(MediaFormat::Video, engine);

        for url in ["https://www.example.com", "youtube.com", "not a url"] {
            let outcome = downloader.download(url).await;
            assert_eq!(
                outcome,
                DownloadOutcome::Failure {
                    message: INVALID_URL_MESSAGE.to_string()
                }
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_video_success_returns_engine_filename() {
        let engine = MockEngine::ok(Extraction::Single(item("Test Video", "mp4")));
        let (dir, downloader) = downloader(MediaFormat::Video, engine);

        let outcome = downloader.download(VALID_URL).await;
        assert_eq!(
            outcome,
            DownloadOutcome::Success {
                file_path: dir.path().join("Test Video.mp4"),
                playlist_truncated: false,
            }
        );
    }

    #[tokio::test]
    async fn test_audio_success_substitutes_extension() {
        let engine = MockEngine::ok(Extraction::Single(item("Test Audio", "webm")));
        let (dir, downloader) = downloader(MediaFormat::Audio, engine);

        let outcome = downloader.download(VALID_URL).await;
        // Base name preserved, extension replaced by the predicted
        // post-processor output
        assert_eq!(
            outcome,
            DownloadOutcome::Success {
                file_path: dir.path().join("Test Audio.mp3"),
                playlist_truncated: false,
            }
        );
    }

    #[tokio::test]
    async fn test_engine_error_becomes_failure() {
        let engine = MockEngine::failing("Video unavailable");
        let (_dir, downloader) = downloader(MediaFormat::Video, engine);

        let outcome = downloader.download(VALID_URL).await;
        assert_eq!(
            outcome,
            DownloadOutcome::Failure {
                message: "Download failed: Video unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_playlist_reduced_to_first_entry() {
        let engine = MockEngine::ok(Extraction::Playlist(vec![
            item("First Video", "mp4"),
            item("Second Video", "mp4"),
            item("Third Video", "mp4"),
        ]));
        let (dir, downloader) = downloader(MediaFormat::Video, engine);

        let outcome = downloader.download(VALID_URL).await;
        assert_eq!(
            outcome,
            DownloadOutcome::Success {
                file_path: dir.path().join("First Video.mp4"),
                playlist_truncated: true,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_playlist_is_failure() {
        let engine = MockEngine::ok(Extraction::Playlist(Vec::new()));
        let (_dir, downloader) = downloader(MediaFormat::Video, engine);

        let outcome = downloader.download(VALID_URL).await;
        assert_eq!(
            outcome,
            DownloadOutcome::Failure {
                message: "Download failed: playlist contained no entries".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_progress_observer_sees_snapshots() {
        let events = vec![
            ProgressEvent {
                status: EventStatus::Downloading,
                downloaded_bytes: 5 * 1024 * 1024,
                total_bytes: Some(10 * 1024 * 1024),
                speed: 1024.0 * 1024.0,
            },
            ProgressEvent::finished(),
        ];
        let engine =
            MockEngine::ok(Extraction::Single(item("Test Video", "mp4"))).with_events(events);
        let (_dir, downloader) = downloader(MediaFormat::Video, engine);

        let snapshots: Arc<Mutex<Vec<ProgressState>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = snapshots.clone();
        let downloader =
            downloader.with_progress(move |state| sink.lock().unwrap().push(state.clone()));

        let outcome = downloader.download(VALID_URL).await;
        assert!(outcome.is_success());

        let snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].percent, 50.0);
        assert_eq!(snapshots[0].downloaded_bytes, 5 * 1024 * 1024);
        assert_eq!(snapshots[0].total_bytes, 10 * 1024 * 1024);
        assert_eq!(snapshots[0].speed, 1024.0 * 1024.0);
        // `finished` fires before post-processing; phase flips, numbers stay
        assert_eq!(snapshots[1].phase, crate::core::progress::Phase::Finished);
        assert_eq!(snapshots[1].percent, 50.0);
    }

    #[tokio::test]
    async fn test_outcome_is_authoritative_without_observer() {
        let events = vec![ProgressEvent::finished()];
        let engine =
            MockEngine::ok(Extraction::Single(item("Test Video", "mp4"))).with_events(events);
        let (_dir, downloader) = downloader(MediaFormat::Video, engine);

        // No observer registered; events are folded and dropped
        let outcome = downloader.download(VALID_URL).await;
        assert!(outcome.is_success());
    }
}
