//! Configuration resolution for the downloader.
//!
//! Merges explicit arguments, a flat key-value configuration map, and
//! built-in fallbacks into an immutable [`Settings`] value. No ambient
//! or global lookup happens past this point; the resolved settings are
//! handed to the downloader at construction.

use crate::error::YtGrabError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Recognized configuration keys.
pub const KEY_DOWNLOAD_DIRECTORY: &str = "DEFAULT_DOWNLOAD_DIRECTORY";
pub const KEY_DEFAULT_FORMAT: &str = "DEFAULT_FORMAT";
pub const KEY_VIDEO_QUALITY: &str = "VIDEO_QUALITY";
pub const KEY_AUDIO_QUALITY: &str = "AUDIO_QUALITY";
pub const KEY_HTTP_PROXY: &str = "HTTP_PROXY";
pub const KEY_HTTPS_PROXY: &str = "HTTPS_PROXY";

const RECOGNIZED_KEYS: &[&str] = &[
    KEY_DOWNLOAD_DIRECTORY,
    KEY_DEFAULT_FORMAT,
    KEY_VIDEO_QUALITY,
    KEY_AUDIO_QUALITY,
    KEY_HTTP_PROXY,
    KEY_HTTPS_PROXY,
];

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFormat {
    /// Container video, extension chosen by the engine (typically mp4)
    #[default]
    Video,
    /// Audio extracted and converted to mp3 by the engine's post-processor
    Audio,
}

impl MediaFormat {
    /// Fixed extension of the final file for this format, if any.
    /// Video keeps whatever container the engine chose.
    pub fn forced_extension(&self) -> Option<&'static str> {
        match self {
            MediaFormat::Video => None,
            MediaFormat::Audio => Some("mp3"),
        }
    }
}

impl FromStr for MediaFormat {
    type Err = YtGrabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MP4" | "VIDEO" => Ok(MediaFormat::Video),
            "MP3" | "AUDIO" => Ok(MediaFormat::Audio),
            _ => Err(YtGrabError::InvalidConfig {
                key: KEY_DEFAULT_FORMAT.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaFormat::Video => write!(f, "MP4"),
            MediaFormat::Audio => write!(f, "MP3"),
        }
    }
}

/// Flat string-keyed configuration map supplied by the caller.
///
/// The resolver only looks at the recognized keys; anything else is
/// carried but ignored.
#[derive(Debug, Clone, Default)]
pub struct ConfigMap {
    values: HashMap<String, String>,
}

impl ConfigMap {
    /// Create an empty map (all settings fall back to defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the map from process environment variables, reading only
    /// the recognized keys. Empty values are treated as unset, matching
    /// the original environment loader.
    pub fn from_env() -> Self {
        let mut map = Self::new();
        for key in RECOGNIZED_KEYS {
            if let Ok(value) = std::env::var(key) {
                if !value.is_empty() {
                    map.insert(key, value);
                }
            }
        }
        map
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Resolved downloader settings, immutable for the lifetime of a
/// [`Downloader`](crate::Downloader) instance.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory downloads are written to (created at resolution time)
    pub save_directory: PathBuf,
    /// Requested output format
    pub format: MediaFormat,
    /// `"highest"`, `"lowest"`, or a height like `"720p"`
    pub video_quality: String,
    /// Target audio bitrate in kbps, as a string (e.g. `"192"`)
    pub audio_quality: String,
    /// Proxy URL forwarded to the engine, if any
    pub proxy: Option<String>,
}

impl Settings {
    /// Resolve settings from explicit arguments, a configuration map, and
    /// built-in defaults, in that precedence order per field.
    ///
    /// Side effect: creates the save directory (and any missing parents)
    /// on disk. An existing directory is not an error; failure to create
    /// it is, and is propagated as a construction error.
    pub fn resolve(
        save_directory: Option<PathBuf>,
        format: Option<MediaFormat>,
        config: &ConfigMap,
    ) -> crate::Result<Self> {
        let save_directory = save_directory
            .or_else(|| config.get(KEY_DOWNLOAD_DIRECTORY).map(PathBuf::from))
            .unwrap_or_else(default_download_directory);

        let format = match format {
            Some(format) => format,
            None => config
                .get(KEY_DEFAULT_FORMAT)
                .map(MediaFormat::from_str)
                .transpose()?
                .unwrap_or_default(),
        };

        let video_quality = config
            .get(KEY_VIDEO_QUALITY)
            .unwrap_or("highest")
            .to_string();
        let audio_quality = config.get(KEY_AUDIO_QUALITY).unwrap_or("192").to_string();

        // HTTP proxy wins over HTTPS when both are configured
        let proxy = config
            .get(KEY_HTTP_PROXY)
            .or_else(|| config.get(KEY_HTTPS_PROXY))
            .map(str::to_string);

        std::fs::create_dir_all(&save_directory)?;
        debug!(directory = %save_directory.display(), %format, "resolved settings");

        Ok(Self {
            save_directory,
            format,
            video_quality,
            audio_quality,
            proxy,
        })
    }
}

/// `~/Downloads`-equivalent fallback when neither an explicit directory
/// nor a configured one is given.
fn default_download_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}
