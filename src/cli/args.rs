//! Command line argument parsing

use crate::config::{ConfigMap, MediaFormat, KEY_AUDIO_QUALITY, KEY_HTTP_PROXY, KEY_VIDEO_QUALITY};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// YouTube downloader - fetch a video or its audio track via yt-dlp
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// YouTube video URL to download
    pub url: String,

    /// Directory to save the downloaded file
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Download format
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Video quality (highest, 1080p, 720p, 480p, lowest) or audio
    /// bitrate in kbps (320, 192, 128, 64), depending on the format
    #[arg(short, long, value_name = "QUALITY")]
    pub quality: Option<String>,

    /// Proxy URL forwarded to the extraction engine
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Requested output format
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FormatArg {
    /// Container video
    Mp4,
    /// Audio extracted to mp3
    Mp3,
}

impl From<FormatArg> for MediaFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Mp4 => MediaFormat::Video,
            FormatArg::Mp3 => MediaFormat::Audio,
        }
    }
}

impl Args {
    /// Fold flag overrides into the configuration map before settings
    /// resolution. A quality flag applies to the video or audio setting
    /// depending on the requested format.
    pub fn apply_overrides(&self, config: &mut ConfigMap) {
        if let Some(quality) = &self.quality {
            match self.format {
                Some(FormatArg::Mp3) => config.insert(KEY_AUDIO_QUALITY, quality.clone()),
                _ => config.insert(KEY_VIDEO_QUALITY, quality.clone()),
            }
        }
        if let Some(proxy) = &self.proxy {
            config.insert(KEY_HTTP_PROXY, proxy.clone());
        }
    }
}
