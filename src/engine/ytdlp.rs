//! yt-dlp subprocess engine
//!
//! Shells out to the `yt-dlp` binary. Metadata comes from a
//! `--dump-json` pass (one JSON object per line); the transfer runs with
//! `--newline` and a structured `--progress-template` so stdout lines
//! map directly onto [`ProgressEvent`]s. Playlist URLs are restricted to
//! their first entry at the engine level.

use crate::core::progress::{EventStatus, ProgressEvent};
use crate::engine::{EngineOptions, Extraction, ExtractionEngine, MediaItem};
use crate::error::YtGrabError;
use crate::utils::to_safe_filename;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Structured progress template; fields line up with [`ProgressEvent`].
const PROGRESS_TEMPLATE: &str =
    "download:%(progress.status)s %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.speed)s";

/// Extraction engine backed by the `yt-dlp` binary.
pub struct YtDlpEngine {
    binary: PathBuf,
}

impl YtDlpEngine {
    /// Locate the binary at well-known install paths, falling back to
    /// `PATH` lookup.
    pub fn new() -> Self {
        let candidates = ["/opt/homebrew/bin/yt-dlp", "/usr/local/bin/yt-dlp"];
        let binary = candidates
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));

        Self { binary }
    }

    /// Use a specific binary path instead of probing.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Metadata pass: one JSON object per stdout line describing the
    /// item the download pass will fetch.
    async fn fetch_metadata(&self, url: &str, options: &EngineOptions) -> crate::Result<Extraction> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-warnings".to_string(),
            "--playlist-items".to_string(),
            "1".to_string(),
            "-f".to_string(),
            options.format_spec.clone(),
        ];
        if let Some(proxy) = &options.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        args.push(url.to_string());

        debug!(engine = %self.binary.display(), "fetching metadata");
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(&self.binary, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(YtGrabError::Engine(extract_error_message(
                &stderr,
                output.status.code(),
            )));
        }

        parse_metadata(&String::from_utf8_lossy(&output.stdout))
    }

    /// Download pass: streams progress lines from stdout into the hook,
    /// collects stderr for error reporting.
    async fn run_download(
        &self,
        url: &str,
        options: &EngineOptions,
        on_progress: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> crate::Result<()> {
        let args = build_download_args(url, options);
        debug!(engine = %self.binary.display(), format = %options.format_spec, "starting transfer");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(&self.binary, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| YtGrabError::Engine("engine stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| YtGrabError::Engine("engine stderr unavailable".to_string()))?;

        // Drain stderr concurrently so a chatty engine cannot block on a
        // full pipe while we read stdout.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let mut reader = BufReader::new(stderr);
            let _ = reader.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(event) = parse_progress_line(&line) {
                on_progress(event);
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if status.success() {
            if !stderr_text.trim().is_empty() {
                warn!("engine stderr: {}", stderr_text.trim());
            }
            Ok(())
        } else {
            Err(YtGrabError::Engine(extract_error_message(
                &stderr_text,
                status.code(),
            )))
        }
    }
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_and_download(
        &self,
        url: &str,
        options: &EngineOptions,
        on_progress: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> crate::Result<Extraction> {
        let extraction = self.fetch_metadata(url, options).await?;
        self.run_download(url, options, on_progress).await?;
        Ok(extraction)
    }

    fn prepare_filename(&self, item: &MediaItem, options: &EngineOptions) -> PathBuf {
        options
            .save_directory
            .join(to_safe_filename(&item.title, &item.ext))
    }
}

/// Arguments for the download pass.
fn build_download_args(url: &str, options: &EngineOptions) -> Vec<String> {
    let mut args = vec![
        "-f".to_string(),
        options.format_spec.clone(),
        "-o".to_string(),
        options.output_template(),
        "--no-warnings".to_string(),
        "--newline".to_string(),
        "--progress-template".to_string(),
        PROGRESS_TEMPLATE.to_string(),
        "--playlist-items".to_string(),
        "1".to_string(),
    ];

    if let Some(proxy) = &options.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    if let Some(pp) = &options.postprocessor {
        args.push("-x".to_string());
        args.push("--audio-format".to_string());
        args.push(pp.codec.clone());
        args.push("--audio-quality".to_string());
        args.push(format!("{}K", pp.quality));
    }

    args.push(url.to_string());
    args
}

fn spawn_error(binary: &std::path::Path, err: std::io::Error) -> YtGrabError {
    if err.kind() == std::io::ErrorKind::NotFound {
        YtGrabError::EngineNotFound(binary.display().to_string())
    } else {
        YtGrabError::Io(err)
    }
}

/// Parse one `--dump-json` stdout block into items. An item that carries
/// playlist markers (or more than one item) means the URL resolved to a
/// collection.
fn parse_metadata(stdout: &str) -> crate::Result<Extraction> {
    let mut items = Vec::new();
    let mut from_playlist = false;

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let json: serde_json::Value = serde_json::from_str(line)?;

        if json
            .get("playlist")
            .map(|v| !v.is_null())
            .unwrap_or(false)
        {
            from_playlist = true;
        }

        items.push(MediaItem {
            id: json
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            title: json
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("video")
                .to_string(),
            ext: json
                .get("ext")
                .and_then(|v| v.as_str())
                .unwrap_or("mp4")
                .to_string(),
        });
    }

    if items.is_empty() {
        return Err(YtGrabError::Engine(
            "no downloadable item in engine output".to_string(),
        ));
    }
    if items.len() == 1 && !from_playlist {
        Ok(Extraction::Single(items.remove(0)))
    } else {
        Ok(Extraction::Playlist(items))
    }
}

/// Parse a `--progress-template` stdout line. Returns `None` for lines
/// that are not progress reports.
fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix("download:")?;
    let mut parts = rest.split_whitespace();

    let status = match parts.next()? {
        "downloading" => EventStatus::Downloading,
        "finished" => EventStatus::Finished,
        _ => EventStatus::Other,
    };

    // Numeric fields arrive as floats or the literal "NA"
    let downloaded_bytes = parts
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .map(|v| v.max(0.0) as u64)
        .unwrap_or(0);
    let total_bytes = parts
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .map(|v| v.max(0.0) as u64)
        .filter(|t| *t > 0);
    let speed = parts
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
        .max(0.0);

    Some(ProgressEvent {
        status,
        downloaded_bytes,
        total_bytes,
        speed,
    })
}

/// Pull the most useful message out of engine stderr: the last `ERROR:`
/// line if present, otherwise the trimmed output, otherwise the exit
/// status.
fn extract_error_message(stderr: &str, exit_code: Option<i32>) -> String {
    let last_error = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:") || l.starts_with("error:"));

    if let Some(line) = last_error {
        return line
            .strip_prefix("ERROR:")
            .or_else(|| line.strip_prefix("error:"))
            .unwrap_or(line)
            .trim()
            .to_string();
    }

    let trimmed = stderr.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    match exit_code {
        Some(code) => format!("engine exited with status {code}"),
        None => "engine terminated by signal".to_string(),
    }
}
