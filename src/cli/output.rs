//! Terminal output and progress display

use crate::core::progress::{format_size, format_speed, Phase, ProgressState};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Renders download progress and result messages on the terminal.
///
/// Safe to drive from the downloader's progress observer: the progress
/// bar handle is internally shared and all methods take `&self`.
pub struct OutputFormatter {
    progress_bar: Option<ProgressBar>,
}

impl OutputFormatter {
    pub fn new(show_progress: bool) -> Self {
        let progress_bar = show_progress.then(|| {
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");

            let bar = ProgressBar::new(0);
            bar.set_style(style);
            bar
        });

        Self { progress_bar }
    }

    /// Fold one progress snapshot into the bar.
    pub fn update_progress(&self, state: &ProgressState) {
        let Some(bar) = &self.progress_bar else {
            return;
        };

        match state.phase {
            Phase::Downloading => {
                if state.total_bytes > 0 {
                    bar.set_length(state.total_bytes);
                    bar.set_position(state.downloaded_bytes);
                    bar.set_message(format!(
                        "({}) [{:.1}%]",
                        format_speed(state.speed),
                        state.percent
                    ));
                } else {
                    // Total unknown: no percentage, just a byte counter
                    bar.set_position(state.downloaded_bytes);
                    bar.set_message(format!(
                        "{} ({})",
                        format_size(state.downloaded_bytes),
                        format_speed(state.speed)
                    ));
                }
            }
            // Raw transfer done; conversion may still be running
            Phase::Finished => bar.set_message("processing file..."),
            Phase::Idle => {}
        }
    }

    /// Stop the bar and clear its line so result messages print cleanly.
    pub fn finish_progress(&self) {
        if let Some(bar) = &self.progress_bar {
            bar.finish_and_clear();
        }
    }

    pub fn print_download_start(&self, url: &str, directory: &std::path::Path) {
        println!("Downloading: {}", url.bold());
        println!("Save directory: {}", directory.display());
    }

    pub fn success(&self, message: &str) {
        println!("{}", message.green());
    }

    pub fn note(&self, message: &str) {
        println!("{}", message.yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", message.red());
    }
}
