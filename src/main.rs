//! Main entry point for the ytgrab CLI

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ytgrab::cli::{Args, OutputFormatter};
use ytgrab::{ConfigMap, DownloadOutcome, Downloader, Settings};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    // Environment-sourced configuration with flag overrides on top
    let mut config = ConfigMap::from_env();
    args.apply_overrides(&mut config);

    let formatter = Arc::new(OutputFormatter::new(!args.no_progress));

    let settings = match Settings::resolve(args.directory.clone(), args.format.map(Into::into), &config)
    {
        Ok(settings) => settings,
        Err(e) => {
            formatter.error(&format!("Configuration error: {e}"));
            std::process::exit(1);
        }
    };

    formatter.print_download_start(&args.url, &settings.save_directory);
    info!(url = %args.url, "starting");

    let progress_sink = formatter.clone();
    let downloader = Downloader::new(settings)
        .with_progress(move |state| progress_sink.update_progress(state));

    match downloader.download(&args.url).await {
        DownloadOutcome::Success {
            file_path,
            playlist_truncated,
        } => {
            formatter.finish_progress();
            if playlist_truncated {
                formatter.note("Note: downloading only the first video from the playlist.");
            }
            let name = file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_path.display().to_string());
            formatter.success(&format!("Download completed: {name}"));
            formatter.success(&format!("Saved to: {}", file_path.display()));
        }
        DownloadOutcome::Failure { message } => {
            formatter.finish_progress();
            formatter.error(&message);
            std::process::exit(1);
        }
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins when set; the
/// verbose flag bumps the default level to debug.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}
