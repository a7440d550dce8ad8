//! Core download orchestration

pub mod downloader;
pub mod progress;

pub use downloader::*;
pub use progress::*;
