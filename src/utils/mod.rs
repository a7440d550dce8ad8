//! Utility functions for ytgrab

pub mod filename;

pub use filename::*;
