//! Safe filename generation
//!
//! Mirrors the sanitization the extraction engine applies to its
//! `%(title)s` substitution so that predicted output paths line up with
//! what lands on disk.

use regex::Regex;

/// Convert a title to a safe filename with the given extension.
pub fn to_safe_filename(title: &str, extension: &str) -> String {
    // Characters invalid on at least one mainstream filesystem
    let invalid_chars = Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap();
    let mut safe_title = invalid_chars.replace_all(title, "_").to_string();

    safe_title = safe_title
        .trim_matches(|c: char| c == '.' || c == ' ')
        .to_string();

    // Windows caps paths at 255 chars; stay well under it
    if safe_title.len() > 200 {
        safe_title.truncate(200);
        safe_title = safe_title.trim_end().to_string();
    }

    if safe_title.is_empty() {
        safe_title = "video".to_string();
    }

    if extension.is_empty() {
        safe_title
    } else {
        format!("{}.{}", safe_title, extension.trim_start_matches('.'))
    }
}
