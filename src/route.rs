// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Path helpers shared by the recorder, the fixture store and the test assembler.
//!
//! All functions here are pure. Segments "parsable as an integer" follow the
//! signed 64-bit integer grammar, so `+7` and `-7` count while `1.5` does not.

fn is_numeric_segment(segment: &str) -> bool {
    segment.parse::<i64>().is_ok()
}

/// Significant segments are the ones longer than three characters.
fn is_significant(segment: &str) -> bool {
    segment.chars().count() > 3
}

/// Compute the route grouping key for a request path.
///
/// Empty segments and integer segments are dropped, so `/users/123` and
/// `/users/456/` both group under `/users`. The result always starts with `/`.
pub fn normalize(path: &str) -> String {
    let kept: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && !is_numeric_segment(s))
        .collect();
    format!("/{}", kept.join("/"))
}

/// Replace integer segments with positional placeholders.
///
/// The first integer segment becomes `:id`, the next `:id1`, then `:id2` and
/// so on, counted left to right. Non-numeric segments are kept verbatim.
pub fn display_path(path: &str) -> String {
    let mut seen = 0usize;
    path.split('/')
        .map(|segment| {
            if segment.is_empty() || !is_numeric_segment(segment) {
                return segment.to_string();
            }
            let placeholder = if seen == 0 {
                ":id".to_string()
            } else {
                format!(":id{}", seen)
            };
            seen += 1;
            placeholder
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive the filename-safe part of a fixture name from a route key.
///
/// Joins every segment longer than three characters with `_`. When none
/// qualifies the last segment is used, and `noname` when that is empty too.
pub fn clean_filename_segment(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .map(|s| s.split('?').next().unwrap_or_default())
        .collect();
    let mut chunks: Vec<&str> = segments
        .iter()
        .copied()
        .filter(|s| is_significant(s))
        .collect();
    if chunks.is_empty() {
        if let Some(last) = segments.last() {
            chunks.push(last);
        }
    }
    let cleaned = chunks.join("_");
    if cleaned.is_empty() {
        "noname".to_string()
    } else {
        cleaned
    }
}

/// Derive a test function name from a route key.
///
/// Concatenates the segments longer than three characters with their hyphens
/// removed; `NoName` when none qualifies.
pub fn test_name(path: &str) -> String {
    let name: String = path
        .split('/')
        .filter(|s| is_significant(s))
        .map(|s| s.replace('-', ""))
        .collect();
    if name.is_empty() {
        "NoName".to_string()
    } else {
        name
    }
}
