//! Strict-mode validation: detect keys in a source that the record does not have.
//!
//! Uses `serde_ignored` while deserializing the merged table into the record
//! and captures every key the record doesn't consume. Each unknown key is
//! reported with its source and best-effort line number.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClapbindError;
use crate::source::Table;

/// Deserialize `table` into `R`.
///
/// With `strict` set, keys that `R` ignores fail the load with
/// [`ClapbindError::UnknownKeys`]; line numbers are looked up in `text` when the
/// source has one.
pub fn deserialize_table<R: DeserializeOwned>(
    table: Table,
    origin: &str,
    text: Option<&str>,
    strict: bool,
) -> Result<R, ClapbindError> {
    let mut unknown_keys: Vec<String> = Vec::new();

    let value = Value::Object(table);
    let record: R = serde_ignored::deserialize(value, |ignored_path| {
        unknown_keys.push(ignored_path.to_string());
    })
    .map_err(|e| ClapbindError::ParseError {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;

    if !strict || unknown_keys.is_empty() {
        return Ok(record);
    }

    let keys: Vec<ClapbindError> = unknown_keys
        .into_iter()
        .map(|key| {
            let line = text.map_or(0, |text| find_key_line(text, &key));
            ClapbindError::UnknownKey {
                key,
                origin: origin.to_string(),
                line,
            }
        })
        .collect();

    Err(ClapbindError::UnknownKeys {
        origin: origin.to_string(),
        keys,
    })
}

/// Find the 1-indexed line number for a key in TOML content.
///
/// For a dotted key like `"database.typo"`, tracks the current `[section]` header
/// while scanning and only matches the leaf key when inside the correct section.
/// Only bare keys under standard headers are found. YAML and JSON sources mostly
/// report 0, which means "unknown".
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let Some((leaf, expected_section)) = segments.split_last() else {
        return 0;
    };

    let mut current_section: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current_section = header.split('.').map(|s| s.trim().to_string()).collect();
            continue;
        }

        let in_right_section = expected_section.len() == current_section.len()
            && expected_section
                .iter()
                .zip(&current_section)
                .all(|(a, b)| *a == b);

        if in_right_section
            && let Some(after_key) = trimmed.strip_prefix(leaf)
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}
