//! Authoritative parse of a completed generator reply into a [`ChangeSet`].
//!
//! The generator is instructed, not constrained: replies may arrive fenced,
//! as plain prose, or as a bare document. Every input maps to some valid
//! change-set; nothing here returns an error.

use atelier_common::{ChangeSet, FileAction, FileOperation};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// A single outer ``` / ```json fence wrapping the whole payload.
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").expect("fenced block regex")
});

/// Message used when the generator ignored the structured-output instruction
/// and replied with a raw document.
const DOCUMENT_FALLBACK_MESSAGE: &str = "I've updated your code.";

/// Parses the full reply text. Called exactly once per completed turn.
pub fn parse_change_set(raw: &str, entry_point: &str) -> ChangeSet {
    let trimmed = raw.trim();

    let json_str = match FENCED_BLOCK.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    };

    if let Ok(value) = serde_json::from_str::<Value>(&json_str) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            let operations = collect_operations(&value);
            tracing::debug!(ops = operations.len(), "parsed structured change-set");
            return ChangeSet {
                message: message.to_string(),
                operations,
            };
        }
    }

    // Raw-document safety net: stage it against the conventional entry point.
    if trimmed.contains("<!DOCTYPE html>") || trimmed.contains("<html") {
        return ChangeSet {
            message: DOCUMENT_FALLBACK_MESSAGE.to_string(),
            operations: vec![FileOperation {
                path: entry_point.to_string(),
                action: FileAction::Modify,
                content: Some(trimmed.to_string()),
            }],
        };
    }

    ChangeSet::conversational(trimmed)
}

/// Keeps only `fileChanges` entries with a usable path and action; the rest
/// are dropped so one malformed entry cannot sink a multi-file proposal.
fn collect_operations(value: &Value) -> Vec<FileOperation> {
    let Some(entries) = value.get("fileChanges").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut operations = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.get("path").and_then(Value::as_str).unwrap_or("");
        let action = entry
            .get("action")
            .and_then(Value::as_str)
            .and_then(FileAction::from_label);
        match (path.is_empty(), action) {
            (false, Some(action)) => operations.push(FileOperation {
                path: path.to_string(),
                action,
                content: entry
                    .get("content")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => tracing::debug!(%entry, "dropping malformed file change entry"),
        }
    }
    operations
}
