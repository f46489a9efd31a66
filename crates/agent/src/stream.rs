//! Best-effort progressive preview of a streaming generator reply.
//!
//! While a structured `{"message": ..., "fileChanges": ...}` payload is still
//! arriving, the only field worth showing is the leading `message` string.
//! A single permissive regex pass over the cumulative buffer is enough for
//! low-latency feedback; this is a UX layer, not a parser — the authoritative
//! parse in [`crate::parse`] runs once on the complete text. Known failure
//! mode: a JSON-looking prefix without a visible message shows the
//! placeholder.

use once_cell::sync::Lazy;
use regex::Regex;

/// Shown while the buffer looks structured but the message field has not
/// appeared yet.
pub const THINKING_PLACEHOLDER: &str = "Thinking...";

// The closing quote may be absent: input is incomplete by definition.
static MESSAGE_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)"message"\s*:\s*"((?:[^"\\]|\\.)*)"?"#).expect("message field regex")
});

/// Returns the best displayable text for the buffer accumulated so far.
///
/// Total and allocation-bounded: one regex pass plus one unescape pass.
/// Monotonically non-regressive under well-formed eventual input.
///
/// The field probe deliberately runs before the leading-brace check, so
/// prose that quotes a `"message": "..."` literal previews as the quoted
/// value rather than verbatim. Acceptable for a preview layer; the
/// authoritative parse sees the full text either way.
pub fn live_preview(buffer: &str) -> String {
    let trimmed = buffer.trim();

    if let Some(caps) = MESSAGE_FIELD.captures(trimmed) {
        return unescape_json_fragment(&caps[1]);
    }

    // Not attempting structured output (or not started): show as-is.
    if !trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    THINKING_PLACEHOLDER.to_string()
}

/// Unescapes the standard JSON string escapes worth displaying mid-stream.
/// Unknown escapes and a trailing lone backslash pass through untouched.
fn unescape_json_fragment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prose_passes_through() {
        assert_eq!(live_preview("  Hello! How can I help?  "), "Hello! How can I help?");
    }

    #[test]
    fn empty_buffer_shows_nothing() {
        assert_eq!(live_preview(""), "");
    }

    #[test]
    fn prose_quoting_a_message_field_previews_the_quoted_value() {
        // Probe order: the field match wins even without a leading brace.
        let buf = r#"Reply with "message": "like this" please"#;
        assert_eq!(live_preview(buf), "like this");
    }

    #[test]
    fn json_prefix_without_message_shows_placeholder() {
        assert_eq!(live_preview("{\"fileCh"), THINKING_PLACEHOLDER);
        assert_eq!(live_preview("{"), THINKING_PLACEHOLDER);
    }

    #[test]
    fn partial_message_is_extracted() {
        assert_eq!(live_preview(r#"{"message": "Hello wo"#), "Hello wo");
    }

    #[test]
    fn complete_message_is_extracted_and_unescaped() {
        let buf = r#"{"message": "Line one\nLine \"two\"", "fileChanges": []}"#;
        assert_eq!(live_preview(buf), "Line one\nLine \"two\"");
    }

    #[test]
    fn char_by_char_prefixes_never_regress_to_garbage() {
        let payload = r#"{"message": "Hello world", "fileChanges": []}"#;
        let full = "Hello world";
        for end in payload.char_indices().map(|(i, _)| i).chain([payload.len()]) {
            let shown = live_preview(&payload[..end]);
            // Every output is the placeholder or a prefix of the final text.
            assert!(
                shown == THINKING_PLACEHOLDER || full.starts_with(&shown),
                "unexpected preview {shown:?} at offset {end}"
            );
        }
    }

    #[test]
    fn trailing_backslash_mid_escape_is_withheld() {
        // The half-finished escape stays out of the preview until its second
        // character arrives.
        assert_eq!(live_preview(r#"{"message": "wip\"#), "wip");
        assert_eq!(live_preview(r#"{"message": "wip\n"#), "wip\n");
    }
}
