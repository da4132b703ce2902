//! Response shaping: per-record field projection and size bounding.
//!
//! Tool callers consume results inside a limited context window, so raw
//! backend records are projected down to the fields each tool actually
//! answers questions with, and free-text fields are capped at a
//! configured character ceiling. Identifiers and timestamps always pass
//! through untouched. Shaping is per-record: no merging, no dedup.

use crate::types::{Book, Document, Highlight};
use serde_json::{json, Map, Value};

/// Suffix appended to a field cut at the ceiling.
pub const TRUNCATION_MARKER: &str = "...";

/// Limits applied when shaping backend records.
#[derive(Debug, Clone)]
pub struct ShapeConfig {
    /// Character ceiling for free-text fields (highlight text, note, summary).
    pub max_field_chars: usize,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            max_field_chars: 2000,
        }
    }
}

/// How document content is included in shaped output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    /// Strip the content field entirely.
    Omit,
    /// Pass content through at full length.
    Full,
    /// Cap content at the given number of characters.
    Clipped(usize),
}

/// Bound `text` to `max_chars`, marker included.
///
/// Counts characters, not bytes, so multibyte text is never split
/// mid-codepoint. Output never exceeds `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

fn bounded(text: &str, config: &ShapeConfig) -> Value {
    Value::String(truncate_chars(text, config.max_field_chars))
}

fn bounded_opt(text: &Option<String>, config: &ShapeConfig) -> Value {
    match text {
        Some(t) => bounded(t, config),
        None => Value::Null,
    }
}

/// Highlight row for list output.
pub fn highlight_summary(highlight: &Highlight, config: &ShapeConfig) -> Value {
    json!({
        "id": highlight.id,
        "text": bounded(&highlight.text, config),
        "note": bounded_opt(&highlight.note, config),
        "book_id": highlight.book_id,
        "highlighted_at": highlight.highlighted_at,
    })
}

/// Highlight row for daily review output.
pub fn review_highlight(highlight: &Highlight, config: &ShapeConfig) -> Value {
    json!({
        "id": highlight.id,
        "text": bounded(&highlight.text, config),
        "title": highlight.title,
        "author": highlight.author,
        "note": bounded_opt(&highlight.note, config),
    })
}

/// Highlight row for text-search output.
pub fn search_highlight(highlight: &Highlight, config: &ShapeConfig) -> Value {
    json!({
        "id": highlight.id,
        "text": bounded(&highlight.text, config),
        "book_id": highlight.book_id,
        "note": bounded_opt(&highlight.note, config),
        "title": highlight.title,
    })
}

/// Highlight row scoped to a single book.
pub fn book_highlight(highlight: &Highlight, config: &ShapeConfig) -> Value {
    json!({
        "id": highlight.id,
        "text": bounded(&highlight.text, config),
        "note": bounded_opt(&highlight.note, config),
        "location": highlight.location,
        "highlighted_at": highlight.highlighted_at,
    })
}

/// Highlight row for bulk export output.
pub fn export_highlight(highlight: &Highlight, config: &ShapeConfig) -> Value {
    json!({
        "id": highlight.id,
        "text": bounded(&highlight.text, config),
        "title": highlight.title,
        "author": highlight.author,
        "book_id": highlight.book_id,
        "note": bounded_opt(&highlight.note, config),
        "highlighted_at": highlight.highlighted_at,
        "updated": highlight.updated,
    })
}

/// Book row for library listing.
pub fn book_summary(book: &Book) -> Value {
    json!({
        "id": book.id,
        "title": book.title,
        "author": book.author,
        "category": book.category,
        "num_highlights": book.num_highlights,
    })
}

/// Full document record with content handled per `mode`.
///
/// Fields the backend omitted stay absent. Summary and notes are bounded
/// at the configured ceiling; content is governed by the mode alone.
pub fn document_record(document: &Document, mode: ContentMode, config: &ShapeConfig) -> Value {
    let mut map = match serde_json::to_value(document) {
        Ok(Value::Object(map)) => map,
        Ok(other) => return other,
        Err(_) => return Value::Null,
    };

    match mode {
        ContentMode::Omit => {
            map.remove("content");
        }
        ContentMode::Full => {}
        ContentMode::Clipped(max_chars) => clip_field(&mut map, "content", max_chars),
    }

    clip_field(&mut map, "summary", config.max_field_chars);
    clip_field(&mut map, "notes", config.max_field_chars);

    Value::Object(map)
}

fn clip_field(map: &mut Map<String, Value>, key: &str, max_chars: usize) {
    let clipped = match map.get(key) {
        Some(Value::String(text)) if text.chars().count() > max_chars => {
            Some(truncate_chars(text, max_chars))
        }
        _ => None,
    };
    if let Some(text) = clipped {
        map.insert(key.to_string(), Value::String(text));
    }
}
