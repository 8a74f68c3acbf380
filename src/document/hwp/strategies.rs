//! Text extraction strategies for raw decoder models
//!
//! Decoders do not agree on where a text model keeps its characters. Each
//! strategy looks in one place; they are tried in order and the first
//! non-empty result wins.

use serde_json::Value;

pub type TextStrategy = fn(&Value) -> Option<String>;

/// Strategies in priority order, with a name for logging
pub const TEXT_STRATEGIES: &[(&str, TextStrategy)] = &[
    ("chunks", from_chunks),
    ("text", from_text_field),
    ("content", from_content_string),
    ("value", from_value_field),
];

/// Text of a model's content, or `None` when no strategy finds any
pub fn extract_text(content: &Value) -> Option<String> {
    TEXT_STRATEGIES.iter().find_map(|(name, strategy)| {
        let text = strategy(content).filter(|t| !t.is_empty())?;
        log::trace!("text found by {name} strategy");
        Some(text)
    })
}

/// `chunks: [[range, text], ...]`; control chunks without a string are skipped
pub fn from_chunks(content: &Value) -> Option<String> {
    let chunks = content.get("chunks")?.as_array()?;
    let text: String = chunks
        .iter()
        .filter_map(|chunk| chunk.as_array()?.get(1)?.as_str())
        .collect();
    Some(text)
}

/// `text: "..."` or `text: ["...", ...]`
pub fn from_text_field(content: &Value) -> Option<String> {
    joined(content.get("text")?)
}

/// Content that is itself a string, or `content: "..."` one level down
pub fn from_content_string(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        _ => content.get("content")?.as_str().map(str::to_string),
    }
}

pub fn from_value_field(content: &Value) -> Option<String> {
    joined(content.get("value")?)
}

fn joined(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
        _ => None,
    }
}
