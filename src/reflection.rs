//! Chain of Draft reflection markers.
//!
//! Marker matching only feeds logging. Nothing here can change what is sent
//! upstream or relayed back to the caller.

use serde_json::Value;

pub const REFLECTION_MARKERS: &[&str] = &[
    "####",
    "minimum draft",
    "<reflection>",
    "</reflection>",
    "Reflection:",
];

const PREVIEW_CHARS: usize = 100;

pub fn contains_marker(text: &str) -> bool {
    REFLECTION_MARKERS.iter().any(|m| text.contains(m))
}

/// Count non-overlapping occurrences of every marker in `text`.
pub fn count_markers(text: &str) -> usize {
    REFLECTION_MARKERS
        .iter()
        .map(|m| text.matches(m).count())
        .sum()
}

/// Extract the text of a chat message's `content`, whether it is a plain
/// string or an array of `{type: "text", text}` parts.
pub fn message_text(message: &Value) -> Option<String> {
    match message.get("content")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let text: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect();
            if text.is_empty() {
                None
            } else {
                Some(text.join(""))
            }
        }
        _ => None,
    }
}

pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// What the inbound messages tell us about reflection prompting.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestScan {
    pub message_count: usize,
    pub has_reflection: bool,
    pub last_message_preview: Option<String>,
}

pub fn scan_messages(messages: &[Value]) -> RequestScan {
    let has_reflection = messages
        .iter()
        .filter_map(message_text)
        .any(|text| contains_marker(&text));

    RequestScan {
        message_count: messages.len(),
        has_reflection,
        last_message_preview: messages.last().and_then(message_text).map(|t| preview(&t)),
    }
}

/// Counts markers across a sequence of text fragments, including matches
/// that straddle two fragments.
#[derive(Debug, Default)]
pub struct MarkerCounter {
    tail: String,
    hits: usize,
}

impl MarkerCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        let carried = self.tail.len();
        let mut window = std::mem::take(&mut self.tail);
        window.push_str(fragment);

        // Matches that end inside the carried tail were counted last time.
        self.hits += REFLECTION_MARKERS
            .iter()
            .map(|m| {
                window
                    .match_indices(m)
                    .filter(|(start, found)| start + found.len() > carried)
                    .count()
            })
            .sum::<usize>();

        let keep = max_marker_len().saturating_sub(1);
        let mut cut = window.len().saturating_sub(keep);
        while !window.is_char_boundary(cut) {
            cut += 1;
        }
        self.tail = window[cut..].to_string();
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

fn max_marker_len() -> usize {
    REFLECTION_MARKERS.iter().map(|m| m.len()).max().unwrap_or(0)
}
