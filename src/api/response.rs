use serde_json::Value;

/// Token usage reported by a buffered completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub total_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// Extract the assistant message content from a buffered response, if any.
pub fn extract_content(response_json: &Value) -> Option<&str> {
    response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
}

pub fn extract_usage(response_json: &Value) -> Usage {
    let usage = response_json.get("usage");
    let field = |name: &str| usage.and_then(|u| u.get(name)).and_then(|v| v.as_u64());

    Usage {
        total_tokens: field("total_tokens"),
        completion_tokens: field("completion_tokens"),
    }
}
