use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Generation parameters used when the caller leaves a field out.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub temperature: Number,
    pub top_p: Number,
    pub top_k: Number,
    pub max_tokens: Number,
    pub presence_penalty: Number,
    pub frequency_penalty: Number,
}

fn float(value: f64) -> Number {
    Number::from_f64(value).unwrap_or_else(|| Number::from(0))
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: float(0.6),
            top_p: Number::from(1),
            top_k: Number::from(40),
            max_tokens: Number::from(8192),
            presence_penalty: Number::from(0),
            frequency_penalty: Number::from(0),
        }
    }
}

/// Body sent to the upstream chat-completions endpoint.
///
/// Numeric parameters are carried as JSON numbers so caller values such as
/// `-1` or `1024.0` reach upstream exactly as written.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamPayload {
    pub model: String,
    pub messages: Vec<Value>,
    pub temperature: Number,
    pub top_p: Number,
    pub top_k: Number,
    pub max_tokens: Number,
    pub presence_penalty: Number,
    pub frequency_penalty: Number,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
}
