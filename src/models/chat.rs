use serde::Deserialize;
use serde_json::{Number, Value};

use super::payload::{GenerationDefaults, UpstreamPayload};
use crate::error::{RelayError, Result};

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: model and messages";

/// Inbound chat-completion request as sent by the caller.
///
/// Every field is optional at the wire level so that presence can be told
/// apart from a zero value. Numbers are not range-checked. Message entries
/// are kept as raw JSON and forwarded untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    pub model: Option<String>,
    pub messages: Option<Vec<Value>>,
    pub temperature: Option<Number>,
    pub top_p: Option<Number>,
    pub top_k: Option<Number>,
    pub max_tokens: Option<Number>,
    pub presence_penalty: Option<Number>,
    pub frequency_penalty: Option<Number>,
    pub stream: Option<bool>,
    pub tools: Option<Vec<Value>>,
    pub tool_choice: Option<Value>,
}

impl ChatRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| RelayError::BadRequest(format!("Invalid request body: {}", e)))
    }

    /// Build the upstream payload, filling absent numeric fields from `defaults`.
    pub fn into_payload(self, defaults: &GenerationDefaults) -> Result<UpstreamPayload> {
        let model = self.model.filter(|m| !m.is_empty());
        let messages = self.messages.filter(|m| !m.is_empty());

        let (model, messages) = match (model, messages) {
            (Some(model), Some(messages)) => (model, messages),
            _ => return Err(RelayError::BadRequest(MISSING_FIELDS_MESSAGE.to_string())),
        };

        let tools = self.tools.filter(|t| !t.is_empty());
        let tool_choice = if tools.is_some() { self.tool_choice } else { None };

        Ok(UpstreamPayload {
            model,
            messages,
            temperature: self.temperature.unwrap_or_else(|| defaults.temperature.clone()),
            top_p: self.top_p.unwrap_or_else(|| defaults.top_p.clone()),
            top_k: self.top_k.unwrap_or_else(|| defaults.top_k.clone()),
            max_tokens: self.max_tokens.unwrap_or_else(|| defaults.max_tokens.clone()),
            presence_penalty: self
                .presence_penalty
                .unwrap_or_else(|| defaults.presence_penalty.clone()),
            frequency_penalty: self
                .frequency_penalty
                .unwrap_or_else(|| defaults.frequency_penalty.clone()),
            stream: self.stream.unwrap_or(false),
            tools,
            tool_choice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> ChatRequest {
        ChatRequest::from_slice(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_defaults_fill_absent_fields() {
        let request = parse(json!({
            "model": "m",
            "messages": [{"role": "user", "content": "hi"}]
        }));
        let payload = request.into_payload(&GenerationDefaults::default()).unwrap();

        assert_eq!(payload.temperature.as_f64(), Some(0.6));
        assert_eq!(payload.top_p, Number::from(1));
        assert_eq!(payload.top_k, Number::from(40));
        assert_eq!(payload.max_tokens, Number::from(8192));
        assert_eq!(payload.presence_penalty, Number::from(0));
        assert_eq!(payload.frequency_penalty, Number::from(0));
        assert!(!payload.stream);
    }

    #[test]
    fn test_explicit_zero_is_kept() {
        let request = parse(json!({
            "model": "m",
            "messages": [{"content": "hi"}],
            "temperature": 0,
            "top_p": 0,
            "top_k": 0,
            "max_tokens": 0
        }));
        let payload = request.into_payload(&GenerationDefaults::default()).unwrap();

        assert_eq!(payload.temperature, Number::from(0));
        assert_eq!(payload.top_p, Number::from(0));
        assert_eq!(payload.top_k, Number::from(0));
        assert_eq!(payload.max_tokens, Number::from(0));
    }

    #[test]
    fn test_numbers_are_forwarded_as_written() {
        let request = parse(json!({
            "model": "m",
            "messages": [{"content": "hi"}],
            "top_k": -1,
            "max_tokens": 1024.0,
            "temperature": 1.5
        }));
        let payload = request.into_payload(&GenerationDefaults::default()).unwrap();
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["top_k"], json!(-1));
        assert_eq!(value["max_tokens"], json!(1024.0));
        assert!(value["max_tokens"].is_f64());
        assert_eq!(value["temperature"], json!(1.5));
        assert_eq!(value["top_p"], json!(1));
    }

    #[test]
    fn test_non_numeric_parameter_is_bad_request() {
        let body = br#"{"model":"m","messages":[{"content":"hi"}],"top_k":"many"}"#;
        let err = ChatRequest::from_slice(body).unwrap_err();
        assert!(matches!(err, RelayError::BadRequest(_)));
    }

    #[test]
    fn test_missing_model_is_rejected() {
        let request = parse(json!({"messages": [{"content": "hi"}]}));
        let err = request
            .into_payload(&GenerationDefaults::default())
            .unwrap_err();
        assert!(matches!(err, RelayError::BadRequest(ref m) if m == MISSING_FIELDS_MESSAGE));
    }

    #[test]
    fn test_empty_model_or_messages_is_rejected() {
        let defaults = GenerationDefaults::default();
        assert!(parse(json!({"model": "", "messages": [{"content": "hi"}]}))
            .into_payload(&defaults)
            .is_err());
        assert!(parse(json!({"model": "m", "messages": []}))
            .into_payload(&defaults)
            .is_err());
    }

    #[test]
    fn test_tool_choice_dropped_without_tools() {
        let request = parse(json!({
            "model": "m",
            "messages": [{"content": "hi"}],
            "tools": [],
            "tool_choice": "auto"
        }));
        let payload = request.into_payload(&GenerationDefaults::default()).unwrap();
        assert!(payload.tools.is_none());
        assert!(payload.tool_choice.is_none());

        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }

    #[test]
    fn test_tools_forwarded_with_choice() {
        let request = parse(json!({
            "model": "m",
            "messages": [{"content": "hi"}],
            "tools": [{"type": "function", "function": {"name": "lookup"}}],
            "tool_choice": "auto"
        }));
        let payload = request.into_payload(&GenerationDefaults::default()).unwrap();
        assert_eq!(payload.tools.as_ref().map(Vec::len), Some(1));
        assert_eq!(payload.tool_choice, Some(json!("auto")));
    }

    #[test]
    fn test_malformed_json_is_bad_request() {
        let err = ChatRequest::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, RelayError::BadRequest(_)));
    }

    #[test]
    fn test_messages_entries_are_not_validated() {
        let request = parse(json!({"model": "m", "messages": [42, "loose"]}));
        let payload = request.into_payload(&GenerationDefaults::default()).unwrap();
        assert_eq!(payload.messages, vec![json!(42), json!("loose")]);
    }
}
