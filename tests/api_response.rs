use cod_relay::api::response::{extract_content, extract_usage, Usage};
use serde_json::json;

#[test]
fn test_extract_content_with_content() {
    let response = json!({
        "choices": [{
            "message": {
                "content": "Hello, world!",
                "role": "assistant"
            }
        }]
    });

    assert_eq!(extract_content(&response), Some("Hello, world!"));
}

#[test]
fn test_extract_content_without_content() {
    let response = json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "tool_calls": [{"id": "call_123", "type": "function"}]
            }
        }]
    });

    assert_eq!(extract_content(&response), None);
}

#[test]
fn test_extract_content_empty_choices() {
    let response = json!({
        "choices": []
    });

    assert_eq!(extract_content(&response), None);
}

#[test]
fn test_extract_usage() {
    let response = json!({
        "choices": [],
        "usage": {
            "prompt_tokens": 12,
            "completion_tokens": 30,
            "total_tokens": 42
        }
    });

    assert_eq!(
        extract_usage(&response),
        Usage {
            total_tokens: Some(42),
            completion_tokens: Some(30),
        }
    );
}

#[test]
fn test_extract_usage_missing() {
    let response = json!({"id": "chatcmpl-1"});

    assert_eq!(extract_usage(&response), Usage::default());
}
