//! Anthropic API request and response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// MESSAGE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

/// Server-side tool definition. Only web search is used here.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub name: String,
    pub max_uses: u32,
}

impl Tool {
    pub fn web_search(max_uses: u32) -> Self {
        Self {
            tool_type: "web_search_20250305".to_string(),
            name: "web_search".to_string(),
            max_uses,
        }
    }
}

/// One conversation message. Content is carried as raw JSON so that
/// assistant turns containing server tool blocks round-trip unchanged
/// through the pause_turn continuation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Value,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Value::String(text.into()),
        }
    }

    pub fn assistant(content: Value) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub content: Value,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl MessageResponse {
    /// Concatenate the text blocks of the response content, skipping
    /// tool-use and search-result blocks.
    pub fn text(&self) -> String {
        match &self.content {
            Value::Array(blocks) => blocks
                .iter()
                .filter_map(|block| {
                    if block.get("type").and_then(Value::as_str) == Some("text") {
                        block.get("text").and_then(Value::as_str)
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>()
                .join(""),
            Value::String(text) => text.clone(),
            _ => String::new(),
        }
    }
}

// ============================================================================
// SHARED TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: i64,
    pub output_tokens: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_omits_empty_optionals() {
        let request = MessageRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            messages: vec![Message::user("hello")],
            max_tokens: 8192,
            system: None,
            temperature: None,
            tools: Vec::new(),
        };
        let encoded = serde_json::to_value(&request).unwrap();
        assert!(encoded.get("system").is_none());
        assert!(encoded.get("temperature").is_none());
        assert!(encoded.get("tools").is_none());
    }

    #[test]
    fn test_web_search_tool_shape() {
        let request = MessageRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            messages: vec![Message::user("hello")],
            max_tokens: 8192,
            system: None,
            temperature: None,
            tools: vec![Tool::web_search(15)],
        };
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded["tools"][0]["type"], "web_search_20250305");
        assert_eq!(encoded["tools"][0]["name"], "web_search");
        assert_eq!(encoded["tools"][0]["max_uses"], 15);
    }

    #[test]
    fn test_response_text_skips_tool_blocks() {
        let response: MessageResponse = serde_json::from_value(json!({
            "content": [
                {"type": "server_tool_use", "id": "tu_1", "name": "web_search"},
                {"type": "text", "text": "Part one. "},
                {"type": "web_search_tool_result", "tool_use_id": "tu_1"},
                {"type": "text", "text": "Part two."}
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();
        assert_eq!(response.text(), "Part one. Part two.");
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn test_api_error_parsing() {
        let parsed: ApiError = serde_json::from_str(
            r#"{"error": {"type": "overloaded_error", "message": "Overloaded"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.error.kind, "overloaded_error");
        assert_eq!(parsed.error.message, "Overloaded");
    }
}
