//! OpenAI-compatible chat-completions gateway.
//!
//! Speaks the `/chat/completions` wire format, which OpenAI and most local
//! servers (Ollama, LM Studio, vLLM) accept. Conversation messages and
//! responses are mapped through private wire structs so the domain types never
//! carry provider naming.

use crate::config::FileModelConfig;
use async_trait::async_trait;
use klaude_application::{GatewayError, LlmGateway};
use klaude_domain::{FinishReason, LlmResponse, Message, ToolInvocationRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct OpenAiGateway {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl OpenAiGateway {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
            temperature: 0.0,
        })
    }

    /// Build from the `[model]` section, reading the key from its variable.
    pub fn from_config(config: &FileModelConfig) -> Result<Self, GatewayError> {
        let api_key = config.api_key();
        if api_key.is_none() {
            warn!(
                var = %config.api_key_env,
                "No API key set; requests go out unauthenticated"
            );
        }
        Ok(Self::new(
            &config.base_url,
            config.name.clone(),
            api_key,
            config.request_timeout(),
        )?
        .with_temperature(config.temperature))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Value],
    ) -> Result<LlmResponse, GatewayError> {
        let body = request_body(&self.model, self.temperature, messages, tools)?;
        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Requesting completion"
        );

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_send_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_send_error)?;
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "HTTP {}: {}",
                status,
                text.trim()
            )));
        }

        parse_completion(&text)
    }
}

fn map_send_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

// ==================== Wire format ====================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    tools: &'a [Value],
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

fn to_wire(message: &Message) -> WireMessage {
    let content = message.rendered_content();
    match message {
        Message::Assistant { tool_calls, .. } => WireMessage {
            role: message.role().as_str(),
            content,
            tool_calls: tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.call_id.clone(),
                    kind: function_kind(),
                    function: WireFunction {
                        name: call.tool_name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
            tool_call_id: None,
        },
        Message::Tool { call_id, .. } => WireMessage {
            role: message.role().as_str(),
            content,
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.clone()),
        },
        Message::System { .. } | Message::User { .. } => WireMessage {
            role: message.role().as_str(),
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
        },
    }
}

fn request_body(
    model: &str,
    temperature: f32,
    messages: &[Message],
    tools: &[Value],
) -> Result<Value, GatewayError> {
    let request = ChatRequest {
        model,
        messages: messages.iter().map(to_wire).collect(),
        tools,
        temperature,
    };
    serde_json::to_value(&request)
        .map_err(|e| GatewayError::Other(format!("Failed to encode request: {}", e)))
}

fn parse_completion(body: &str) -> Result<LlmResponse, GatewayError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("{}: {}", e, preview(body))))?;
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(GatewayError::InvalidResponse(
            "response has no choices".to_string(),
        ));
    };

    let tool_calls: Vec<ToolInvocationRequest> = choice
        .message
        .tool_calls
        .into_iter()
        .map(|call| {
            // Ids pair results with calls; some compatible servers leave them out.
            let id = if call.id.is_empty() {
                format!("call_{}", Uuid::new_v4().simple())
            } else {
                call.id
            };
            ToolInvocationRequest::new(id, call.function.name, call.function.arguments)
        })
        .collect();

    // Some compatible servers omit finish_reason; infer it from the payload.
    let finish_reason = match choice.finish_reason.as_deref() {
        Some(reason) => FinishReason::from_wire(reason),
        None if !tool_calls.is_empty() => FinishReason::ToolCalls,
        None => FinishReason::Stop,
    };

    Ok(LlmResponse {
        content: choice.message.content.filter(|text| !text.is_empty()),
        tool_calls,
        finish_reason,
        model: response.model,
    })
}

fn preview(body: &str) -> String {
    let head: String = body.chars().take(200).collect();
    if head.len() < body.len() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_maps_roles() {
        let messages = vec![
            Message::System {
                content: "be brief".to_string(),
            },
            Message::User {
                content: "list files".to_string(),
                reminders: vec!["todo: 1 item".to_string()],
            },
            Message::Assistant {
                content: None,
                tool_calls: vec![ToolInvocationRequest::new("call_1", "LS", r#"{"path":"/"}"#)],
            },
            Message::Tool {
                call_id: "call_1".to_string(),
                content: "- /".to_string(),
                is_error: false,
            },
        ];
        let tools = vec![json!({"type": "function", "function": {"name": "LS"}})];

        let body = request_body("gpt-4o", 0.0, &messages, &tools).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["tools"][0]["function"]["name"], "LS");

        let wire = body["messages"].as_array().unwrap();
        assert_eq!(wire[0], json!({"role": "system", "content": "be brief"}));
        assert_eq!(
            wire[1]["content"],
            "list files\n\n<system-reminder>todo: 1 item</system-reminder>"
        );
        assert_eq!(
            wire[2],
            json!({
                "role": "assistant",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "LS", "arguments": "{\"path\":\"/\"}"}
                }]
            })
        );
        assert_eq!(
            wire[3],
            json!({"role": "tool", "content": "- /", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn test_request_body_omits_empty_tools() {
        let body = request_body("m", 0.0, &[], &[]).unwrap();
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_tool_calls() {
        let body = json!({
            "model": "gpt-4o-2024",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "Read", "arguments": "{\"file_path\":\"/x\"}"}},
                        {"id": "b", "type": "function", "function": {"name": "LS", "arguments": "{}"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        })
        .to_string();

        let response = parse_completion(&body).unwrap();
        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        assert_eq!(response.content, None);
        assert_eq!(response.model.as_deref(), Some("gpt-4o-2024"));
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].call_id, "a");
        assert_eq!(response.tool_calls[0].arguments, r#"{"file_path":"/x"}"#);
    }

    #[test]
    fn test_missing_call_ids_get_unique_ids() {
        let body = json!({
            "choices": [{
                "message": {
                    "tool_calls": [
                        {"function": {"name": "LS", "arguments": "{}"}},
                        {"id": "", "function": {"name": "Glob", "arguments": "{}"}}
                    ]
                }
            }]
        })
        .to_string();

        let first = parse_completion(&body).unwrap();
        let second = parse_completion(&body).unwrap();
        let ids: Vec<&str> = first
            .tool_calls
            .iter()
            .chain(&second.tool_calls)
            .map(|c| c.call_id.as_str())
            .collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.iter().all(|id| id.starts_with("call_") && id.len() > 5));
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(first.finish_reason, FinishReason::ToolCalls);
    }

    #[test]
    fn test_parse_finish_reasons() {
        let reply = |reason: &str| {
            json!({"choices": [{"message": {"content": "hi"}, "finish_reason": reason}]})
                .to_string()
        };
        assert_eq!(
            parse_completion(&reply("stop")).unwrap().finish_reason,
            FinishReason::Stop
        );
        assert_eq!(
            parse_completion(&reply("length")).unwrap().finish_reason,
            FinishReason::Length
        );
        assert_eq!(
            parse_completion(&reply("eos")).unwrap().finish_reason,
            FinishReason::Other("eos".to_string())
        );

        let missing = json!({"choices": [{"message": {"content": "hi"}}]}).to_string();
        assert_eq!(
            parse_completion(&missing).unwrap().finish_reason,
            FinishReason::Stop
        );
    }

    #[test]
    fn test_parse_rejects_bad_payloads() {
        assert!(matches!(
            parse_completion("not json"),
            Err(GatewayError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_completion(r#"{"choices": []}"#),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let gateway =
            OpenAiGateway::new("http://localhost:11434/v1/", "llama3", None, Duration::from_secs(5))
                .unwrap();
        assert_eq!(gateway.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(gateway.model_name(), "llama3");
    }
}
