//! External LLM provider streaming implementations.
//!
//! Each provider streams tokens via SSE. Gemini, OpenAI and Anthropic use
//! different request bodies and event payloads; line buffering is shared.

use std::pin::Pin;

use futures::Stream;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tokio_stream::StreamExt;
use tracing::{debug, error};

use crate::types::{ChatMessage, GenerationRequest, LlmProvider};

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// Boxed stream type for returning different stream implementations.
pub type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A single streamed token, the end marker, or an error.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Token(String),
    Done { tokens_used: usize },
    Error(String),
}

/// Stream tokens from the given provider.
pub fn stream_llm(
    client: &Client,
    provider: LlmProvider,
    request: &GenerationRequest,
    model: &str,
    api_key: &str,
) -> BoxedStream {
    let (builder, parse): (RequestBuilder, fn(&str) -> Option<StreamChunk>) = match provider {
        LlmProvider::Gemini => (
            client
                .post(format!("{}/{}:streamGenerateContent?alt=sse", GEMINI_BASE, model))
                .header("x-goog-api-key", api_key)
                .json(&gemini_body(request)),
            parse_gemini_event,
        ),
        LlmProvider::OpenAI => (
            client
                .post(OPENAI_URL)
                .header("Authorization", format!("Bearer {}", api_key))
                .json(&openai_body(request, model)),
            parse_openai_event,
        ),
        LlmProvider::Anthropic => (
            client
                .post(ANTHROPIC_URL)
                .header("x-api-key", api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&anthropic_body(request, model)),
            parse_anthropic_event,
        ),
    };
    debug!("Streaming from {} with model {}", provider, model);
    Box::pin(stream_sse(builder, parse))
}

fn gemini_body(request: &GenerationRequest) -> Value {
    let contents: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| {
            let role = if m.role == "assistant" { "model" } else { "user" };
            json!({"role": role, "parts": [{"text": m.content}]})
        })
        .collect();

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "temperature": request.temperature,
            "maxOutputTokens": request.max_tokens,
        },
    });
    if let Some(sys) = system_message(&request.messages) {
        body["systemInstruction"] = json!({"parts": [{"text": sys}]});
    }
    body
}

fn openai_body(request: &GenerationRequest, model: &str) -> Value {
    let msgs: Vec<Value> = request
        .messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();
    json!({
        "model": model,
        "messages": msgs,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": true,
    })
}

fn anthropic_body(request: &GenerationRequest, model: &str) -> Value {
    let conv_msgs: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": conv_msgs,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": true,
    });
    if let Some(sys) = system_message(&request.messages) {
        body["system"] = json!(sys);
    }
    body
}

fn system_message(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.as_str())
}

/// Send the request and turn `data:` lines into chunks with `parse`.
///
/// The stream always ends with exactly one `Done` or `Error`.
fn stream_sse(
    builder: RequestBuilder,
    parse: fn(&str) -> Option<StreamChunk>,
) -> impl Stream<Item = StreamChunk> + Send + 'static {
    async_stream::stream! {
        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                yield StreamChunk::Error(format!("Request failed: {}", e));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            yield StreamChunk::Error(format!("API error {}: {}", status, body));
            return;
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut token_count = 0usize;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield StreamChunk::Error(format!("Stream read error: {}", e));
                    return;
                }
            };

            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // Process complete SSE lines
            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim().to_string();
                buffer.drain(..=line_end);

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                match parse(data.trim()) {
                    Some(StreamChunk::Token(t)) => {
                        token_count += 1;
                        yield StreamChunk::Token(t);
                    }
                    Some(StreamChunk::Done { .. }) => {
                        yield StreamChunk::Done { tokens_used: token_count };
                        return;
                    }
                    Some(StreamChunk::Error(msg)) => {
                        error!("Provider error: {}", msg);
                        yield StreamChunk::Error(msg);
                        return;
                    }
                    None => {}
                }
            }
        }

        yield StreamChunk::Done { tokens_used: token_count };
    }
}

/// Gemini: `candidates[0].content.parts[*].text`.
pub fn parse_gemini_event(data: &str) -> Option<StreamChunk> {
    let parsed: Value = serde_json::from_str(data).ok()?;
    if let Some(msg) = parsed["error"]["message"].as_str() {
        return Some(StreamChunk::Error(msg.to_string()));
    }
    let text: String = parsed["candidates"][0]["content"]["parts"]
        .as_array()?
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect();
    (!text.is_empty()).then_some(StreamChunk::Token(text))
}

/// OpenAI: `choices[0].delta.content`, terminated by `[DONE]`.
pub fn parse_openai_event(data: &str) -> Option<StreamChunk> {
    if data == "[DONE]" {
        return Some(StreamChunk::Done { tokens_used: 0 });
    }
    let parsed: Value = serde_json::from_str(data).ok()?;
    if let Some(msg) = parsed["error"]["message"].as_str() {
        return Some(StreamChunk::Error(msg.to_string()));
    }
    parsed["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|c| !c.is_empty())
        .map(|c| StreamChunk::Token(c.to_string()))
}

/// Anthropic: `content_block_delta` tokens until `message_stop`.
pub fn parse_anthropic_event(data: &str) -> Option<StreamChunk> {
    let parsed: Value = serde_json::from_str(data).ok()?;
    match parsed["type"].as_str() {
        Some("content_block_delta") => parsed["delta"]["text"]
            .as_str()
            .filter(|t| !t.is_empty())
            .map(|t| StreamChunk::Token(t.to_string())),
        Some("message_stop") => Some(StreamChunk::Done { tokens_used: 0 }),
        Some("error") => Some(StreamChunk::Error(
            parsed["error"]["message"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_event() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"Battery "},{"text":"life"}],"role":"model"}}]}"#;
        assert_eq!(
            parse_gemini_event(data),
            Some(StreamChunk::Token("Battery life".into()))
        );
        let err = r#"{"error":{"code":429,"message":"Quota exceeded"}}"#;
        assert_eq!(
            parse_gemini_event(err),
            Some(StreamChunk::Error("Quota exceeded".into()))
        );
        assert_eq!(parse_gemini_event(r#"{"candidates":[{"finishReason":"STOP"}]}"#), None);
    }

    #[test]
    fn test_openai_event() {
        let data = r#"{"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(parse_openai_event(data), Some(StreamChunk::Token("Hello".into())));
        assert!(matches!(parse_openai_event("[DONE]"), Some(StreamChunk::Done { .. })));
        assert_eq!(parse_openai_event("not json"), None);
    }

    #[test]
    fn test_anthropic_event() {
        let delta = r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"Hi"}}"#;
        assert_eq!(parse_anthropic_event(delta), Some(StreamChunk::Token("Hi".into())));
        assert!(matches!(
            parse_anthropic_event(r#"{"type":"message_stop"}"#),
            Some(StreamChunk::Done { .. })
        ));
        assert_eq!(parse_anthropic_event(r#"{"type":"ping"}"#), None);
    }

    #[test]
    fn test_gemini_body_moves_system_prompt() {
        let req = GenerationRequest::with_system("Be brief.", "Question?");
        let body = gemini_body(&req);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Question?");
    }

    #[test]
    fn test_anthropic_body_separates_system() {
        let req = GenerationRequest::with_system("Be brief.", "Question?");
        let body = anthropic_body(&req, "claude-3-5-haiku-20241022");
        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["stream"], true);
    }
}
