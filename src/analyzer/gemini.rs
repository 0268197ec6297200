use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::VideoAnalyzer;
use crate::config::GeminiConfig;
use crate::{Result, TimestamperError};

/// `generateContent` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
}

/// `generateContent` response body, reduced to the fields we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Gemini REST client that passes the YouTube URL as file data next to the prompt
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f64,
    base_url: String,
}

impl GeminiClient {
    /// Create a client from explicit configuration. Fails when no API key is present.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TimestamperError::Configuration("Gemini API key is missing".to_string()))?
            .to_string();

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(&self, video_url: &str, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        file_data: Some(FileData {
                            file_uri: video_url.to_string(),
                        }),
                        text: None,
                    },
                    Part {
                        file_data: None,
                        text: Some(prompt.to_string()),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

/// Longest error body echoed back to the user
const MAX_ERROR_BODY_CHARS: usize = 300;

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{}... (truncated)", head)
}

/// Concatenate the visible text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(TimestamperError::UpstreamCall(format!(
            "prompt was blocked: {}",
            reason
        )));
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        TimestamperError::UpstreamCall("response contained no candidates".to_string())
    })?;

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        return Err(TimestamperError::UpstreamCall(format!(
            "candidate contained no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

#[async_trait]
impl VideoAnalyzer for GeminiClient {
    async fn describe(&self, video_url: &str, prompt: &str) -> Result<String> {
        tracing::debug!("POST {} (model {})", self.endpoint(), self.model);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(video_url, prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TimestamperError::UpstreamCall(format!(
                "HTTP {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = extract_text(parsed)?;
        tracing::debug!("Model replied with {} characters", text.len());

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single HTTP request with the given status and body, returning the base URL
    async fn serve_once(status_line: &'static str, content_type: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // Drain the whole request so closing the socket does not reset it
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            api_key: Some("fake-key".to_string()),
            base_url,
            ..GeminiConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_describe_returns_candidate_text() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "[]"}]}, "finishReason": "STOP"}]
        })
        .to_string();
        let base_url = serve_once("200 OK", "application/json", body).await;

        let text = client_for(base_url)
            .describe("https://youtube.com/watch?v=dQw4w9WgXcQ", "describe it")
            .await
            .unwrap();
        assert_eq!(text, "[]");
    }

    #[tokio::test]
    async fn test_describe_error_status_is_upstream_failure() {
        let page = format!("<html><body>{}</body></html>", "Not Implemented ".repeat(200));
        let base_url = serve_once("501 Not Implemented", "text/html", page).await;

        let result = client_for(base_url)
            .describe("https://youtube.com/watch?v=dQw4w9WgXcQ", "describe it")
            .await;

        match result {
            Err(TimestamperError::UpstreamCall(msg)) => {
                assert!(msg.contains("501"), "unexpected message: {}", msg);
                assert!(msg.ends_with("(truncated)"));
                assert!(msg.chars().count() < MAX_ERROR_BODY_CHARS + 60);
            }
            other => panic!("expected upstream failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_describe_transport_error_is_upstream_failure() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client_for(format!("http://{}", addr))
            .describe("https://youtube.com/watch?v=dQw4w9WgXcQ", "describe it")
            .await;
        assert!(matches!(result, Err(TimestamperError::UpstreamCall(_))));
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("  short  "), "short");

        let long = "é".repeat(MAX_ERROR_BODY_CHARS + 10);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("... (truncated)"));
        assert_eq!(truncated.chars().filter(|c| *c == 'é').count(), MAX_ERROR_BODY_CHARS);
    }

    fn config_with_key() -> GeminiConfig {
        GeminiConfig {
            api_key: Some("fake-key".to_string()),
            base_url: "https://example.test/".to_string(),
            ..GeminiConfig::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = GeminiClient::new(&GeminiConfig::default());
        assert!(matches!(result, Err(TimestamperError::Configuration(_))));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(&config_with_key()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let client = GeminiClient::new(&config_with_key()).unwrap();
        let body = client.request_body("https://youtube.com/watch?v=dQw4w9WgXcQ", "describe it");

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contents": [{
                    "parts": [
                        {"fileData": {"fileUri": "https://youtube.com/watch?v=dQw4w9WgXcQ"}},
                        {"text": "describe it"}
                    ]
                }],
                "generationConfig": {"temperature": 0.8}
            })
        );
    }

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = parse(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "[{\"timestamp\": \"00:00:00\","},
                    {"text": " \"description\": \"hi\"}]"}
                ]},
                "finishReason": "STOP"
            }]
        }));

        assert_eq!(
            extract_text(response).unwrap(),
            "[{\"timestamp\": \"00:00:00\", \"description\": \"hi\"}]"
        );
    }

    #[test]
    fn test_extract_text_failures() {
        let blocked = parse(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        assert!(matches!(extract_text(blocked), Err(TimestamperError::UpstreamCall(msg)) if msg.contains("SAFETY")));

        let empty = parse(json!({"candidates": []}));
        assert!(extract_text(empty).is_err());

        let no_text = parse(json!({"candidates": [{"finishReason": "MAX_TOKENS"}]}));
        assert!(matches!(extract_text(no_text), Err(TimestamperError::UpstreamCall(msg)) if msg.contains("MAX_TOKENS")));
    }
}
