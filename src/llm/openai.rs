use async_trait::async_trait;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ Completion, CompletionProvider, TokenUsage };
use crate::errors::ChatError;
use crate::models::chat::ChatMessage;

const PROVIDER: &str = "openai";

pub struct OpenAiChatClient {
    http: HttpClient,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    model: String,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

/// Error envelope the API returns on non-2xx: `{"error": {"message", "type", "code"}}`.
#[derive(Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ChatError::Internal(format!("invalid API key format: {}", e)))?,
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ChatError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<Completion, ChatError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let req = OpenAiChatRequest { model, messages };

        let resp = self.http
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|e| ChatError::upstream(PROVIDER, e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OpenAiErrorBody>(&body) {
                Ok(parsed) => match parsed.error.error_type {
                    Some(kind) => format!("{} ({})", parsed.error.message, kind),
                    None => parsed.error.message,
                },
                Err(_) => format!("unexpected response: {}", body),
            };
            return Err(ChatError::upstream(PROVIDER, Some(status.as_u16()), message));
        }

        let parsed = resp
            .json::<OpenAiResponse>()
            .await
            .map_err(|e| ChatError::upstream(PROVIDER, None, format!("malformed completion payload: {}", e)))?;

        // A missing or empty choice is treated as an empty reply, not an error.
        let reply = parsed.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Completion {
            reply,
            model: parsed.model,
            usage: parsed.usage,
        })
    }
}
