//! # OpenAI chat-completions client
//!
//! Implements [`CompletionClient`] from `tdata-core` over the OpenAI-compatible
//! `/v1/chat/completions` endpoint. One request per call: no retry, and no timeout unless
//! one is configured.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tdata_core::contract::{ChatMessage, CompletionClient, CompletionError, CompletionRequest};

pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, CompletionError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CompletionError::Transport(format!("failed to build HTTP client: {e}")))?;
        let api_key = api_key.into();
        let api_url = api_url.into();
        tracing::info!(
            api_url = %api_url,
            api_key_set = !api_key.is_empty(),
            timeout_secs = timeout.map(|t| t.as_secs()),
            "Initialized OpenAiClient"
        );
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "Sending chat completion request"
        );
        let body = ChatRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: &request.messages,
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            tracing::error!(status = %status, "Chat completion request rejected");
            return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                CompletionError::Quota(text)
            } else {
                CompletionError::Api {
                    status: status.as_u16(),
                    body: text,
                }
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| CompletionError::Decode(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyReply)?;
        let content = choice.message.content.unwrap_or_default();
        tracing::info!(chars = content.len(), "Chat completion received");
        Ok(content)
    }
}
