use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{CompletionRequest, LlmClient};
use super::AnalysisError;
use crate::config::LlmSettings;

/// OpenAI-compatible chat-completions client.
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    /// Build the client. Must be called outside an async runtime.
    pub fn new(settings: &LlmSettings) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::UpstreamFailure(format!("HTTP client setup: {e}")))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: settings.model.clone(),
            client,
            timeout_secs: settings.timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request body for /chat/completions
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Response body from /chat/completions
#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LlmClient for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, AnalysisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AnalysisError::MissingCredential)?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AnalysisError::UpstreamFailure(format!(
                        "cannot connect to {}",
                        self.base_url
                    ))
                } else {
                    AnalysisError::UpstreamFailure(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "LLM service returned an error status");
            return Err(AnalysisError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                AnalysisError::Timeout(self.timeout_secs)
            } else {
                AnalysisError::UpstreamFailure(format!("unreadable completion response: {e}"))
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AnalysisError::UpstreamFailure("completion response carried no content".into())
            })
    }
}

type MockResponder = Box<dyn Fn() -> Result<String, AnalysisError> + Send + Sync>;

/// Mock LLM client for testing. Records every request it receives.
pub struct MockLlmClient {
    configured: bool,
    responder: MockResponder,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    /// Configured client that always replies with `response`.
    pub fn new(response: &str) -> Self {
        let response = response.to_string();
        Self {
            configured: true,
            responder: Box::new(move || Ok(response.clone())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Configured client whose every call fails with the error built by `make_error`.
    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> AnalysisError + Send + Sync + 'static,
    {
        Self {
            configured: true,
            responder: Box::new(move || Err(make_error())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client with no credential.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            responder: Box::new(|| Err(AnalysisError::MissingCredential)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl LlmClient for MockLlmClient {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, AnalysisError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        (self.responder)()
    }
}
