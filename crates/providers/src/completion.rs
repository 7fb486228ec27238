use async_trait::async_trait;
use once_cell::sync::Lazy;
use resilience::ResilienceError;
use serde::Deserialize;
use serde_json::json;

use crate::config::{CompletionConfig, ProviderKind};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(16)
        .build()
        .expect("failed to build shared reqwest client")
});

#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self { max_tokens: 160, temperature: 0.3 }
    }
}

/// Prompt-to-text for short explanatory rationales (§4.4). Output is
/// advisory only: the orchestrator never lets a completion failure fail the
/// request, and never feeds the result back into ranking.
#[async_trait]
pub trait CompletionAdapter: Send + Sync {
    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, ResilienceError>;
}

pub struct HttpCompletionAdapter {
    config: CompletionConfig,
}

impl HttpCompletionAdapter {
    pub fn new(config: CompletionConfig) -> Self {
        Self { config }
    }

    fn map_transport_error(err: reqwest::Error) -> ResilienceError {
        if err.is_timeout() {
            ResilienceError::DependencyUnavailable(format!("timed out: {err}"))
        } else if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                ResilienceError::Throttled { retry_after_ms: None }
            } else if status.is_server_error() {
                ResilienceError::DependencyUnavailable(format!("server error {status}"))
            } else {
                ResilienceError::ConfigInvalid(format!("request rejected: {status}"))
            }
        } else {
            ResilienceError::DependencyUnavailable(err.to_string())
        }
    }
}

#[derive(Deserialize)]
struct OpenAiChoice {
    text: Option<String>,
    message: Option<OpenAiMessage>,
}
#[derive(Deserialize)]
struct OpenAiMessage {
    content: String,
}
#[derive(Deserialize)]
struct OpenAiCompletionBody {
    choices: Vec<OpenAiChoice>,
}
#[derive(Deserialize)]
struct HuggingFaceBody(Vec<HuggingFaceItem>);
#[derive(Deserialize)]
struct HuggingFaceItem {
    generated_text: String,
}

#[async_trait]
impl CompletionAdapter for HttpCompletionAdapter {
    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, ResilienceError> {
        let body = match self.config.provider {
            ProviderKind::OpenAi => json!({
                "model": self.config.model,
                "messages": [{ "role": "user", "content": prompt }],
                "max_tokens": params.max_tokens,
                "temperature": params.temperature,
            }),
            ProviderKind::HuggingFace => json!({
                "inputs": prompt,
                "parameters": { "max_new_tokens": params.max_tokens, "temperature": params.temperature },
            }),
            ProviderKind::Custom => json!({
                "model": self.config.model,
                "prompt": prompt,
                "max_tokens": params.max_tokens,
                "temperature": params.temperature,
            }),
        };

        let mut builder = HTTP_CLIENT.post(&self.config.api_url).json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(Self::map_transport_error)?;
        let response = response.error_for_status().map_err(Self::map_transport_error)?;
        let value: serde_json::Value = response.json().await.map_err(Self::map_transport_error)?;

        if let Ok(body) = serde_json::from_value::<OpenAiCompletionBody>(value.clone()) {
            if let Some(choice) = body.choices.into_iter().next() {
                if let Some(message) = choice.message {
                    return Ok(message.content);
                }
                if let Some(text) = choice.text {
                    return Ok(text);
                }
            }
        }
        if let Ok(HuggingFaceBody(items)) = serde_json::from_value::<HuggingFaceBody>(value) {
            if let Some(item) = items.into_iter().next() {
                return Ok(item.generated_text);
            }
        }
        Err(ResilienceError::DependencyUnavailable("unrecognized completion response shape".into()))
    }
}

/// Canned-string stub used by tests and as the orchestrator's graceful
/// degradation when the completion adapter fails terminally (§4.4).
pub struct StubCompletionAdapter {
    pub canned_response: String,
}

impl Default for StubCompletionAdapter {
    fn default() -> Self {
        Self { canned_response: "no rationale available".into() }
    }
}

#[async_trait]
impl CompletionAdapter for StubCompletionAdapter {
    async fn complete(&self, _prompt: &str, _params: CompletionParams) -> Result<String, ResilienceError> {
        Ok(self.canned_response.clone())
    }
}

/// Canned fallback string the orchestrator substitutes on completion
/// failure, never failing the request (§4.4, §4.7 step 8).
pub const FALLBACK_RATIONALE: &str = "A rationale could not be generated for this match at this time.";
