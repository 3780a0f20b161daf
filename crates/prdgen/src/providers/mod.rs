//! Upstream completion clients.
//!
//! All three providers speak an OpenAI-compatible chat-completions dialect,
//! so the request/response shapes live here and each provider module only
//! supplies its endpoint, headers, prompts, and token clamping.

pub mod dashscope;
pub mod moonshot;
pub mod openrouter;

use prdgen_core::model::{Model, Provider};
use prdgen_core::tokens::TokenUsage;
use serde::{Deserialize, Serialize};

use crate::config::ConfigStore;
use crate::prelude::*;

/// Timeout for one completion call. Large responses take a while.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// OpenAI-compatible chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// OpenAI-compatible chat completion request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u64,
    pub stream: bool,
    /// DashScope carries the thinking-mode switch here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_body: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    pub content: String,
}

/// Upstream token accounting. Every field defaults to zero because some
/// providers omit the object entirely.
#[derive(Debug, Default, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl From<ChatUsage> for TokenUsage {
    fn from(usage: ChatUsage) -> Self {
        TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// Raw model output plus usage accounting for one completion call.
#[derive(Debug)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}

/// Dispatch a PRD generation request to the provider that hosts `model`.
pub async fn send_prd_request(
    http: &reqwest::Client,
    model: Model,
    api_key: &str,
    prd_content: &str,
    project_name: &str,
    max_tokens: u64,
) -> Result<Completion> {
    match model.provider() {
        Provider::Openrouter => {
            openrouter::send_prd_request(http, api_key, prd_content, max_tokens).await
        }
        Provider::Moonshot => {
            moonshot::send_prd_request(http, api_key, prd_content, max_tokens).await
        }
        Provider::AlibabaDirect => {
            dashscope::send_prd_request(http, model, api_key, prd_content, project_name, max_tokens)
                .await
        }
    }
}

/// Resolve the API key for `model`.
///
/// Qwen models draw from the server-held Alibaba keys by index; the other
/// models use the caller's explicit key, falling back to the stored or
/// environment key for their provider.
pub fn resolve_api_key(
    model: Model,
    explicit: Option<&str>,
    store: &ConfigStore,
    alibaba_keys: &[String],
    alibaba_key_index: usize,
) -> Result<String> {
    if model.requires_server_key() {
        if alibaba_keys.is_empty() {
            return Err(eyre!(
                "Alibaba API keys not configured. Set ALIBABA_API_KEY_1 or create \
                 alibaba-keys.json in the config directory."
            ));
        }
        return alibaba_keys.get(alibaba_key_index).cloned().ok_or_else(|| {
            eyre!(
                "Invalid key index {}. Available: 0-{}",
                alibaba_key_index,
                alibaba_keys.len() - 1
            )
        });
    }

    if let Some(key) = explicit.filter(|key| !key.is_empty() && *key != "built-in") {
        return Ok(key.to_string());
    }

    let keys = store.api_keys_with_env();
    let stored = match model.provider() {
        Provider::Openrouter => keys.openrouter_api_key,
        Provider::Moonshot => keys.moonshot_api_key,
        Provider::AlibabaDirect => String::new(),
    };

    if stored.is_empty() {
        Err(eyre!("Please provide API key for {}", model.key()))
    } else {
        Ok(stored)
    }
}

/// POST a chat request and decode the first choice.
pub async fn post_chat(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
    extra_headers: &[(&str, &str)],
    body: &ChatRequest,
) -> Result<Completion> {
    let mut request = http
        .post(url)
        .bearer_auth(api_key)
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .json(body);

    for (name, value) in extra_headers {
        request = request.header(*name, *value);
    }

    let response = request
        .send()
        .await
        .map_err(|e| eyre!("Failed to reach {}: {}", url, e))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(eyre!("Upstream returned HTTP {}: {}", status, text));
    }

    let decoded: ChatResponse = response
        .json()
        .await
        .map_err(|e| eyre!("Failed to decode completion response: {}", e))?;

    let usage = decoded.usage.unwrap_or_default().into();
    let choice = decoded
        .choices
        .into_iter()
        .next()
        .ok_or_eyre("Completion response contained no choices")?;

    Ok(Completion {
        content: choice.message.content,
        usage,
    })
}
