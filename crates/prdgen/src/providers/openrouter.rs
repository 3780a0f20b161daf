use prdgen_core::model::Model;
use prdgen_core::prompt::build_generation_prompt;

use super::{post_chat, ChatMessage, ChatRequest, Completion};
use crate::prelude::*;

const BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

// OpenRouter attribution headers.
const REFERER: &str = "http://localhost:3000";
const TITLE: &str = "PRD Generator";

/// Send a PRD to Gemini 2.5 Pro via OpenRouter.
pub async fn send_prd_request(
    http: &reqwest::Client,
    api_key: &str,
    prd_content: &str,
    max_tokens: u64,
) -> Result<Completion> {
    let model = Model::Gemini;

    let body = ChatRequest {
        model: model.model_id().to_string(),
        messages: vec![ChatMessage {
            role: "user",
            content: build_generation_prompt(prd_content),
        }],
        temperature: model.temperature(),
        max_tokens,
        stream: false,
        extra_body: None,
    };

    post_chat(
        http,
        BASE_URL,
        api_key,
        &[("HTTP-Referer", REFERER), ("X-Title", TITLE)],
        &body,
    )
    .await
}
