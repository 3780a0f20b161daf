use prdgen_core::model::Model;
use prdgen_core::prompt::build_generation_prompt;
use prdgen_core::tokens::estimate_tokens;

use super::{post_chat, ChatMessage, ChatRequest, Completion};
use crate::prelude::*;

const BASE_URL: &str = "https://api.moonshot.cn/v1/chat/completions";

const SYSTEM_PROMPT: &str = "\
You are Kimi, an AI assistant created by Moonshot AI. You are an expert \
software developer who creates complete, production-ready code based on \
requirements. You always respond with valid JSON containing the complete \
project structure and all file contents.";

/// Headroom reserved for the prompt scaffolding around the PRD.
const PROMPT_RESERVE_TOKENS: u64 = 1_000;

/// Send a PRD to Kimi K2 via Moonshot AI.
pub async fn send_prd_request(
    http: &reqwest::Client,
    api_key: &str,
    prd_content: &str,
    max_tokens: u64,
) -> Result<Completion> {
    let model = Model::Kimi;

    let body = ChatRequest {
        model: model.model_id().to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: build_generation_prompt(prd_content),
            },
        ],
        temperature: model.temperature(),
        max_tokens: clamp_max_tokens(prd_content, max_tokens),
        stream: false,
        extra_body: None,
    };

    post_chat(http, BASE_URL, api_key, &[], &body).await
}

/// Cap the requested output budget so input plus output fits the context
/// window, with headroom for the prompt scaffolding.
fn clamp_max_tokens(prd_content: &str, requested: u64) -> u64 {
    let reserve = estimate_tokens(prd_content) + PROMPT_RESERVE_TOKENS;
    requested.min(Model::Kimi.context_window().saturating_sub(reserve))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_prd_keeps_requested_budget() {
        assert_eq!(clamp_max_tokens("tiny", 50_000), 50_000);
    }

    #[test]
    fn test_large_prd_shrinks_budget() {
        // 100k tokens of PRD against a 128k window leaves 27k for output.
        let prd = "x".repeat(400_000);
        assert_eq!(clamp_max_tokens(&prd, 100_000), 27_000);
    }

    #[test]
    fn test_oversized_prd_goes_to_zero_not_underflow() {
        let prd = "x".repeat(4 * 200_000);
        assert_eq!(clamp_max_tokens(&prd, 100_000), 0);
    }
}
