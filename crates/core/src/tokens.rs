use serde::{Deserialize, Serialize};

use crate::model::Model;

/// Token accounting for one completion call, as reported by the upstream
/// `usage` object. Zeroed when the upstream omits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Cost and capacity estimate for a PRD against one model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateOutput {
    pub content_size: usize,
    pub estimated_tokens: u64,
    /// Context window minus estimated input, capped by the requested
    /// maximum. Negative when the content alone overflows the window.
    pub available_output_tokens: i64,
    pub estimated_input_cost: f64,
    pub model: String,
}

/// Rough token estimate: one token per four characters of text.
///
/// A real tokenizer would be model-specific; this heuristic is close enough
/// for capacity checks and cost previews.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() / 4) as u64
}

/// Build the estimate summary served by the estimation endpoint.
pub fn estimate_for_model(content: &str, model: Model, max_tokens: u64) -> EstimateOutput {
    let estimated = estimate_tokens(content);
    let available = model.context_window() as i64 - estimated as i64;

    EstimateOutput {
        content_size: content.chars().count(),
        estimated_tokens: estimated,
        available_output_tokens: available.min(max_tokens as i64),
        estimated_input_cost: estimated as f64 * model.input_cost_per_token(),
        model: model.key().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_four_chars_per_token() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcdefg"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
    }

    #[test]
    fn test_estimate_for_model_caps_at_requested_max() {
        let content = "x".repeat(400); // 100 tokens
        let output = estimate_for_model(&content, Model::Gemini, 50_000);

        assert_eq!(output.estimated_tokens, 100);
        assert_eq!(output.available_output_tokens, 50_000);
        assert_eq!(output.model, "gemini");
    }

    #[test]
    fn test_estimate_for_model_limited_by_context_window() {
        let content = "x".repeat(400);
        let output = estimate_for_model(&content, Model::Qwen235, 100_000);

        // 32768 - 100, well under the requested 100k.
        assert_eq!(output.available_output_tokens, 32_668);
    }

    #[test]
    fn test_estimate_for_model_negative_when_content_overflows() {
        let content = "x".repeat(4 * 40_000); // 40k tokens against a 32k window
        let output = estimate_for_model(&content, Model::Qwen235, 100_000);

        assert!(output.available_output_tokens < 0);
    }

    #[test]
    fn test_input_cost_scales_with_model_rate() {
        let content = "x".repeat(4_000_000); // 1M tokens
        let gemini = estimate_for_model(&content, Model::Gemini, 1);
        let kimi = estimate_for_model(&content, Model::Kimi, 1);

        assert!((gemini.estimated_input_cost - 0.075).abs() < 1e-9);
        assert!((kimi.estimated_input_cost - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_token_usage_defaults_to_zero() {
        let usage = TokenUsage::default();
        assert_eq!(usage.input_tokens, 0);
        assert_eq!(usage.output_tokens, 0);
        assert_eq!(usage.total_tokens, 0);
    }
}
