use serde::{Deserialize, Serialize};

/// Upstream service that hosts a generation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Openrouter,
    Moonshot,
    /// Alibaba Cloud Model Studio (DashScope), OpenAI-compatible endpoint.
    AlibabaDirect,
}

impl Provider {
    pub fn key(&self) -> &'static str {
        match self {
            Provider::Openrouter => "openrouter",
            Provider::Moonshot => "moonshot",
            Provider::AlibabaDirect => "alibaba_direct",
        }
    }
}

/// Generation model selectable by callers.
///
/// The wire keys (`gemini`, `kimi`, `qwen`, `qwen235`) are the stable API
/// surface; everything else about a model hangs off this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    /// Gemini 2.5 Pro via OpenRouter. Large context, fast.
    Gemini,
    /// Kimi K2 via Moonshot AI. Tuned for agent systems.
    Kimi,
    /// Qwen-Plus via Alibaba direct. Supports thinking mode.
    Qwen,
    /// Qwen-Max via Alibaba direct. Flagship, smaller context.
    Qwen235,
}

impl Model {
    pub fn key(&self) -> &'static str {
        match self {
            Model::Gemini => "gemini",
            Model::Kimi => "kimi",
            Model::Qwen => "qwen",
            Model::Qwen235 => "qwen235",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Model::Gemini => "Gemini 2.5 Pro",
            Model::Kimi => "Kimi K2",
            Model::Qwen => "Qwen-Plus",
            Model::Qwen235 => "Qwen-Max",
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Model::Gemini => Provider::Openrouter,
            Model::Kimi => Provider::Moonshot,
            Model::Qwen | Model::Qwen235 => Provider::AlibabaDirect,
        }
    }

    /// Upstream model identifier sent on the wire.
    pub fn model_id(&self) -> &'static str {
        match self {
            Model::Gemini => "google/gemini-2.5-pro",
            Model::Kimi => "kimi",
            Model::Qwen => "qwen-plus-2025-04-28",
            Model::Qwen235 => "qwen-max-2025-01-25",
        }
    }

    /// Total context window in tokens.
    pub fn context_window(&self) -> u64 {
        match self {
            Model::Gemini => 2_000_000,
            Model::Kimi => 128_000,
            Model::Qwen => 131_072,
            Model::Qwen235 => 32_768,
        }
    }

    /// Recommended sampling temperature.
    pub fn temperature(&self) -> f64 {
        match self {
            Model::Gemini => 0.7,
            Model::Kimi | Model::Qwen | Model::Qwen235 => 0.6,
        }
    }

    /// USD cost per input token.
    pub fn input_cost_per_token(&self) -> f64 {
        match self {
            // $0.075 per 1M tokens
            Model::Gemini => 0.075 / 1_000_000.0,
            // $0.15 per 1M tokens
            Model::Kimi => 0.15 / 1_000_000.0,
            // $0.10 per 1M tokens, estimated
            Model::Qwen | Model::Qwen235 => 0.10 / 1_000_000.0,
        }
    }

    /// Whether the model accepts the DashScope thinking-mode switch.
    pub fn supports_thinking(&self) -> bool {
        matches!(self, Model::Qwen)
    }

    /// Qwen models use server-held Alibaba keys rather than a caller key.
    pub fn requires_server_key(&self) -> bool {
        matches!(self, Model::Qwen | Model::Qwen235)
    }

    pub fn all() -> [Model; 4] {
        [Model::Gemini, Model::Kimi, Model::Qwen, Model::Qwen235]
    }
}

impl std::str::FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemini" => Ok(Model::Gemini),
            "kimi" => Ok(Model::Kimi),
            "qwen" => Ok(Model::Qwen),
            "qwen235" => Ok(Model::Qwen235),
            other => Err(format!(
                "unknown model: {other} (expected gemini, kimi, qwen, or qwen235)"
            )),
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_round_trips_keys() {
        for model in Model::all() {
            assert_eq!(model.key().parse::<Model>(), Ok(model));
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("gpt5".parse::<Model>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_keys() {
        assert_eq!(serde_json::to_string(&Model::Qwen235).unwrap(), "\"qwen235\"");
        let parsed: Model = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(parsed, Model::Gemini);
    }

    #[test]
    fn test_provider_mapping() {
        assert_eq!(Model::Gemini.provider(), Provider::Openrouter);
        assert_eq!(Model::Kimi.provider(), Provider::Moonshot);
        assert_eq!(Model::Qwen.provider(), Provider::AlibabaDirect);
        assert_eq!(Model::Qwen235.provider(), Provider::AlibabaDirect);
    }

    #[test]
    fn test_only_qwen_plus_supports_thinking() {
        assert!(Model::Qwen.supports_thinking());
        assert!(!Model::Qwen235.supports_thinking());
        assert!(!Model::Kimi.supports_thinking());
    }

    #[test]
    fn test_provider_key_strings() {
        assert_eq!(Provider::AlibabaDirect.key(), "alibaba_direct");
    }
}
