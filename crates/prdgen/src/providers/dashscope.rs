use prdgen_core::model::Model;
use prdgen_core::prompt::build_direct_prompt;

use super::{post_chat, ChatMessage, ChatRequest, Completion};
use crate::prelude::*;

const BASE_URL: &str = "https://dashscope-intl.aliyuncs.com/compatible-mode/v1/chat/completions";

const SYSTEM_PROMPT: &str = "\
You are an expert full-stack developer. Convert the PRD (Product Requirements \
Document) into a complete, working codebase.

CRITICAL INSTRUCTIONS:
1. Generate COMPLETE, PRODUCTION-READY code
2. Create ALL necessary files with FULL implementation
3. NO placeholders, NO TODOs, NO comments like \"implement later\"
4. Include proper error handling and validation
5. Follow modern best practices and design patterns

Project structure requirements:
- A well-organized directory structure
- All configuration files (package.json, requirements.txt, etc.)
- A comprehensive README.md with setup instructions
- Example .env files where needed

Format your response as JSON with this structure:
{
    \"project_name\": \"appropriate_project_name\",
    \"files\": [
        {
            \"path\": \"relative/path/to/file.ext\",
            \"content\": \"complete file content here\"
        }
    ]
}";

/// Send a PRD to a Qwen model via the Alibaba DashScope OpenAI-compatible
/// endpoint. Thinking mode is switched on for models that support it.
pub async fn send_prd_request(
    http: &reqwest::Client,
    model: Model,
    api_key: &str,
    prd_content: &str,
    project_name: &str,
    max_tokens: u64,
) -> Result<Completion> {
    let body = ChatRequest {
        model: model.model_id().to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: build_direct_prompt(project_name, prd_content),
            },
        ],
        temperature: model.temperature(),
        max_tokens: max_tokens.min(model.context_window()),
        stream: false,
        extra_body: thinking_extra_body(model),
    };

    post_chat(http, BASE_URL, api_key, &[], &body).await
}

fn thinking_extra_body(model: Model) -> Option<serde_json::Value> {
    model
        .supports_thinking()
        .then(|| serde_json::json!({ "enable_thinking": true }))
}
