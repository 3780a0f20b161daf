use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use prdgen_core::model::Model;
use prdgen_core::prd::{self, PrdDocument};
use prdgen_core::{recover, tokens};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::config::{ApiKeysUpdate, SettingsUpdate};
use crate::error::Error;
use crate::prelude::eprintln;
use crate::{output, providers};

const PRD_SUMMARY_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: Model,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub prd_text: String,
    #[serde(default)]
    pub prd_files: Vec<PrdDocument>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
    #[serde(default)]
    pub alibaba_key_index: usize,
}

fn default_model() -> Model {
    Model::Kimi
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_max_tokens() -> u64 {
    100_000
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub project_name: String,
    pub output_path: String,
    pub files_created: usize,
    pub files: Vec<String>,
    /// True when the response could not be parsed as a project descriptor
    /// and the raw model output was written to a single README instead.
    pub degraded: bool,
    pub token_info: TokenInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub estimated_input: u64,
    pub actual_input: u64,
    pub output: u64,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_model")]
    pub model: Model,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub struct PathRequest {
    #[serde(default)]
    pub path: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "prdgen" }))
}

pub async fn get_keys(State(state): State<Arc<AppState>>) -> Json<Value> {
    let keys = state.config.api_keys_with_env();
    Json(json!({
        "openrouter_api_key": keys.openrouter_api_key,
        "moonshot_api_key": keys.moonshot_api_key,
    }))
}

pub async fn save_keys(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ApiKeysUpdate>,
) -> Result<Json<Value>, Error> {
    state
        .config
        .save_api_keys(update)
        .map_err(|e| Error::Config(e.to_string()))?;
    Ok(Json(json!({ "success": true })))
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Value> {
    let settings = state.config.settings();
    Json(json!(settings))
}

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Value>, Error> {
    state
        .config
        .save_settings(update)
        .map_err(|e| Error::Config(e.to_string()))?;
    Ok(Json(json!({ "success": true })))
}

pub async fn get_paths(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "recentPaths": state.config.path_history() }))
}

pub async fn add_path(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PathRequest>,
) -> Result<Json<Value>, Error> {
    state
        .config
        .add_path(&req.path)
        .map_err(|e| Error::Config(e.to_string()))?;
    Ok(Json(json!({
        "success": true,
        "recentPaths": state.config.path_history(),
    })))
}

pub async fn remove_path(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PathRequest>,
) -> Result<Json<Value>, Error> {
    state
        .config
        .remove_path(&req.path)
        .map_err(|e| Error::Config(e.to_string()))?;
    Ok(Json(json!({
        "success": true,
        "recentPaths": state.config.path_history(),
    })))
}

pub async fn clear_config(State(state): State<Arc<AppState>>) -> Result<Json<Value>, Error> {
    state
        .config
        .clear_all()
        .map_err(|e| Error::Config(e.to_string()))?;
    Ok(Json(json!({ "success": true })))
}

pub async fn estimate(Json(req): Json<EstimateRequest>) -> Json<tokens::EstimateOutput> {
    Json(tokens::estimate_for_model(
        &req.content,
        req.model,
        req.max_tokens,
    ))
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, Error> {
    let combined = prd::combine_content(&req.prd_files, &req.prd_text)
        .ok_or_else(|| Error::BadRequest("No PRD content provided".to_string()))?;

    let output_dir = output::sanitize_output_dir(&req.output_dir)?;
    let output_path = output::ensure_output_dir(&output_dir)?;

    let explicit = (!req.api_key.is_empty()).then_some(req.api_key.as_str());
    let api_key = providers::resolve_api_key(
        req.model,
        explicit,
        &state.config,
        &state.alibaba_keys,
        req.alibaba_key_index,
    )
    .map_err(|e| Error::BadRequest(e.to_string()))?;

    let project_name = prd::derive_project_name(&req.prd_files, &combined)
        .unwrap_or_else(|| prd::timestamp_name(Utc::now()));

    if state.verbose {
        eprintln!(
            "Generating '{}' with {} ({} chars of PRD)",
            project_name,
            req.model,
            combined.chars().count()
        );
    }

    let completion = providers::send_prd_request(
        &state.http,
        req.model,
        &api_key,
        &combined,
        &project_name,
        req.max_tokens,
    )
    .await
    .map_err(|e| Error::Upstream(e.to_string()))?;

    let recovery = recover::recover(&completion.content, &project_name);
    recovery
        .descriptor
        .validate()
        .map_err(|e| Error::Upstream(format!("Model returned no usable project: {e}")))?;

    if state.verbose {
        eprintln!(
            "Recovered {} file(s) via {:?} stage",
            recovery.descriptor.files.len(),
            recovery.stage
        );
    }

    let written = output::write_project(&output_path, &recovery.descriptor)
        .map_err(|e| Error::Config(e.to_string()))?;

    let estimated_input = tokens::estimate_tokens(&combined);
    let usage = &completion.usage;
    let actual_input = if usage.input_tokens > 0 {
        usage.input_tokens
    } else {
        estimated_input
    };
    let total = if usage.total_tokens > 0 {
        usage.total_tokens
    } else {
        actual_input + usage.output_tokens
    };

    let info = output::GenerationInfo {
        project_name: written.project_name.clone(),
        model: req.model.key().to_string(),
        provider: req.model.provider().key().to_string(),
        generation_date: Utc::now().to_rfc3339(),
        input_tokens: estimated_input,
        actual_input_tokens: actual_input,
        output_tokens: usage.output_tokens,
        total_tokens: total,
        files_created: written.files_created.clone(),
        prd_summary: prd::summarize(&combined, PRD_SUMMARY_CHARS),
    };
    output::write_generation_info(&written.project_path, &info)
        .map_err(|e| Error::Config(e.to_string()))?;

    // Remember the output directory for the path-history dropdown. A
    // history write failure should not fail a completed generation.
    if let Err(err) = state.config.add_path(&output_dir) {
        eprintln!("Warning: failed to record output path: {err}");
    }

    Ok(Json(GenerateResponse {
        success: true,
        project_name: written.project_name,
        output_path: written.project_path.display().to_string(),
        files_created: written.files_created.len(),
        files: written.files_created,
        degraded: recovery.is_degraded(),
        token_info: TokenInfo {
            estimated_input,
            actual_input,
            output: usage.output_tokens,
            total,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_defaults() {
        let req: GenerateRequest = serde_json::from_str(r#"{"prdText": "Build a thing"}"#)
            .expect("minimal request should deserialize");

        assert_eq!(req.model, Model::Kimi);
        assert_eq!(req.output_dir, "output");
        assert_eq!(req.max_tokens, 100_000);
        assert_eq!(req.alibaba_key_index, 0);
        assert!(req.api_key.is_empty());
        assert!(req.prd_files.is_empty());
        assert_eq!(req.prd_text, "Build a thing");
    }

    #[test]
    fn test_generate_request_full() {
        let req: GenerateRequest = serde_json::from_str(
            r##"{
                "apiKey": "sk-test",
                "model": "qwen",
                "outputDir": "/tmp/projects",
                "prdFiles": [{"name": "billing.md", "content": "# App"}],
                "maxTokens": 32000,
                "alibabaKeyIndex": 2
            }"##,
        )
        .expect("full request should deserialize");

        assert_eq!(req.api_key, "sk-test");
        assert_eq!(req.model, Model::Qwen);
        assert_eq!(req.output_dir, "/tmp/projects");
        assert_eq!(req.prd_files.len(), 1);
        assert_eq!(req.prd_files[0].name, "billing.md");
        assert_eq!(req.max_tokens, 32_000);
        assert_eq!(req.alibaba_key_index, 2);
    }

    #[test]
    fn test_estimate_request_defaults() {
        let req: EstimateRequest =
            serde_json::from_str(r#"{"content": "hello"}"#).expect("should deserialize");

        assert_eq!(req.content, "hello");
        assert_eq!(req.model, Model::Kimi);
        assert_eq!(req.max_tokens, 100_000);
    }

    #[test]
    fn test_generate_response_shape() {
        let response = GenerateResponse {
            success: true,
            project_name: "demo".to_string(),
            output_path: "/tmp/output/demo".to_string(),
            files_created: 2,
            files: vec!["app.py".to_string(), "README.md".to_string()],
            degraded: false,
            token_info: TokenInfo {
                estimated_input: 100,
                actual_input: 120,
                output: 500,
                total: 620,
            },
        };

        let value = serde_json::to_value(&response).expect("should serialize");
        assert_eq!(value["projectName"], "demo");
        assert_eq!(value["filesCreated"], 2);
        assert_eq!(value["degraded"], false);
        assert_eq!(value["tokenInfo"]["actualInput"], 120);
    }
}
