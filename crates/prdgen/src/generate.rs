use std::path::PathBuf;

use chrono::Utc;
use colored::Colorize;
use prdgen_core::model::Model;
use prdgen_core::prd::{self, PrdDocument};
use prdgen_core::{recover, tokens};

use crate::config::ConfigStore;
use crate::prelude::{eprintln, println, *};
use crate::{output, providers};

const PRD_SUMMARY_CHARS: usize = 500;

#[derive(Debug, clap::Parser)]
#[command(name = "generate")]
#[command(about = "Generate a project from one or more PRD files")]
pub struct App {
    /// PRD files to combine into a single prompt
    pub prd_files: Vec<PathBuf>,

    /// PRD text passed inline, used when no files are given
    #[clap(long)]
    pub text: Option<String>,

    /// Model to use (gemini, kimi, qwen, qwen235)
    #[clap(long)]
    pub model: Option<Model>,

    /// Provider API key. Falls back to stored config and environment
    #[clap(long, env = "PRDGEN_API_KEY")]
    pub api_key: Option<String>,

    /// Directory to write the generated project into
    #[clap(long)]
    pub output_dir: Option<String>,

    /// Maximum completion tokens to request
    #[clap(long)]
    pub max_tokens: Option<u64>,

    /// Which server-held Alibaba key to use for Qwen models
    #[clap(long, default_value = "0")]
    pub alibaba_key_index: usize,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let store = ConfigStore::open(global.config_dir()?)?;
    let settings = store.settings();

    let model = match app.model {
        Some(model) => model,
        None => settings
            .selected_model
            .parse::<Model>()
            .map_err(|e| eyre!("Stored model is invalid: {e}"))?,
    };
    let max_tokens = app.max_tokens.unwrap_or(settings.max_tokens);
    let output_dir = app.output_dir.unwrap_or(settings.output_dir);

    let mut documents = Vec::with_capacity(app.prd_files.len());
    for path in &app.prd_files {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        documents.push(PrdDocument { name, content });
    }

    let combined = prd::combine_content(&documents, app.text.as_deref().unwrap_or(""))
        .ok_or_eyre("No PRD content provided; pass files or --text")?;

    let alibaba_keys = store.alibaba_keys();
    let api_key = providers::resolve_api_key(
        model,
        app.api_key.as_deref(),
        &store,
        &alibaba_keys,
        app.alibaba_key_index,
    )?;

    let project_name = prd::derive_project_name(&documents, &combined)
        .unwrap_or_else(|| prd::timestamp_name(Utc::now()));

    let sanitized = output::sanitize_output_dir(&output_dir)?;
    let output_path = output::ensure_output_dir(&sanitized)?;

    if global.verbose {
        eprintln!(
            "Sending {} chars of PRD to {} as '{}'",
            combined.chars().count(),
            model,
            project_name
        );
    }

    let http = reqwest::Client::new();
    let completion =
        providers::send_prd_request(&http, model, &api_key, &combined, &project_name, max_tokens)
            .await?;

    let recovery = recover::recover(&completion.content, &project_name);
    recovery
        .descriptor
        .validate()
        .map_err(|e| eyre!("Model returned no usable project: {e}"))?;
    let written = output::write_project(&output_path, &recovery.descriptor)?;

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
        model: model.key().to_string(),
        provider: model.provider().key().to_string(),
        generation_date: Utc::now().to_rfc3339(),
        input_tokens: estimated_input,
        actual_input_tokens: actual_input,
        output_tokens: usage.output_tokens,
        total_tokens: total,
        files_created: written.files_created.clone(),
        prd_summary: prd::summarize(&combined, PRD_SUMMARY_CHARS),
    };
    output::write_generation_info(&written.project_path, &info)?;

    if let Err(err) = store.add_path(&sanitized) {
        eprintln!("Warning: failed to record output path: {err}");
    }

    println!("\n{}\n", "Generation complete".bold().cyan());
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Project".bold().cyan(),
        written.project_name.bright_white().to_string()
    ]);
    table.add_row(prettytable::row![
        "Written to".bold().cyan(),
        written.project_path.display().to_string()
    ]);
    table.add_row(prettytable::row![
        "Files".bold().cyan(),
        written.files_created.len().to_string()
    ]);
    table.add_row(prettytable::row![
        "Model".bold().cyan(),
        model.display_name()
    ]);
    table.add_row(prettytable::row![
        "Tokens in / out".bold().cyan(),
        format!("{} / {}", actual_input, usage.output_tokens)
    ]);
    table.printstd();

    for file in &written.files_created {
        println!("  {file}");
    }

    if recovery.is_degraded() {
        println!(
            "\n{}",
            "Response could not be parsed as a project; raw output saved to README.md"
                .yellow()
                .bold()
        );
    }
    println!();

    Ok(())
}
