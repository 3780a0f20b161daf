use std::path::PathBuf;

use colored::Colorize;
use prdgen_core::model::Model;
use prdgen_core::tokens;

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "estimate")]
#[command(about = "Estimate token usage and cost for PRD files")]
pub struct App {
    /// PRD files to measure
    #[clap(required = true)]
    pub prd_files: Vec<PathBuf>,

    /// Only show a single model instead of the whole catalog
    #[clap(long)]
    pub model: Option<Model>,

    /// Maximum completion tokens the generation would request
    #[clap(long, default_value = "100000")]
    pub max_tokens: u64,
}

pub async fn run(app: App, _global: crate::Global) -> Result<()> {
    let mut content = String::new();
    for path in &app.prd_files {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        content.push_str(&text);
        content.push('\n');
    }

    let models: Vec<Model> = match app.model {
        Some(model) => vec![model],
        None => Model::all().to_vec(),
    };

    println!("\n{}\n", "Token estimate".bold().cyan());
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Model".bold().cyan(),
        "Input tokens".bold().cyan(),
        "Available output".bold().cyan(),
        "Input cost".bold().cyan()
    ]);

    for model in models {
        let estimate = tokens::estimate_for_model(&content, model, app.max_tokens);
        let available = if estimate.available_output_tokens < 0 {
            "over context".red().to_string()
        } else {
            estimate.available_output_tokens.to_string()
        };
        table.add_row(prettytable::row![
            model.display_name(),
            estimate.estimated_tokens.to_string(),
            available,
            format!("${:.6}", estimate.estimated_input_cost)
        ]);
    }
    table.printstd();
    println!();

    Ok(())
}
