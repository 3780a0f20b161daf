pub mod store;

pub use store::{ApiKeys, ApiKeysUpdate, ConfigStore, PathHistory, Settings, SettingsUpdate};

use colored::Colorize;

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "config")]
#[command(about = "Inspect and edit stored configuration")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Show stored settings, key status, and recent output paths
    #[clap(name = "show")]
    Show,

    /// Store a provider API key
    #[clap(name = "set-key")]
    SetKey(SetKeyOptions),

    /// Reset all configuration files to their defaults
    #[clap(name = "clear")]
    Clear,
}

#[derive(Debug, clap::Parser)]
pub struct SetKeyOptions {
    /// Provider the key belongs to (openrouter or moonshot)
    pub provider: String,

    /// The key value
    pub value: String,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let store = ConfigStore::open(global.config_dir()?)?;

    match app.command {
        Commands::Show => show(&store),
        Commands::SetKey(options) => set_key(&store, options),
        Commands::Clear => {
            store.clear_all()?;
            println!("Configuration reset to defaults");
            Ok(())
        }
    }
}

fn show(store: &ConfigStore) -> Result<()> {
    let settings = store.settings();
    let keys = store.api_keys_with_env();

    println!("\n{}\n", "Settings".bold().cyan());
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Model".bold().cyan(),
        settings.selected_model.bright_white().to_string()
    ]);
    table.add_row(prettytable::row![
        "Max tokens".bold().cyan(),
        settings.max_tokens.to_string()
    ]);
    table.add_row(prettytable::row![
        "Temperature".bold().cyan(),
        settings.temperature.to_string()
    ]);
    table.add_row(prettytable::row![
        "Output dir".bold().cyan(),
        settings.output_dir
    ]);
    table.printstd();

    println!("\n{}\n", "API keys".bold().cyan());
    let mut table = new_table();
    table.add_row(prettytable::row![
        "OpenRouter".bold().cyan(),
        key_status(&keys.openrouter_api_key)
    ]);
    table.add_row(prettytable::row![
        "Moonshot".bold().cyan(),
        key_status(&keys.moonshot_api_key)
    ]);
    table.add_row(prettytable::row![
        "Alibaba".bold().cyan(),
        if store.alibaba_keys().is_empty() {
            "not set".bright_black().to_string()
        } else {
            format!("{} key(s)", store.alibaba_keys().len())
                .green()
                .to_string()
        }
    ]);
    table.printstd();

    let paths = store.path_history();
    if !paths.is_empty() {
        println!("\n{}\n", "Recent output paths".bold().cyan());
        for path in paths {
            println!("  {path}");
        }
    }
    println!();

    Ok(())
}

fn key_status(key: &str) -> String {
    if key.is_empty() {
        "not set".bright_black().to_string()
    } else {
        "set".green().to_string()
    }
}

fn set_key(store: &ConfigStore, options: SetKeyOptions) -> Result<()> {
    let update = match options.provider.as_str() {
        "openrouter" => ApiKeysUpdate {
            openrouter_api_key: Some(options.value),
            ..Default::default()
        },
        "moonshot" => ApiKeysUpdate {
            moonshot_api_key: Some(options.value),
            ..Default::default()
        },
        other => {
            return Err(eyre!(
                "Unknown provider: {other} (expected openrouter or moonshot)"
            ))
        }
    };

    store.save_api_keys(update)?;
    println!("Key saved for {}", options.provider);
    Ok(())
}
