#![allow(unused)]

use std::path::PathBuf;

use crate::prelude::*;
use clap::Parser;

mod config;
mod error;
mod estimate;
mod generate;
mod output;
mod prelude;
mod providers;
mod server;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Generate project scaffolding from PRD documents via LLM providers"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Directory holding config files (keys, settings, path history)
    #[clap(long, env = "PRDGEN_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "PRDGEN_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

impl Global {
    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.config_dir {
            Some(dir) => Ok(dir.clone()),
            None => crate::config::ConfigStore::default_dir(),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run the HTTP server backing the web UI
    Serve(crate::server::App),

    /// Generate a project from PRD files on the command line
    Generate(crate::generate::App),

    /// Estimate token usage and cost for PRD files
    Estimate(crate::estimate::App),

    /// Inspect and edit stored configuration
    Config(crate::config::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(sub_app) => crate::server::run(sub_app, app.global).await,
        SubCommands::Generate(sub_app) => crate::generate::run(sub_app, app.global).await,
        SubCommands::Estimate(sub_app) => crate::estimate::run(sub_app, app.global).await,
        SubCommands::Config(sub_app) => crate::config::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
