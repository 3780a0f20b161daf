mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ConfigStore;
use crate::prelude::{eprintln, *};

#[derive(Debug, clap::Parser)]
#[command(name = "serve")]
#[command(about = "Run the PRD generation HTTP server")]
pub struct App {
    /// Host to bind
    #[clap(long, env = "PRDGEN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[clap(long, env = "PRDGEN_PORT", default_value = "5000")]
    pub port: u16,
}

/// Shared state handed to every request handler. Built once at startup;
/// there is no global configuration singleton.
pub struct AppState {
    pub config: ConfigStore,
    pub alibaba_keys: Vec<String>,
    pub http: reqwest::Client,
    pub verbose: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = ConfigStore::open(global.config_dir()?)?;

    let alibaba_keys = config.alibaba_keys();
    if alibaba_keys.is_empty() {
        eprintln!("Warning: no Alibaba API keys configured; Qwen models will be rejected");
    }

    let state = Arc::new(AppState {
        config,
        alibaba_keys,
        http: reqwest::Client::new(),
        verbose: global.verbose,
    });

    let addr = format!("{}:{}", app.host, app.port);

    if global.verbose {
        eprintln!("prdgen server listening on http://{}", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    axum::serve(listener, router(state))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/config/keys",
            get(routes::get_keys).post(routes::save_keys),
        )
        .route(
            "/api/config/settings",
            get(routes::get_settings).post(routes::save_settings),
        )
        .route(
            "/api/config/paths",
            get(routes::get_paths).post(routes::add_path),
        )
        .route("/api/config/paths/remove", post(routes::remove_path))
        .route("/api/config/clear", post(routes::clear_config))
        .route("/api/generate", post(routes::generate))
        .route("/api/estimate", post(routes::estimate))
        .layer(cors)
        .with_state(state)
}
