use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use cold_core::{
    config::Config,
    db::Db,
    llm::{LlmClient, ModelTable},
    registry::PromptRegistry,
};
use cold_domains::builtin_registry;
use cold_llm::{OpenAiClient, ScriptedLlm};
use tower_http::cors::CorsLayer;
use tracing::info;

mod auth;
mod extract;
mod routes;

// ── AppState ──────────────────────────────────────────────────────────────

pub struct AppState {
    pub db: Arc<Db>,
    pub llm: Arc<dyn LlmClient>,
    pub models: ModelTable,
    pub registry: Arc<PromptRegistry>,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cold_server=info,cold_core=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let mut db = Db::open(&config.db_path)?;
    db.migrate()?;
    let db = Arc::new(db);

    // Select the LLM backend; "scripted" serves schema-shaped placeholders
    // for offline development.
    let llm: Arc<dyn LlmClient> = match config.llm_backend.as_str() {
        "scripted" => Arc::new(ScriptedLlm::with_stub_fallback()),
        _ => Arc::new(OpenAiClient::new(
            &config.openai_base_url,
            &config.openai_api_key,
            config.llm_timeout_secs,
        )),
    };

    let models = config.models();
    let registry = Arc::new(builtin_registry());
    info!(prompts = registry.len(), backend = %config.llm_backend, "prompt registry loaded");

    let addr = format!("{}:{}", config.bind, config.port);

    let state = Arc::new(AppState {
        db,
        llm,
        models,
        registry,
        config: Arc::new(config),
        http: reqwest::Client::new(),
    });

    let app = Router::new()
        // Health
        .route("/health", get(routes::health))
        // Case analyzer
        .route("/case-analyzer/upload", post(routes::upload))
        .route("/case-analyzer/analyze", post(routes::analyze))
        .route("/case-analyzer/draft/:id", get(routes::get_draft))
        .route("/case-analyzer/submit", post(routes::submit))
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
