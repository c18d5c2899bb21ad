mod analysis;
mod auth;
mod config;
mod cv;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::jwt::JwtService;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{HttpTransport, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ghosting-api v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (migrations run inside create_pool)
    let db = create_pool(&config.database_url).await?;

    let transport = HttpTransport::new(config.hf_api_url.clone(), config.hf_api_key.clone())?;
    let llm = LlmClient::new(Arc::new(transport), config.hf_model.clone());
    info!("LLM client initialized (model: {})", llm.model());

    let jwt = JwtService::new(&config.jwt_secret, config.jwt_access_token_minutes);

    let state = AppState {
        db,
        llm,
        jwt,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
