use sqlx::PgPool;

use crate::auth::jwt::JwtService;
use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Chat-completion client built once at startup; its HTTP pool is shared by all requests.
    pub llm: LlmClient,
    pub jwt: JwtService,
    pub config: Config,
}
