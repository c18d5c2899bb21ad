use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_API_URL, DEFAULT_MODEL};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_access_token_minutes: i64,
    pub hf_api_key: String,
    pub hf_model: String,
    pub hf_api_url: String,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_access_token_minutes: parse_env("JWT_ACCESS_TOKEN_MINUTES", 60)?,
            hf_api_key: require_env("HF_API_KEY")?,
            hf_model: std::env::var("HF_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            hf_api_url: std::env::var("HF_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default_when_unset() {
        let value: u16 = parse_env("GHOSTING_API_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(value, 8080);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("GHOSTING_API_TEST_BAD_MINUTES", "sixty");
        let result: Result<i64> = parse_env("GHOSTING_API_TEST_BAD_MINUTES", 60);
        assert!(result.is_err());
        std::env::remove_var("GHOSTING_API_TEST_BAD_MINUTES");
    }

    #[test]
    fn test_parse_env_reads_trimmed_value() {
        std::env::set_var("GHOSTING_API_TEST_UPLOAD", " 2048 ");
        let value: usize = parse_env("GHOSTING_API_TEST_UPLOAD", 1).unwrap();
        assert_eq!(value, 2048);
        std::env::remove_var("GHOSTING_API_TEST_UPLOAD");
    }
}
