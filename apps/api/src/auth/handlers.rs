use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&req.email);
    validate_registration(&email, &req.password)?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1)")
            .bind(&email)
            .fetch_one(&state.db)
            .await?;
    if exists {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = hash_password_blocking(req.password).await?;
    let user_id = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(&email)
        .bind(&password_hash)
        .execute(&state.db)
        .await
        .map_err(|e| match e.as_database_error() {
            // lost a race with a concurrent registration
            Some(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Email is already registered".to_string())
            }
            _ => AppError::Database(e),
        })?;

    info!("Registered user {user_id}");

    let access_token = state.jwt.create_token(user_id, &email)?;
    Ok(Json(AuthResponse { access_token }))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&req.email);

    let user: Option<UserRow> =
        sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = $1")
            .bind(&email)
            .fetch_optional(&state.db)
            .await?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized);
    };
    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        return Err(AppError::Unauthorized);
    }

    let access_token = state.jwt.create_token(user.id, &user.email)?;
    Ok(Json(AuthResponse { access_token }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: String,
}

/// GET /api/auth/me
pub async fn handle_me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id,
        email: user.email,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(email: &str, password: &str) -> Result<(), AppError> {
    let valid_email = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && !domain.is_empty())
        .unwrap_or(false);
    if !valid_email {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration("ada@example.com", "longenough").is_ok());
        assert!(validate_registration("ada.example.com", "longenough").is_err());
        assert!(validate_registration("@example.com", "longenough").is_err());
        assert!(validate_registration("ada@", "longenough").is_err());
        assert!(validate_registration("ada@example.com", "short").is_err());
    }

    #[test]
    fn test_auth_response_wire_name() {
        let body = serde_json::to_value(AuthResponse {
            access_token: "t".to_string(),
        })
        .unwrap();
        assert_eq!(body["accessToken"], "t");
    }
}
