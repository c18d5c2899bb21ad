pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::auth::handlers as auth;
use crate::cv::handlers as cv;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/me", get(auth::handle_me))
        // CVs
        .route(
            "/api/cvs",
            post(cv::handle_upload_cv)
                .get(cv::handle_list_cvs)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Analyses
        .route(
            "/api/analyses",
            post(analysis::handle_analyze).get(analysis::handle_history),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::jwt::JwtService;
    use crate::config::Config;
    use crate::llm_client::{HttpTransport, LlmClient, DEFAULT_API_URL, DEFAULT_MODEL};

    const SECRET: &str = "router-test-secret";

    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost:1/unused".to_string(),
            jwt_secret: SECRET.to_string(),
            jwt_access_token_minutes: 60,
            hf_api_key: "test".to_string(),
            hf_model: DEFAULT_MODEL.to_string(),
            hf_api_url: DEFAULT_API_URL.to_string(),
            max_upload_bytes: 1024,
            port: 0,
            rust_log: "info".to_string(),
        };
        // never connects unless a handler reaches the database
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let transport = HttpTransport::new(config.hf_api_url.clone(), config.hf_api_key.clone()).unwrap();
        AppState {
            db,
            llm: LlmClient::new(Arc::new(transport), config.hf_model.clone()),
            jwt: JwtService::new(SECRET, 60),
            config,
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "ghosting-api");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        for (method, uri) in [
            ("GET", "/api/cvs"),
            ("GET", "/api/analyses"),
            ("GET", "/api/auth/me"),
        ] {
            let app = build_router(test_state());
            let response = app
                .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_invalid_token_rejected() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_echoes_token_identity() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let token = state.jwt.create_token(user_id, "ada@example.com").unwrap();

        let response = build_router(state)
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["userId"], user_id.to_string());
        assert_eq!(json["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_register_validates_before_touching_db() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::post("/api/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"not-an-email","password":"longenough"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unreadable_docx_upload_is_unprocessable() {
        let state = test_state();
        let token = state.jwt.create_token(Uuid::new_v4(), "ada@example.com").unwrap();

        let boundary = "cvboundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cv.docx\"\r\n\
             Content-Type: application/vnd.openxmlformats-officedocument.wordprocessingml.document\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(b"PK\x03\x04\x14\x00\x06\x00word/document.xml");
        body.extend((0..400u32).map(|i| (i * 37 % 256) as u8));
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let response = build_router(state)
            .oneshot(
                Request::post("/api/cvs")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
