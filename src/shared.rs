use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::images::store::ImageStore;
use crate::session::token::TokenConfig;
use crate::story::repository::StoryRepository;
use crate::user::repository::UserRepository;

/// Time source abstraction so `created_on` and token expiry are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Process configuration, read once in `main` and passed down explicitly.
/// Business logic never reads environment variables on its own.
#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub token_secret: String,
    pub uploads_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub public_base_url: String,
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);

        Self {
            bind_addr: format!("0.0.0.0:{}", port),
            token_secret: std::env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            uploads_dir: std::env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            assets_dir: std::env::var("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("assets")),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            database_url: std::env::var("DATABASE_URL").ok(),
        }
    }
}

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub story_repository: Arc<dyn StoryRepository + Send + Sync>,
    pub image_store: Arc<dyn ImageStore + Send + Sync>,
    pub token_config: TokenConfig,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        story_repository: Arc<dyn StoryRepository + Send + Sync>,
        image_store: Arc<dyn ImageStore + Send + Sync>,
        token_config: TokenConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            story_repository,
            image_store,
            token_config,
            clock,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate user: {0}")]
    DuplicateUser(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DuplicateUser(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidCredentials(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Store(msg) => {
                // Store details stay in the logs, never in the response body.
                tracing::error!(error = %msg, "durable store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message
        }));

        (status, body).into_response()
    }
}
