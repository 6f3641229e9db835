use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::service::UserService;
use super::types::{AuthResponse, CurrentUserResponse, LoginRequest, RegisterRequest};
use crate::session::AuthUser;
use crate::shared::{AppError, AppState};

fn user_service(state: &AppState) -> UserService {
    UserService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.clock),
    )
}

/// POST /create-account
///
/// Registers a user and returns the public profile plus a fresh session
/// token. The token is minted here, after the credential store succeeds.
#[instrument(name = "create_account", skip(state, payload))]
pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let service = user_service(&state);
    let user = service
        .register(
            payload.full_name.as_deref().unwrap_or(""),
            payload.email.as_deref().unwrap_or(""),
            payload.password.as_deref().unwrap_or(""),
        )
        .await?;

    let access_token = state.token_config.issue(&user.id)?;

    info!(user_id = %user.id, "Account created");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            error: false,
            message: "Registration successful".to_string(),
            user: (&user).into(),
            access_token,
        }),
    ))
}

/// POST /login
///
/// Every login failure the caller can cause — missing fields, unknown
/// email, wrong password — comes back as 400.
#[instrument(name = "login", skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let service = user_service(&state);
    let user = service
        .authenticate(
            payload.email.as_deref().unwrap_or(""),
            payload.password.as_deref().unwrap_or(""),
        )
        .await
        .map_err(|e| match e {
            AppError::NotFound(msg) | AppError::InvalidCredentials(msg) => {
                AppError::Validation(msg)
            }
            other => other,
        })?;

    let access_token = state.token_config.issue(&user.id)?;

    info!(user_id = %user.id, "Login successful");
    Ok(Json(AuthResponse {
        error: false,
        message: "Login successful".to_string(),
        user: (&user).into(),
        access_token,
    }))
}

/// GET /get-user
///
/// A verified token whose user has since been removed is treated as
/// unauthorized, not as a missing resource.
#[instrument(name = "get_user", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<CurrentUserResponse>, AppError> {
    let service = user_service(&state);
    let user = service.get_by_id(&auth.user_id).await.map_err(|e| match e {
        AppError::NotFound(_) => AppError::InvalidToken("Token user no longer exists".to_string()),
        other => other,
    })?;

    Ok(Json(CurrentUserResponse {
        user: (&user).into(),
        message: String::new(),
    }))
}
