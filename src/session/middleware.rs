use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::types::AuthUser;
use crate::shared::{AppError, AppState};

/// Authentication middleware - validates the Authorization Bearer header and adds AuthUser to the request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), session::require_auth))
/// Handlers can then extract Extension(auth): Extension<AuthUser>.
///
/// This is the single auth enforcement point: no handler behind it re-checks
/// tokens, and no repository operation is reachable without passing it except
/// account creation and login.
#[instrument(skip(state, req, next))]
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::InvalidToken("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::InvalidToken("Invalid authorization header format".to_string())
    })?;

    // Distinguished in the logs; the caller sees 401 either way.
    let user_id = match state.token_config.verify(token) {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!("Token verification failed: {}", e);
            return Err(e);
        }
    };

    debug!(user_id = %user_id, "Authentication successful, adding identity to request");
    req.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(req).await)
}
