use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::types::AccessClaims;
use crate::shared::{AppError, Clock};

/// Session tokens expire a fixed 72 hours after issuance.
const TOKEN_TTL_HOURS: i64 = 72;

/// Configuration for session token operations.
///
/// The signing secret is loaded once at process start and passed in here;
/// nothing outside this module encodes or decodes tokens.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    clock: Arc<dyn Clock>,
}

impl TokenConfig {
    pub fn new(secret: String, clock: Arc<dyn Clock>) -> Self {
        Self { secret, clock }
    }

    /// Issues a signed token for the given user id with an absolute expiry.
    #[instrument(skip(self, user_id))]
    pub fn issue(&self, user_id: &str) -> Result<String, AppError> {
        let now = self.clock.now();
        let exp = (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;

        let claims = AccessClaims {
            sub: user_id.to_string(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode session token");
            AppError::Store("failed to sign session token".to_string())
        })
    }

    /// Verifies signature and structure, then checks the absolute expiry
    /// against the injected clock. Every call re-checks the expiry; there is
    /// no sliding window and no grace period.
    #[instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        // The library's exp check reads the system clock; disable it so the
        // injected clock is the only time authority.
        let mut validation = Validation::default();
        validation.validate_exp = false;

        let data = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to decode session token");
            AppError::InvalidToken("Invalid session token".to_string())
        })?;

        let claims = data.claims;
        if self.clock.now().timestamp() >= claims.exp as i64 {
            debug!(user_id = %claims.sub, exp = claims.exp, "Session token expired");
            return Err(AppError::InvalidToken("Session token expired".to_string()));
        }

        Ok(claims.sub)
    }
}
