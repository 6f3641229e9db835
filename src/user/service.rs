use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::models::UserModel;
use super::repository::UserRepository;
use crate::shared::{AppError, Clock};

/// Service owning user identity: registration, authentication, lookup.
///
/// Stores Argon2id hashes only; the plaintext password never leaves these
/// functions and is never logged. Token minting is the token module's job,
/// handlers call it after these operations succeed.
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    #[instrument(skip(self, full_name, email, password))]
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserModel, AppError> {
        if full_name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("All fields are required".to_string()));
        }

        if self.repository.find_by_email(email).await?.is_some() {
            warn!("Registration attempt with an already registered email");
            return Err(AppError::DuplicateUser("User already exists".to_string()));
        }

        let password_hash = hash_password(password)?;
        let user = UserModel::new(
            full_name.to_string(),
            email.to_string(),
            password_hash,
            self.clock.now(),
        );

        self.repository.insert(&user).await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    #[instrument(skip(self, email, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserModel, AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        verify_password(password, &user.password_hash)?;

        info!(user_id = %user.id, "User authenticated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, user_id: &str) -> Result<UserModel, AppError> {
        self.repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

/// Hash a password using Argon2id with a fresh random salt.
fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Store("failed to hash password".to_string()))
}

/// Verify a password against a stored PHC hash string.
fn verify_password(password: &str, hash: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::InvalidCredentials("Invalid credentials".to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials("Invalid credentials".to_string()))
}
