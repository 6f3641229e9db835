use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Trait for user credential persistence
#[async_trait]
pub trait UserRepository {
    /// Inserts a new user. Fails with `DuplicateUser` if the email is taken.
    async fn insert(&self, user: &UserModel) -> Result<(), AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserModel>, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Data is stored in memory and lost when the process exits. Email
/// uniqueness is enforced the same way the Postgres implementation does.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn insert(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, "Creating user in memory");

        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            warn!(user_id = %user.id, "Email already registered");
            return Err(AppError::DuplicateUser("User already exists".to_string()));
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, "User created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(user_id).cloned())
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserModel {
    UserModel {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn insert(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, "Creating user in database");

        sqlx::query(
            "INSERT INTO users (id, full_name, email, password_hash, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                warn!(user_id = %user.id, "Email already registered");
                AppError::DuplicateUser("User already exists".to_string())
            } else {
                warn!(error = %e, "Failed to create user in database");
                AppError::Store(e.to_string())
            }
        })?;

        debug!(user_id = %user.id, "User created successfully in database");
        Ok(())
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, full_name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by email from database");
            AppError::Store(e.to_string())
        })?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, full_name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "Failed to fetch user from database");
            AppError::Store(e.to_string())
        })?;

        Ok(row.as_ref().map(user_from_row))
    }
}
