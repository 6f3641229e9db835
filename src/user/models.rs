use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the users collection.
///
/// Deliberately not serializable: the password hash must never reach a
/// response body. API-facing shapes live in `types::UserResponse`.
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new user model with a generated id
    pub fn new(
        full_name: String,
        email: String,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            full_name,
            email,
            password_hash,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_model() {
        let user = UserModel::new(
            "Leo".to_string(),
            "leo@x.com".to_string(),
            "$argon2id$hash".to_string(),
            Utc::now(),
        );

        assert!(!user.id.is_empty());
        assert_eq!(user.full_name, "Leo");
        assert_eq!(user.email, "leo@x.com");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = UserModel::new("A".into(), "a@x.com".into(), "h".into(), Utc::now());
        let b = UserModel::new("B".into(), "b@x.com".into(), "h".into(), Utc::now());
        assert_ne!(a.id, b.id);
    }
}
