use serde::{Deserialize, Serialize};

use super::models::UserModel;

/// Request body for POST /create-account.
/// Fields are optional so missing values surface as validation errors
/// rather than deserialization rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for POST /login
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public-facing user representation. The password hash never appears here.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

impl From<&UserModel> for UserResponse {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Response for successful registration and login
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub error: bool,
    pub message: String,
    pub user: UserResponse,
    pub access_token: String,
}

/// Response for GET /get-user
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user: UserResponse,
    pub message: String,
}
