use serde::{Deserialize, Serialize};

/// JWT claims structure carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    pub sub: String, // Owning user id
    pub exp: usize,  // Expiration timestamp (standard JWT claim)
    pub iat: usize,  // Issued at timestamp (standard JWT claim)
}

/// Authenticated identity attached to the request by the auth middleware.
/// Handlers extract it with `Extension(auth): Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims_serialization() {
        let claims = AccessClaims {
            sub: "user-id".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        // Should serialize to JSON
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("user-id"));
        assert!(json.contains("1234567890"));

        // Should deserialize from JSON
        let deserialized: AccessClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }
}
