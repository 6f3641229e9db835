// Public API - what other modules can use
pub use middleware::require_auth;
pub use types::{AccessClaims, AuthUser};

// Internal modules
mod middleware;
pub mod token;
mod types;
