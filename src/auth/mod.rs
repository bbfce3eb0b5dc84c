pub mod extractors;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::{CurrentUser, UnitOfWork};
pub use guard::authenticate;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{AuthError, Claims, TokenService};

/// Payload for `POST /register`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address for the new account. Stored exactly as given.
    #[validate(email)]
    pub email: String,
    /// Plain-text password. Only its bcrypt hash is kept.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Payload for `POST /token`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response structure after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed bearer token.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
