pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{PasswordHasher, MAX_PASSWORD_BYTES};
pub use token::{Claims, TokenError, TokenService};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Payload for both registration and login.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CredentialsRequest {
    /// Must be between 3 and 32 characters, alphanumeric, and can include underscores or hyphens.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    /// At least 6 characters and at most 72 bytes once UTF-8 encoded.
    #[validate(length(min = 6), custom = "validate_password_bytes")]
    pub password: String,
}

/// bcrypt only reads the first 72 bytes, so the limit is on bytes, not characters.
pub fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let mut error = ValidationError::new("password_too_long");
        error.message = Some("Password must be at most 72 bytes".into());
        return Err(error);
    }
    Ok(())
}

/// Response to a successful registration. Registration does not log the user in.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

/// Response to a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The bearer token to send as `Authorization: Bearer <token>`.
    pub access_token: String,
}
