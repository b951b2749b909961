use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the username that signed in.
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Why an incoming token was rejected. Only ever logged; callers see one generic 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Undecodable, wrongly signed, or missing required claims.
    Malformed,
    /// Signature is fine but `exp` has passed.
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed"),
            TokenError::Expired => write!(f, "expired"),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

/// Issues and validates HS256 bearer tokens whose subject is a username.
///
/// The lifetime is fixed when the service is built; callers cannot pick a TTL per token.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expired means expired; no grace period.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Generates a token for `username`, valid for the configured TTL from now.
    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let exp = now
            .checked_add(self.ttl_secs)
            .ok_or_else(|| AppError::InternalServerError("Token lifetime overflows".into()))?;
        let claims = Claims {
            sub: username.to_string(),
            iat: now as usize,
            exp: exp as usize,
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Verifies signature and expiry and returns the trusted username.
    ///
    /// The subject is not checked against the user store here.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}
