use bcrypt::hash_with_salt;
use rand::{rngs::OsRng, RngCore};

use crate::error::AppError;

/// Number of random bytes in a salt. bcrypt takes exactly 16.
const SALT_BYTES: usize = 16;

/// bcrypt silently ignores input past this many bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Salted password hashing backed by bcrypt.
///
/// The salt is generated here and stored next to the hash rather than only
/// inside it, so hashing is a pure function of `(password, salt)`.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Fresh random salt, hex encoded.
    pub fn generate_salt(&self) -> String {
        let mut bytes = [0u8; SALT_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Passwords over `MAX_PASSWORD_BYTES` are refused rather than truncated.
    pub fn hash(&self, password: &str, salt: &str) -> Result<String, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::ValidationError(format!(
                "Password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        hash_with_cost(password, salt, self.cost)
    }

    /// Recomputes the hash with the cost recorded in `expected_hash` and compares
    /// in constant time. Changing the configured cost does not invalidate old hashes.
    ///
    /// A password over `MAX_PASSWORD_BYTES` never matches, even if its first 72
    /// bytes are those of the stored one.
    pub fn verify(
        &self,
        password: &str,
        salt: &str,
        expected_hash: &str,
    ) -> Result<bool, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        let cost = cost_of(expected_hash).ok_or_else(|| {
            AppError::InternalServerError("Failed to verify password: malformed hash".into())
        })?;
        let candidate = hash_with_cost(password, salt, cost)?;
        Ok(constant_time_eq(candidate.as_bytes(), expected_hash.as_bytes()))
    }
}

fn hash_with_cost(password: &str, salt: &str, cost: u32) -> Result<String, AppError> {
    let salt = decode_salt(salt)?;
    hash_with_salt(password, cost, salt)
        .map(|parts| parts.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

fn decode_salt(salt: &str) -> Result<[u8; SALT_BYTES], AppError> {
    let bytes = hex::decode(salt)
        .map_err(|e| AppError::InternalServerError(format!("Malformed salt: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| AppError::InternalServerError("Malformed salt: wrong length".into()))
}

/// Reads the cost field out of a `$2b$12$...` string.
fn cost_of(hash: &str) -> Option<u32> {
    let mut fields = hash.split('$');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(""), Some(_version), Some(cost)) => cost.parse().ok(),
        _ => None,
    }
}

/// Compares without exiting at the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
