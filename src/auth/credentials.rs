//! Password hashing and basic-credential verification.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::AppError;

/// Hashes a plaintext password with argon2 under a fresh random salt.
/// The work factor is the argon2 default and is deliberately slow.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(format!("password hashing failed: {}", e)))
}

/// Verifies a plaintext password against a stored hash. A malformed hash
/// verifies as false rather than erroring.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Constant-time string comparison to prevent timing attacks.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

/// Verifies credentials presented via HTTP basic auth against the pair
/// configured at startup.
pub struct BasicVerifier {
    username: String,
    password: String,
}

impl BasicVerifier {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Pure predicate; empty input never validates, even when the configured
    /// values are themselves empty.
    pub fn validate(&self, username: &str, password: &str) -> bool {
        if username.is_empty() || password.is_empty() {
            return false;
        }

        // Non-short-circuiting so both comparisons always run.
        constant_time_eq(username, &self.username) & constant_time_eq(password, &self.password)
    }

    /// Decodes a `Basic <base64>` header value into (username, password).
    /// Any malformation yields a pair of empty strings, which can never
    /// validate.
    pub fn decode_header(header: &str) -> (String, String) {
        let encoded = match header.strip_prefix("Basic ") {
            Some(rest) => rest.trim(),
            None => return (String::new(), String::new()),
        };

        let decoded = match BASE64.decode(encoded) {
            Ok(bytes) => bytes,
            Err(_) => return (String::new(), String::new()),
        };

        let decoded = match String::from_utf8(decoded) {
            Ok(s) => s,
            Err(_) => return (String::new(), String::new()),
        };

        match decoded.split_once(':') {
            Some((user, pass)) => (user.to_string(), pass.to_string()),
            None => (String::new(), String::new()),
        }
    }
}
