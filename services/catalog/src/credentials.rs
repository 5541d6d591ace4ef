//! Password hashing and verification

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

/// Hash a plaintext password into a PHC string with a fresh random salt
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Check a plaintext password against a stored digest.
///
/// A digest that cannot be parsed never matches.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}
