//! Password hashing and temporary credential generation.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use uuid::Uuid;

use crate::AccessError;

/// Minimum accepted length for a password.
pub const MIN_PASSWORD_LEN: usize = 6;

const TEMPORARY_PASSWORD_LEN: usize = 10;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Hashes a password into a PHC string using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, AccessError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccessError::PasswordHash(e.to_string()))
}

/// Checks a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn validate_password(password: &str) -> Result<(), AccessError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccessError::InvalidArgument(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres."
        )));
    }
    Ok(())
}

/// Generates the temporary password handed to a newly approved carrier:
/// ten lowercase base-36 characters.
pub fn generate_temporary_password() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(TEMPORARY_PASSWORD_LEN);
    for _ in 0..TEMPORARY_PASSWORD_LEN {
        out.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    out
}
