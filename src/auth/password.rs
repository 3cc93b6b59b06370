use crate::error::AppError;
use bcrypt::{hash, verify};

/// Work factor used for new password hashes unless configured otherwise.
pub const DEFAULT_HASH_COST: u32 = 10;

/// Hashes `password` with a fresh per-record salt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
