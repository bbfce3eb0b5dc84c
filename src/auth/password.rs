//! bcrypt hashing. Both functions are CPU bound; request handlers run them
//! through `web::block`.

use crate::error::AppError;

/// Hashes `password` with a fresh salt at the given bcrypt cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Checks `password` against a stored hash. A hash that cannot be parsed is
/// an internal error, not a failed login.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    Ok(bcrypt::verify(password, password_hash)?)
}
