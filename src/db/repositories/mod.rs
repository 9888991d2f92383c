pub mod permission;
pub mod token;
pub mod user;

use sea_orm::{DbErr, SqlErr};

use super::StoreError;

/// `users.email` is the only unique column a user write can violate.
fn unique_violation_as_duplicate_email(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::DuplicateEmail,
        _ => StoreError::Database(err),
    }
}
