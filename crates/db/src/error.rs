//! Error type for repository methods that enforce domain rules.
//!
//! Plain CRUD methods return `sqlx::Error` directly; methods that also
//! check transitions, authorization, or pool availability return
//! `DbError` so callers can distinguish domain failures from driver
//! failures.

use segflow_core::error::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Domain(#[from] CoreError),
}

impl DbError {
    /// Shorthand for a not-found domain error.
    pub fn not_found(entity: &'static str, id: segflow_core::types::DbId) -> Self {
        DbError::Domain(CoreError::NotFound { entity, id })
    }
}
