//! Domain-level error type shared by all workspace crates.

use crate::types::DbId;

/// Errors produced by domain logic, independent of transport or storage.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came up empty.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input failed a domain validation rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation conflicts with current state (duplicate, illegal
    /// transition, exhausted worker pool).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller's identity could not be established.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is known but not permitted to act on this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}
