//! Minimal user entity so foreign keys resolve.
//!
//! Authentication lives outside this service; the acting user id arrives
//! via the `X-Actor-Id` request header.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use segflow_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub created_at: Timestamp,
}

/// DTO for registering a user reference.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
}
