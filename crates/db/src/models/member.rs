//! Worker capacity entity models and DTOs.
//!
//! One row per (project, user). Invariant at every committed state:
//! `0 <= current_workload <= capacity`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use segflow_core::types::{DbId, Timestamp};

/// A row from the `project_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectMember {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub capacity: i32,
    pub current_workload: i32,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for upserting a member via `PUT /api/v1/projects/{id}/members`.
#[derive(Debug, Deserialize)]
pub struct UpsertMember {
    pub user_id: DbId,
    pub role: String,
    pub capacity: i32,
    pub is_available: Option<bool>,
}
