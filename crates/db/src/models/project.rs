//! Project entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use segflow_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub status_id: StatusId,
    pub storage_path: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a project via `POST /api/v1/projects`.
#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}
