//! Dataset entity models and DTOs.
//!
//! Datasets are created implicitly, one per ingestion batch.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use segflow_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `datasets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dataset {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub code: String,
    pub status_id: StatusId,
    pub storage_path: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for the implicit per-batch dataset insert.
#[derive(Debug, Deserialize)]
pub struct CreateDataset {
    pub project_id: DbId,
    pub name: String,
    pub code: String,
    pub storage_path: String,
}
