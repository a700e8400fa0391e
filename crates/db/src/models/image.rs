//! Source image entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use segflow_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `images` table.
///
/// `(dataset_id, checksum)` is unique; it is the deduplication key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: DbId,
    pub dataset_id: DbId,
    pub file_name: String,
    pub file_path: String,
    pub width: i32,
    pub height: i32,
    pub file_size_bytes: i64,
    pub checksum: String,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting an accepted image during ingestion.
#[derive(Debug, Deserialize)]
pub struct CreateImage {
    pub dataset_id: DbId,
    pub file_name: String,
    pub file_path: String,
    pub width: i32,
    pub height: i32,
    pub file_size_bytes: i64,
    pub checksum: String,
}
