//! Batch entity models and DTOs.
//!
//! One row per ingestion run, carrying the counters reported back to the
//! uploader. Invariant: `images_extracted + images_failed <= total_images`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use segflow_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `batches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Batch {
    pub id: DbId,
    pub project_id: DbId,
    pub dataset_id: DbId,
    pub batch_code: String,
    pub archive_name: String,
    pub uploaded_by: DbId,
    pub status_id: StatusId,
    pub total_images: i32,
    pub images_extracted: i32,
    pub images_failed: i32,
    pub duplicates_found: i32,
    pub total_tasks_created: i32,
    pub assigned_tasks: i32,
    pub unassigned_tasks: i32,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// DTO for creating a batch row at the start of an ingestion run.
#[derive(Debug, Deserialize)]
pub struct CreateBatch {
    pub project_id: DbId,
    pub dataset_id: DbId,
    pub batch_code: String,
    pub archive_name: String,
    pub uploaded_by: DbId,
    pub total_images: i32,
}

/// Final counters written when an ingestion run completes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchCounts {
    pub images_extracted: i32,
    pub images_failed: i32,
    pub duplicates_found: i32,
    pub total_tasks_created: i32,
    pub assigned_tasks: i32,
    pub unassigned_tasks: i32,
}
