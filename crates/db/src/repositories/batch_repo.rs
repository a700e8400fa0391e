//! Repository for the `batches` table.
//!
//! Batch status moves forward only: PENDING → PROCESSING →
//! {COMPLETED, FAILED}. Finalizing updates are guarded on the current
//! status so a finished batch can never be rewound.

use sqlx::PgPool;

use segflow_core::types::DbId;

use crate::models::batch::{Batch, BatchCounts, CreateBatch};
use crate::models::status::BatchStatus;

/// Column list for `batches` queries.
const COLUMNS: &str = "\
    id, project_id, dataset_id, batch_code, archive_name, uploaded_by, \
    status_id, total_images, images_extracted, images_failed, \
    duplicates_found, total_tasks_created, assigned_tasks, \
    unassigned_tasks, created_at, completed_at";

/// Provides CRUD operations for ingestion batches.
pub struct BatchRepo;

impl BatchRepo {
    /// Create a batch row already in `Processing` status.
    ///
    /// The run that creates the row is the run that processes it, so
    /// there is no observable window in `Pending`.
    pub async fn create(pool: &PgPool, input: &CreateBatch) -> Result<Batch, sqlx::Error> {
        let query = format!(
            "INSERT INTO batches \
                 (project_id, dataset_id, batch_code, archive_name, \
                  uploaded_by, status_id, total_images) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(input.project_id)
            .bind(input.dataset_id)
            .bind(&input.batch_code)
            .bind(&input.archive_name)
            .bind(input.uploaded_by)
            .bind(BatchStatus::Processing.id())
            .bind(input.total_images)
            .fetch_one(pool)
            .await
    }

    /// Find a batch by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batches WHERE id = $1");
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a processing batch as completed with its final counters.
    ///
    /// Returns the updated row, or `None` if the batch was not in
    /// `Processing` status.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        counts: &BatchCounts,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!(
            "UPDATE batches \
             SET status_id = $2, images_extracted = $3, images_failed = $4, \
                 duplicates_found = $5, total_tasks_created = $6, \
                 assigned_tasks = $7, unassigned_tasks = $8, \
                 completed_at = NOW() \
             WHERE id = $1 AND status_id = $9 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .bind(BatchStatus::Completed.id())
            .bind(counts.images_extracted)
            .bind(counts.images_failed)
            .bind(counts.duplicates_found)
            .bind(counts.total_tasks_created)
            .bind(counts.assigned_tasks)
            .bind(counts.unassigned_tasks)
            .bind(BatchStatus::Processing.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a processing batch as failed, keeping whatever counters had
    /// been reached. The row is never deleted.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        counts: &BatchCounts,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!(
            "UPDATE batches \
             SET status_id = $2, images_extracted = $3, images_failed = $4, \
                 duplicates_found = $5, total_tasks_created = $6, \
                 assigned_tasks = $7, unassigned_tasks = $8, \
                 completed_at = NOW() \
             WHERE id = $1 AND status_id = $9 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .bind(BatchStatus::Failed.id())
            .bind(counts.images_extracted)
            .bind(counts.images_failed)
            .bind(counts.duplicates_found)
            .bind(counts.total_tasks_created)
            .bind(counts.assigned_tasks)
            .bind(counts.unassigned_tasks)
            .bind(BatchStatus::Processing.id())
            .fetch_optional(pool)
            .await
    }
}
