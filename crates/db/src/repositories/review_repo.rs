//! Repository for the `task_reviews` table.
//!
//! The table is append-only: rows are inserted by review decisions and
//! read back as an audit trail, never updated or deleted.

use sqlx::PgPool;

use segflow_core::types::DbId;

use crate::models::review::{CreateTaskReview, TaskReview};

/// Column list for `task_reviews` queries.
const COLUMNS: &str = "\
    id, task_id, reviewer_id, review_type, decision, comments, \
    start_time, end_time, duration_secs, reviewed_at";

/// Provides append and read operations for review records.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Append one review record.
    pub async fn append(
        pool: &PgPool,
        input: &CreateTaskReview,
    ) -> Result<TaskReview, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_reviews \
                 (task_id, reviewer_id, review_type, decision, comments, \
                  start_time, end_time, duration_secs) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskReview>(&query)
            .bind(input.task_id)
            .bind(input.reviewer_id)
            .bind(&input.review_type)
            .bind(&input.decision)
            .bind(&input.comments)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.duration_secs)
            .fetch_one(pool)
            .await
    }

    /// List a task's review history, oldest first.
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: DbId,
    ) -> Result<Vec<TaskReview>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_reviews WHERE task_id = $1 ORDER BY reviewed_at ASC, id ASC"
        );
        sqlx::query_as::<_, TaskReview>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }
}
