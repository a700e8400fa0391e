//! Review record entity models and DTOs.
//!
//! Rows are append-only: one per decision event, never updated.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use segflow_core::types::{DbId, Timestamp};

/// A row from the `task_reviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskReview {
    pub id: DbId,
    pub task_id: DbId,
    pub reviewer_id: DbId,
    pub review_type: String,
    pub decision: String,
    pub comments: Option<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub duration_secs: Option<i32>,
    pub reviewed_at: Timestamp,
}

/// DTO for appending a review record.
#[derive(Debug, Deserialize)]
pub struct CreateTaskReview {
    pub task_id: DbId,
    pub reviewer_id: DbId,
    pub review_type: String,
    pub decision: String,
    pub comments: Option<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub duration_secs: Option<i32>,
}
