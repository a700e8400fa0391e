//! Annotation task entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use segflow_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `tasks` table.
///
/// `segmenter_id` is set once at creation and never reassigned;
/// `assigned_to` is the mutable current holder. Task rows are never
/// deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub image_id: DbId,
    pub batch_id: DbId,
    pub segmenter_id: DbId,
    pub assigned_to: DbId,
    pub status_id: StatusId,
    pub priority_id: StatusId,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub total_duration_secs: Option<i32>,
    pub feedback: Option<String>,
    pub mask_path: Option<String>,
    pub metadata_path: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// Whether the actor may open or mutate this task as its worker.
    pub fn held_by(&self, actor_id: DbId) -> bool {
        self.assigned_to == actor_id || self.segmenter_id == actor_id
    }
}

/// Query parameters for `GET /api/v1/tasks`.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    /// Filter to one worker's active tasks.
    pub assigned_to: Option<DbId>,
    /// Filter by status ID.
    pub status_id: Option<StatusId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
