//! Handlers for task review decisions and the review trail.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use segflow_core::review::{
    validate_action, validate_reject_comments, ACTION_APPROVE, ACTION_REJECT, ACTION_SAVE,
};
use segflow_core::types::{DbId, Timestamp};
use segflow_db::models::review::TaskReview;
use segflow_db::models::task::Task;
use segflow_db::repositories::{ReviewRepo, TaskRepo};

use crate::error::{AppError, AppResult};
use crate::extract::Actor;
use crate::handlers::task::{find_task, persist_artifacts};
use crate::state::AppState;

/// Body for `POST /api/v1/tasks/{id}/review`.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// One of `approve`, `reject`, `save`.
    pub action: String,
    /// Reviewer comments. Required for `reject`.
    pub comments: Option<String>,
    /// When the reviewer opened the task, for review duration tracking.
    pub review_started_at: Option<Timestamp>,
    /// Corrected mask, base64 PNG. Only used by `save`.
    pub mask_base64: Option<String>,
    /// Corrected metadata document. Only used by `save`.
    pub metadata: Option<Value>,
}

/// POST /api/v1/tasks/{id}/review/start
///
/// Claim a submitted task for review, moving it to QA_REVIEW so its
/// decision endpoints operate on a claimed task. Claiming twice is a
/// no-op.
pub async fn begin(
    State(state): State<AppState>,
    Actor(_actor_id): Actor,
    Path(id): Path<DbId>,
) -> AppResult<Json<Task>> {
    let task = TaskRepo::begin_review(&state.pool, id).await?;
    Ok(Json(task))
}

/// POST /api/v1/tasks/{id}/review
///
/// `approve` completes the task and releases the worker's slot,
/// `reject` sends it back for rework with the comments as feedback,
/// `save` stores the reviewer's corrected artifacts without a decision.
pub async fn decide(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<Task>> {
    validate_action(&input.action)?;

    let task = match input.action.as_str() {
        ACTION_APPROVE => {
            TaskRepo::approve(
                &state.pool,
                id,
                actor_id,
                input.comments.as_deref(),
                input.review_started_at,
            )
            .await?
        }
        ACTION_REJECT => {
            validate_reject_comments(&input.comments)?;
            let comments = input.comments.as_deref().unwrap_or_default();
            TaskRepo::reject(&state.pool, id, actor_id, comments, input.review_started_at).await?
        }
        ACTION_SAVE => {
            let task = find_task(&state, id).await?;
            let paths = persist_artifacts(
                &state,
                &task,
                actor_id,
                ACTION_SAVE,
                input.mask_base64.as_deref(),
                input.metadata.as_ref(),
            )
            .await?;
            TaskRepo::set_artifact_paths(&state.pool, id, &paths.mask, &paths.metadata).await?
        }
        other => {
            return Err(AppError::BadRequest(format!("Unknown action '{other}'")));
        }
    };

    Ok(Json(task))
}

/// GET /api/v1/tasks/{id}/reviews
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<TaskReview>>> {
    find_task(&state, id).await?;
    let reviews = ReviewRepo::list_by_task(&state.pool, id).await?;
    Ok(Json(reviews))
}
