//! Handlers for the `/tasks` resource: the worker lifecycle (open, save
//! progress, submit) plus listing and the mask proposal proxy.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use segflow_core::annotation::{merge_metadata, MASK_FILENAME, METADATA_FILENAME};
use segflow_core::error::CoreError;
use segflow_core::naming;
use segflow_core::types::DbId;
use segflow_db::models::status::TaskStatus;
use segflow_db::models::task::{Task, TaskListQuery};
use segflow_db::repositories::{BatchRepo, DatasetRepo, ImageRepo, TaskRepo};

use crate::error::{AppError, AppResult};
use crate::extract::Actor;
use crate::state::AppState;

/// Query parameters for `GET /api/v1/tasks`.
///
/// `assigned_to` accepts a user ID or the literal `me`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub assigned_to: Option<String>,
    pub status_id: Option<i16>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body for `PUT /api/v1/tasks/{id}/progress`.
#[derive(Debug, Deserialize)]
pub struct SaveProgressRequest {
    /// Base64-encoded PNG mask.
    pub mask_base64: String,
    /// Annotation metadata document, merged into the stored one.
    pub metadata: Value,
}

/// GET /api/v1/tasks
pub async fn list(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Task>>> {
    let assigned_to = match params.assigned_to.as_deref() {
        None => None,
        Some("me") => Some(actor_id),
        Some(raw) => Some(raw.parse::<DbId>().map_err(|_| {
            AppError::BadRequest(format!("Invalid assigned_to value '{raw}'"))
        })?),
    };

    let tasks = TaskRepo::list(
        &state.pool,
        &TaskListQuery {
            assigned_to,
            status_id: params.status_id,
            limit: params.limit,
            offset: params.offset,
        },
    )
    .await?;
    Ok(Json(tasks))
}

/// GET /api/v1/tasks/{id}
///
/// Opening a task is how work starts: an assigned task moves to
/// IN_PROGRESS with the clock running, a rejected one is reset for
/// rework. Reads by the current holder are otherwise no-ops.
pub async fn open(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<DbId>,
) -> AppResult<Json<Task>> {
    let task = TaskRepo::open(&state.pool, id, actor_id).await?;
    Ok(Json(task))
}

/// PUT /api/v1/tasks/{id}/progress
pub async fn save_progress(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<DbId>,
    Json(input): Json<SaveProgressRequest>,
) -> AppResult<Json<Task>> {
    let task = find_task(&state, id).await?;

    // Holder and status are checked before any file write so a rejected
    // request leaves the stored artifacts untouched. The repository
    // re-checks both under the row lock.
    if !task.held_by(actor_id) {
        return Err(CoreError::Forbidden(format!(
            "User {actor_id} does not hold task {id}"
        ))
        .into());
    }
    if task.status_id != TaskStatus::InProgress.id() {
        return Err(CoreError::Conflict(format!("Task {id} is not in progress")).into());
    }

    let paths = persist_artifacts(
        &state,
        &task,
        actor_id,
        "save",
        Some(&input.mask_base64),
        Some(&input.metadata),
    )
    .await?;

    let updated =
        TaskRepo::save_progress(&state.pool, id, actor_id, &paths.mask, &paths.metadata).await?;
    Ok(Json(updated))
}

/// POST /api/v1/tasks/{id}/submit
pub async fn submit(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<DbId>,
) -> AppResult<Json<Task>> {
    let task = TaskRepo::submit(&state.pool, id, actor_id).await?;
    Ok(Json(task))
}

/// GET /api/v1/tasks/{id}/proposal
///
/// Proxy the task's source image through the configured mask proposal
/// service and return the proposed mask as PNG bytes.
pub async fn proposal(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let proposer = state.proposer.clone().ok_or_else(|| {
        AppError::Unavailable("No mask proposal service is configured".to_string())
    })?;

    let task = find_task(&state, id).await?;
    if !task.held_by(actor_id) {
        return Err(CoreError::Forbidden(format!(
            "User {actor_id} does not hold task {id}"
        ))
        .into());
    }

    let image = ImageRepo::find_by_id(&state.pool, task.image_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Image",
            id: task.image_id,
        }))?;

    let image_bytes = state.store.read(&image.file_path).await?;
    let mask = proposer.propose(&image_bytes).await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], mask))
}

/* ---- Shared artifact persistence ---- */

/// Relative storage paths for one task's annotation artifacts.
pub(crate) struct ArtifactPaths {
    pub mask: String,
    pub metadata: String,
}

pub(crate) async fn find_task(state: &AppState, id: DbId) -> AppResult<Task> {
    TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))
}

/// Write the given mask and metadata to the task's annotation directory
/// and return the relative paths, writing only what was provided.
///
/// Metadata is merged into the stored document rather than replacing it;
/// a corrupt stored document is treated as absent.
pub(crate) async fn persist_artifacts(
    state: &AppState,
    task: &Task,
    actor_id: DbId,
    action: &str,
    mask_base64: Option<&str>,
    metadata: Option<&Value>,
) -> AppResult<ArtifactPaths> {
    let batch = BatchRepo::find_by_id(&state.pool, task.batch_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Batch",
            id: task.batch_id,
        }))?;
    let dataset = DatasetRepo::find_by_id(&state.pool, batch.dataset_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Dataset",
            id: batch.dataset_id,
        }))?;

    let dir = naming::task_annotation_dir(dataset.project_id, &dataset.code, task.id);
    let paths = ArtifactPaths {
        mask: format!("{dir}/{MASK_FILENAME}"),
        metadata: format!("{dir}/{METADATA_FILENAME}"),
    };

    if let Some(encoded) = mask_base64 {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| AppError::BadRequest(format!("Invalid base64 mask: {e}")))?;
        state.store.write(&paths.mask, &bytes).await?;
    }

    if let Some(incoming) = metadata {
        let existing = state
            .store
            .try_read(&paths.metadata)
            .await?
            .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());
        let merged = merge_metadata(existing, incoming, actor_id, action);
        let bytes = serde_json::to_vec_pretty(&merged)
            .map_err(|e| AppError::InternalError(format!("Could not encode metadata: {e}")))?;
        state.store.write(&paths.metadata, &bytes).await?;
    }

    Ok(paths)
}
