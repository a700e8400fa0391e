//! Handlers for batch archive uploads and batch status.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use segflow_core::error::CoreError;
use segflow_core::types::DbId;
use segflow_db::models::batch::Batch;
use segflow_db::models::status::TaskPriority;
use segflow_db::repositories::BatchRepo;

use crate::error::{AppError, AppResult};
use crate::extract::Actor;
use crate::ingest::{run_batch_upload, BatchSummary};
use crate::state::AppState;

/// POST /api/v1/projects/{id}/batches
///
/// Multipart form with a required `archive` file field and an optional
/// `priority` text field (low, medium, high, urgent; default medium).
pub async fn upload(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(project_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<BatchSummary>)> {
    let mut archive: Option<(String, Vec<u8>)> = None;
    let mut priority = TaskPriority::Medium;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        match field.name() {
            Some("archive") => {
                let name = field
                    .file_name()
                    .unwrap_or("upload.zip")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Could not read archive: {e}")))?;
                archive = Some((name, bytes.to_vec()));
            }
            Some("priority") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Could not read priority: {e}")))?;
                priority = parse_priority(&text)?;
            }
            _ => {}
        }
    }

    let (archive_name, archive_bytes) =
        archive.ok_or_else(|| AppError::BadRequest("Missing 'archive' field".to_string()))?;

    let summary = run_batch_upload(
        &state,
        project_id,
        actor_id,
        &archive_name,
        archive_bytes,
        priority,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/v1/batches/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Batch>> {
    let batch = BatchRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Batch", id }))?;
    Ok(Json(batch))
}

fn parse_priority(text: &str) -> Result<TaskPriority, AppError> {
    match text.to_ascii_lowercase().as_str() {
        "low" => Ok(TaskPriority::Low),
        "medium" => Ok(TaskPriority::Medium),
        "high" => Ok(TaskPriority::High),
        "urgent" => Ok(TaskPriority::Urgent),
        other => Err(AppError::BadRequest(format!("Unknown priority '{other}'"))),
    }
}
