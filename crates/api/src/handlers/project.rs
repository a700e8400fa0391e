//! Handlers for the `/projects` resource, including worker roster
//! management under `/projects/{id}/members`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use segflow_core::error::CoreError;
use segflow_core::roles::validate_role;
use segflow_core::types::DbId;
use segflow_db::models::member::{ProjectMember, UpsertMember};
use segflow_db::models::project::{CreateProject, Project};
use segflow_db::repositories::{MemberRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::extract::Actor;
use crate::state::AppState;

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project = ProjectRepo::create(&state.pool, actor_id, &input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/v1/projects
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Project>>> {
    let projects = ProjectRepo::list(&state.pool).await?;
    Ok(Json(projects))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Project>> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(project))
}

/// PUT /api/v1/projects/{id}/members
///
/// Replace-or-insert the given members. `current_workload` survives
/// capacity and availability edits untouched.
pub async fn upsert_members(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<Vec<UpsertMember>>,
) -> AppResult<Json<Vec<ProjectMember>>> {
    ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    for member in &input {
        validate_role(&member.role)?;
        if member.capacity < 0 {
            return Err(CoreError::Validation(format!(
                "Capacity for user {} must be non-negative",
                member.user_id
            ))
            .into());
        }
    }

    let mut members = Vec::with_capacity(input.len());
    for member in &input {
        members.push(MemberRepo::upsert(&state.pool, id, member).await?);
    }
    Ok(Json(members))
}

/// GET /api/v1/projects/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<ProjectMember>>> {
    let members = MemberRepo::list_by_project(&state.pool, id).await?;
    Ok(Json(members))
}
