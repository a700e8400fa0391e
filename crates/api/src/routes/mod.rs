pub mod batch;
pub mod health;
pub mod project;
pub mod task;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                          list, create (GET, POST)
/// /projects/{id}                     get project (GET)
/// /projects/{id}/members             roster list, bulk upsert (GET, PUT)
/// /projects/{id}/batches             upload archive (POST, multipart)
///
/// /batches/{id}                      batch status and counters (GET)
///
/// /tasks                             list tasks (GET)
/// /tasks/{id}                        open task, starts the clock (GET)
/// /tasks/{id}/progress               save mask + metadata (PUT)
/// /tasks/{id}/submit                 submit for review (POST)
/// /tasks/{id}/proposal               proxy mask proposal (GET)
/// /tasks/{id}/review                 approve, reject, save (POST)
/// /tasks/{id}/reviews                review trail (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Project CRUD plus the worker roster and archive uploads.
        .nest("/projects", project::router())
        // Batch status lookups.
        .nest("/batches", batch::router())
        // Worker lifecycle and review decisions.
        .nest("/tasks", task::router())
}
