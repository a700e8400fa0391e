//! Route definitions for the `/projects` resource.
//!
//! Also nests the member roster and batch uploads under
//! `/projects/{id}/...`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{batch, project};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                      -> list
/// POST   /                      -> create
/// GET    /{id}                  -> get_by_id
///
/// GET    /{id}/members          -> list_members
/// PUT    /{id}/members          -> upsert_members
///
/// POST   /{id}/batches          -> upload (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{id}", get(project::get_by_id))
        .route(
            "/{id}/members",
            get(project::list_members).put(project::upsert_members),
        )
        .route("/{id}/batches", post(batch::upload))
}
