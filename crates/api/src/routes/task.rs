//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{review, task};
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                   -> list
/// GET    /{id}               -> open
/// PUT    /{id}/progress      -> save_progress
/// POST   /{id}/submit        -> submit
/// GET    /{id}/proposal      -> proposal
/// POST   /{id}/review/start  -> begin (claim for review)
/// POST   /{id}/review        -> decide
/// GET    /{id}/reviews       -> list (review trail)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(task::list))
        .route("/{id}", get(task::open))
        .route("/{id}/progress", put(task::save_progress))
        .route("/{id}/submit", post(task::submit))
        .route("/{id}/proposal", get(task::proposal))
        .route("/{id}/review/start", post(review::begin))
        .route("/{id}/review", post(review::decide))
        .route("/{id}/reviews", get(review::list))
}
