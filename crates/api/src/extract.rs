//! Request extractors.
//!
//! Authentication is handled upstream of this service; the acting user
//! arrives as the `X-Actor-Id` header. This extractor is the single
//! place that seam is read.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use segflow_core::error::CoreError;
use segflow_core::types::DbId;

use crate::error::AppError;

/// The header carrying the acting user's id.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The acting user, resolved from the `X-Actor-Id` header.
///
/// A missing or malformed header rejects the request with 401.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub DbId);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing X-Actor-Id header".to_string(),
                ))
            })?
            .to_str()
            .map_err(|_| {
                AppError::Core(CoreError::Unauthorized(
                    "Invalid X-Actor-Id header".to_string(),
                ))
            })?;

        let id: DbId = value.parse().map_err(|_| {
            AppError::Core(CoreError::Unauthorized(
                "X-Actor-Id must be a numeric user id".to_string(),
            ))
        })?;

        Ok(Actor(id))
    }
}
