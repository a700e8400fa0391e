//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Query/update DTOs where the API exposes them

pub mod batch;
pub mod dataset;
pub mod image;
pub mod member;
pub mod project;
pub mod review;
pub mod status;
pub mod task;
pub mod user;
