//! Request handlers, one module per resource.

pub mod batch;
pub mod project;
pub mod review;
pub mod task;
