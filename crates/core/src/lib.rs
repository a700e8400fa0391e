//! Pure domain logic for the segflow annotation pipeline.
//!
//! This crate has no database access. It provides archive validation,
//! content fingerprinting, round-robin assignment planning, annotation
//! metadata merging, naming conventions, and the shared error type used
//! across the workspace.

pub mod annotation;
pub mod archive;
pub mod assignment;
pub mod error;
pub mod hashing;
pub mod naming;
pub mod review;
pub mod roles;
pub mod types;
