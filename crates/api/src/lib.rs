//! Segflow API server library.
//!
//! Exposes the core building blocks (config, state, error handling,
//! routes, storage, ingestion) so integration tests and the binary
//! entrypoint can both access them.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod ingest;
pub mod proposer;
pub mod routes;
pub mod state;
pub mod storage;
