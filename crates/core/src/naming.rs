//! Batch code and storage path conventions.
//!
//! Generates deterministic batch identifiers and the on-disk layout for
//! staged archives, dataset image stores, and per-task annotation
//! directories. All paths are relative to the media root; the storage
//! layer resolves them against its own base directory.

use chrono::Utc;
use uuid::Uuid;

use crate::types::DbId;

/// Generate a unique code for one ingestion run.
///
/// Convention: `upload_{YYYYMMDD}_{HHMMSS}_{8-hex-suffix}`. The random
/// suffix keeps codes unique when two uploads land in the same second.
pub fn batch_code() -> String {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("upload_{stamp}_{}", &suffix[..8])
}

/// Staging directory for extracting one batch's archive.
///
/// Convention: `temp/unzip_{batch_code}`. Cleared before each extraction
/// so a retried batch never sees stale entries.
pub fn staging_dir(batch_code: &str) -> String {
    format!("temp/unzip_{batch_code}")
}

/// Root storage directory for one dataset.
///
/// Convention: `projects/{project_id}/datasets/{dataset_code}`.
pub fn dataset_dir(project_id: DbId, dataset_code: &str) -> String {
    format!("projects/{project_id}/datasets/{dataset_code}")
}

/// Directory holding a dataset's accepted source images.
pub fn original_images_dir(project_id: DbId, dataset_code: &str) -> String {
    format!("{}/original_images", dataset_dir(project_id, dataset_code))
}

/// Annotation artifact directory for one task.
///
/// Convention: `{dataset_dir}/annotations/task_{task_id}`. Holds the
/// mask image and metadata document.
pub fn task_annotation_dir(project_id: DbId, dataset_code: &str, task_id: DbId) -> String {
    format!(
        "{}/annotations/task_{task_id}",
        dataset_dir(project_id, dataset_code)
    )
}
