//! Batch ingestion orchestrator.
//!
//! One upload runs end to end: validate the archive, auto-create the
//! dataset and batch rows, extract to a staging directory, fingerprint
//! and deduplicate each file, move keepers into the dataset store, then
//! create and assign tasks atomically. Any step failing after the batch
//! row exists marks the batch FAILED with whatever counters were
//! reached; the row is never deleted.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use segflow_core::archive::{validate_archive, ArchiveManifest, RejectedEntry};
use segflow_core::error::CoreError;
use segflow_core::hashing::sha256_file;
use segflow_core::naming;
use segflow_core::roles::ROLE_SEGMENTER;
use segflow_core::types::DbId;
use segflow_db::models::batch::{Batch, BatchCounts, CreateBatch};
use segflow_db::models::dataset::{CreateDataset, Dataset};
use segflow_db::models::image::CreateImage;
use segflow_db::models::status::TaskPriority;
use segflow_db::repositories::{BatchRepo, DatasetRepo, ImageRepo, ProjectRepo, TaskRepo};

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::state::AppState;

/// One file that failed during extraction or storage.
#[derive(Debug, Serialize)]
pub struct IngestFailure {
    pub file_name: String,
    pub reason: String,
}

/// Result of one completed ingestion run, returned to the uploader.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub batch: Batch,
    pub dataset_code: String,
    pub storage_path: String,
    pub rejected: Vec<RejectedEntry>,
    pub failed: Vec<IngestFailure>,
    pub elapsed_secs: f64,
}

/// Outcome of the extract-fingerprint-store stage.
struct IngestOutcome {
    image_ids: Vec<DbId>,
    duplicates: i32,
    failed: Vec<IngestFailure>,
}

/// Run one full batch upload.
pub async fn run_batch_upload(
    state: &AppState,
    project_id: DbId,
    actor_id: DbId,
    archive_name: &str,
    archive_bytes: Vec<u8>,
    priority: TaskPriority,
) -> AppResult<BatchSummary> {
    let started = Instant::now();

    ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    // Archive-level validation happens before any row is written, so a
    // corrupt or oversized upload leaves no trace.
    let manifest = validate_archive(&archive_bytes, state.config.max_archive_bytes)?;

    let batch_code = naming::batch_code();
    let dataset = DatasetRepo::create(
        &state.pool,
        actor_id,
        &CreateDataset {
            project_id,
            name: archive_name.to_string(),
            code: batch_code.clone(),
            storage_path: naming::dataset_dir(project_id, &batch_code),
        },
    )
    .await?;

    let batch = BatchRepo::create(
        &state.pool,
        &CreateBatch {
            project_id,
            dataset_id: dataset.id,
            batch_code: batch_code.clone(),
            archive_name: archive_name.to_string(),
            uploaded_by: actor_id,
            total_images: manifest.total_entries() as i32,
        },
    )
    .await?;

    let mut counts = BatchCounts {
        images_failed: manifest.rejected.len() as i32,
        ..Default::default()
    };

    let outcome = match ingest_archive(state, &dataset, &manifest, archive_bytes, &batch_code).await
    {
        Ok(outcome) => outcome,
        Err(e) => return Err(fail_batch(state, batch.id, counts, e).await),
    };

    counts.images_extracted = outcome.image_ids.len() as i32;
    counts.duplicates_found = outcome.duplicates;
    counts.images_failed += outcome.failed.len() as i32;

    let assignment = match TaskRepo::create_and_assign(
        &state.pool,
        project_id,
        batch.id,
        ROLE_SEGMENTER,
        &outcome.image_ids,
        priority,
    )
    .await
    {
        Ok(assignment) => assignment,
        Err(e) => return Err(fail_batch(state, batch.id, counts, e.into()).await),
    };

    counts.total_tasks_created = assignment.tasks.len() as i32;
    counts.assigned_tasks = assignment.assigned as i32;
    counts.unassigned_tasks = assignment.unassigned as i32;

    let finalized = BatchRepo::mark_completed(&state.pool, batch.id, &counts)
        .await?
        .ok_or_else(|| {
            AppError::InternalError(format!("Batch {} was finalized concurrently", batch.id))
        })?;

    tracing::info!(
        batch_code = %finalized.batch_code,
        extracted = counts.images_extracted,
        duplicates = counts.duplicates_found,
        failed = counts.images_failed,
        tasks = counts.total_tasks_created,
        "Batch upload completed"
    );

    Ok(BatchSummary {
        batch: finalized,
        dataset_code: dataset.code,
        storage_path: dataset.storage_path,
        rejected: manifest.rejected,
        failed: outcome.failed,
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}

/// Mark the batch failed with the counters reached so far and hand the
/// original error back to the caller.
async fn fail_batch(
    state: &AppState,
    batch_id: DbId,
    counts: BatchCounts,
    error: AppError,
) -> AppError {
    tracing::error!(batch_id, error = %error, "Batch upload failed");
    if let Err(mark_err) = BatchRepo::mark_failed(&state.pool, batch_id, &counts).await {
        tracing::error!(batch_id, error = %mark_err, "Failed to mark batch as failed");
    }
    error
}

/// Extract accepted entries to staging, then fingerprint, deduplicate,
/// and move each into the dataset's image store.
async fn ingest_archive(
    state: &AppState,
    dataset: &Dataset,
    manifest: &ArchiveManifest,
    archive_bytes: Vec<u8>,
    batch_code: &str,
) -> AppResult<IngestOutcome> {
    let staging_rel = naming::staging_dir(batch_code);
    let staging_abs = state.store.resolve(&staging_rel);
    let images_dir = naming::original_images_dir(dataset.project_id, batch_code);

    let dimensions: HashMap<&str, (u32, u32)> = manifest
        .accepted
        .iter()
        .map(|e| (e.filename.as_str(), (e.width, e.height)))
        .collect();

    // ZIP decompression is synchronous; run it off the async runtime.
    let accepted: HashSet<String> = manifest.accepted.iter().map(|e| e.filename.clone()).collect();
    let staged: Vec<(String, String)> = {
        let staging_abs = staging_abs.clone();
        let staging_rel = staging_rel.clone();
        tokio::task::spawn_blocking(move || {
            extract_entries(&archive_bytes, &accepted, &staging_abs, &staging_rel)
        })
        .await
        .map_err(|e| AppError::InternalError(format!("Extraction task panicked: {e}")))??
    };

    let mut image_ids = Vec::new();
    let mut duplicates = 0;
    let mut failed = Vec::new();

    for (entry_name, staged_rel) in staged {
        let staged_path = state.store.resolve(&staged_rel);

        let checksum = match sha256_file(&staged_path).await {
            Ok(checksum) => checksum,
            Err(e) => {
                failed.push(IngestFailure {
                    file_name: entry_name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if ImageRepo::exists_by_checksum(&state.pool, dataset.id, &checksum).await? {
            duplicates += 1;
            state.store.remove(&staged_rel).await?;
            continue;
        }

        let file_size = tokio::fs::metadata(&staged_path).await?.len();
        let mut base_name = file_base_name(&entry_name);
        // Entries from different archive directories can share a base
        // name; the later one gets a checksum-tagged name instead of
        // overwriting the earlier file.
        if state.store.exists(&format!("{images_dir}/{base_name}")).await {
            base_name = disambiguated_name(&base_name, &checksum);
        }
        let dest_rel = format!("{images_dir}/{base_name}");

        if let Err(e) = state.store.move_file(&staged_rel, &dest_rel).await {
            failed.push(IngestFailure {
                file_name: entry_name,
                reason: format!("Could not store file: {e}"),
            });
            continue;
        }

        let (width, height) = dimensions.get(entry_name.as_str()).copied().unwrap_or((0, 0));
        let create = CreateImage {
            dataset_id: dataset.id,
            file_name: base_name,
            file_path: dest_rel.clone(),
            width: width as i32,
            height: height as i32,
            file_size_bytes: file_size as i64,
            checksum,
        };

        match ImageRepo::create(&state.pool, &create).await {
            Ok(image) => image_ids.push(image.id),
            // Lost a dedup race against a concurrent upload.
            Err(e) if is_unique_violation(&e, "uq_images_dataset_checksum") => {
                duplicates += 1;
                state.store.remove(&dest_rel).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Err(e) = state.store.remove_dir(&staging_rel).await {
        tracing::warn!(staging = %staging_rel, error = %e, "Could not remove staging directory");
    }

    Ok(IngestOutcome {
        image_ids,
        duplicates,
        failed,
    })
}

/// Synchronously extract the accepted archive entries into a fresh
/// staging directory. Returns (entry name, staged relative path) pairs.
fn extract_entries(
    archive_bytes: &[u8],
    accepted: &HashSet<String>,
    staging_abs: &Path,
    staging_rel: &str,
) -> Result<Vec<(String, String)>, AppError> {
    if staging_abs.exists() {
        std::fs::remove_dir_all(staging_abs)?;
    }
    std::fs::create_dir_all(staging_abs)?;

    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))
        .map_err(|e| AppError::Core(CoreError::Validation(format!("Unreadable archive: {e}"))))?;

    let mut staged = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| AppError::Core(CoreError::Validation(format!("Unreadable archive: {e}"))))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if !accepted.contains(&name) {
            continue;
        }

        // Flatten nested archive paths into unique staging filenames.
        let staged_name = name.replace('/', "_");
        let dest = staging_abs.join(&staged_name);
        let mut out = std::fs::File::create(&dest)?;
        std::io::copy(&mut entry, &mut out)?;
        staged.push((name, format!("{staging_rel}/{staged_name}")));
    }

    Ok(staged)
}

/// Final path segment of an archive entry name.
fn file_base_name(entry_name: &str) -> String {
    entry_name
        .rsplit('/')
        .next()
        .unwrap_or(entry_name)
        .to_string()
}

/// Tag a colliding base name with a checksum fragment, keeping the
/// extension. Colliding entries have distinct checksums (identical ones
/// are deduplicated before this point), so the result is unique.
fn disambiguated_name(base_name: &str, checksum: &str) -> String {
    let tag = &checksum[..8.min(checksum.len())];
    match base_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{tag}.{ext}"),
        None => format!("{base_name}_{tag}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_directories() {
        assert_eq!(file_base_name("a/b/c.png"), "c.png");
        assert_eq!(file_base_name("plain.jpg"), "plain.jpg");
    }

    #[test]
    fn colliding_names_get_a_checksum_tag() {
        assert_eq!(disambiguated_name("frame.png", "deadbeefcafe"), "frame_deadbeef.png");
        assert_eq!(disambiguated_name("noext", "deadbeefcafe"), "noext_deadbeef");
    }
}
