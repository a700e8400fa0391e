//! Integration tests for entity CRUD operations.
//!
//! Exercises the repository layer against a real database:
//! - Create full hierarchy (user -> project -> dataset -> batch -> image)
//! - Unique constraint behaviour, including the dedup key
//! - Member upsert semantics

use sqlx::PgPool;

use segflow_core::roles::ROLE_SEGMENTER;
use segflow_core::types::DbId;
use segflow_db::models::batch::{BatchCounts, CreateBatch};
use segflow_db::models::dataset::CreateDataset;
use segflow_db::models::image::CreateImage;
use segflow_db::models::member::UpsertMember;
use segflow_db::models::project::CreateProject;
use segflow_db::models::status::BatchStatus;
use segflow_db::models::user::CreateUser;
use segflow_db::repositories::{
    BatchRepo, DatasetRepo, ImageRepo, MemberRepo, ProjectRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, username: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_project(pool: &PgPool, user_id: DbId, code: &str) -> DbId {
    ProjectRepo::create(
        pool,
        user_id,
        &CreateProject {
            name: format!("Project {code}"),
            code: code.to_string(),
            description: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_dataset(pool: &PgPool, user_id: DbId, project_id: DbId, code: &str) -> DbId {
    DatasetRepo::create(
        pool,
        user_id,
        &CreateDataset {
            project_id,
            name: format!("Dataset {code}"),
            code: code.to_string(),
            storage_path: format!("projects/{project_id}/datasets/{code}"),
        },
    )
    .await
    .unwrap()
    .id
}

fn new_image(dataset_id: DbId, file_name: &str, checksum: &str) -> CreateImage {
    CreateImage {
        dataset_id,
        file_name: file_name.to_string(),
        file_path: format!("original_images/{file_name}"),
        width: 512,
        height: 512,
        file_size_bytes: 2048,
        checksum: checksum.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_project_create_and_list(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let id = seed_project(&pool, user, "seg-001").await;

    let found = ProjectRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(found.code, "seg-001");
    assert_eq!(found.storage_path, "projects/seg-001");

    let all = ProjectRepo::list(&pool).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[sqlx::test]
async fn test_duplicate_project_code_rejected(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    seed_project(&pool, user, "seg-001").await;

    let result = ProjectRepo::create(
        &pool,
        user,
        &CreateProject {
            name: "Second".to_string(),
            code: "seg-001".to_string(),
            description: None,
        },
    )
    .await;

    let err = result.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_projects_code"));
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_dataset_code_unique_per_project(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let p1 = seed_project(&pool, user, "p1").await;
    let p2 = seed_project(&pool, user, "p2").await;

    seed_dataset(&pool, user, p1, "upload_1").await;
    // Same code in another project is fine.
    seed_dataset(&pool, user, p2, "upload_1").await;

    let result = DatasetRepo::create(
        &pool,
        user,
        &CreateDataset {
            project_id: p1,
            name: "Dup".to_string(),
            code: "upload_1".to_string(),
            storage_path: "x".to_string(),
        },
    )
    .await;
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Image deduplication
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_dedup_within_dataset(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let project = seed_project(&pool, user, "p1").await;
    let dataset = seed_dataset(&pool, user, project, "d1").await;

    ImageRepo::create(&pool, &new_image(dataset, "a.png", "abc123"))
        .await
        .unwrap();

    assert!(ImageRepo::exists_by_checksum(&pool, dataset, "abc123")
        .await
        .unwrap());
    assert!(!ImageRepo::exists_by_checksum(&pool, dataset, "other")
        .await
        .unwrap());

    // Same content under a different name still violates the dedup key.
    let result = ImageRepo::create(&pool, &new_image(dataset, "b.png", "abc123")).await;
    let err = result.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_images_dataset_checksum"));

    let all = ImageRepo::list_by_dataset(&pool, dataset).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[sqlx::test]
async fn test_same_content_in_two_datasets_allowed(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let project = seed_project(&pool, user, "p1").await;
    let d1 = seed_dataset(&pool, user, project, "d1").await;
    let d2 = seed_dataset(&pool, user, project, "d2").await;

    ImageRepo::create(&pool, &new_image(d1, "a.png", "abc123"))
        .await
        .unwrap();
    ImageRepo::create(&pool, &new_image(d2, "a.png", "abc123"))
        .await
        .unwrap();

    assert_eq!(ImageRepo::list_by_dataset(&pool, d1).await.unwrap().len(), 1);
    assert_eq!(ImageRepo::list_by_dataset(&pool, d2).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_batch_finalize_is_guarded(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let project = seed_project(&pool, user, "p1").await;
    let dataset = seed_dataset(&pool, user, project, "d1").await;

    let batch = BatchRepo::create(
        &pool,
        &CreateBatch {
            project_id: project,
            dataset_id: dataset,
            batch_code: "upload_20260801_120000_abcd1234".to_string(),
            archive_name: "shots.zip".to_string(),
            uploaded_by: user,
            total_images: 4,
        },
    )
    .await
    .unwrap();
    assert_eq!(batch.status_id, BatchStatus::Processing.id());

    let counts = BatchCounts {
        images_extracted: 2,
        images_failed: 1,
        duplicates_found: 1,
        total_tasks_created: 2,
        assigned_tasks: 2,
        unassigned_tasks: 0,
    };
    let completed = BatchRepo::mark_completed(&pool, batch.id, &counts)
        .await
        .unwrap()
        .expect("processing batch should finalize");
    assert_eq!(completed.status_id, BatchStatus::Completed.id());
    assert_eq!(completed.images_extracted, 2);
    assert_eq!(completed.duplicates_found, 1);
    assert!(completed.completed_at.is_some());

    // A finished batch never moves again.
    let second = BatchRepo::mark_failed(&pool, batch.id, &counts).await.unwrap();
    assert!(second.is_none());
    let reloaded = BatchRepo::find_by_id(&pool, batch.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status_id, BatchStatus::Completed.id());
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_member_upsert_preserves_workload(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let worker = seed_user(&pool, "bob").await;
    let project = seed_project(&pool, user, "p1").await;

    let created = MemberRepo::upsert(
        &pool,
        project,
        &UpsertMember {
            user_id: worker,
            role: ROLE_SEGMENTER.to_string(),
            capacity: 5,
            is_available: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.capacity, 5);
    assert_eq!(created.current_workload, 0);
    assert!(created.is_available);

    sqlx::query("UPDATE project_members SET current_workload = 3 WHERE id = $1")
        .bind(created.id)
        .execute(&pool)
        .await
        .unwrap();

    let updated = MemberRepo::upsert(
        &pool,
        project,
        &UpsertMember {
            user_id: worker,
            role: ROLE_SEGMENTER.to_string(),
            capacity: 8,
            is_available: Some(false),
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.capacity, 8);
    assert!(!updated.is_available);
    // Workload is owned by the assignment path, not the upsert.
    assert_eq!(updated.current_workload, 3);
}
