//! Integration tests for atomic creation-with-assignment.
//!
//! Capacity is never exceeded at any committed state, task creation is
//! all-or-nothing with assignment, and equal pools spread work evenly.

use assert_matches::assert_matches;
use sqlx::PgPool;

use segflow_core::error::CoreError;
use segflow_core::roles::ROLE_SEGMENTER;
use segflow_core::types::DbId;
use segflow_db::error::DbError;
use segflow_db::models::dataset::CreateDataset;
use segflow_db::models::image::CreateImage;
use segflow_db::models::member::UpsertMember;
use segflow_db::models::project::CreateProject;
use segflow_db::models::status::{ImageStatus, TaskPriority, TaskStatus};
use segflow_db::models::user::CreateUser;
use segflow_db::repositories::{
    BatchRepo, DatasetRepo, ImageRepo, MemberRepo, ProjectRepo, TaskRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    project_id: DbId,
    dataset_id: DbId,
    batch_id: DbId,
}

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

async fn seed_pipeline(pool: &PgPool, uploader: DbId) -> Fixture {
    let project = ProjectRepo::create(
        pool,
        uploader,
        &CreateProject {
            name: "Street Scenes".to_string(),
            code: "street".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    let dataset = DatasetRepo::create(
        pool,
        uploader,
        &CreateDataset {
            project_id: project.id,
            name: "Upload 1".to_string(),
            code: "upload_1".to_string(),
            storage_path: "projects/street/datasets/upload_1".to_string(),
        },
    )
    .await
    .unwrap();

    let batch = BatchRepo::create(
        pool,
        &segflow_db::models::batch::CreateBatch {
            project_id: project.id,
            dataset_id: dataset.id,
            batch_code: "upload_20260801_120000_abcd1234".to_string(),
            archive_name: "shots.zip".to_string(),
            uploaded_by: uploader,
            total_images: 0,
        },
    )
    .await
    .unwrap();

    Fixture {
        project_id: project.id,
        dataset_id: dataset.id,
        batch_id: batch.id,
    }
}

async fn seed_worker(pool: &PgPool, project_id: DbId, name: &str, capacity: i32) -> DbId {
    let user_id = seed_user(pool, name).await;
    MemberRepo::upsert(
        pool,
        project_id,
        &UpsertMember {
            user_id,
            role: ROLE_SEGMENTER.to_string(),
            capacity,
            is_available: None,
        },
    )
    .await
    .unwrap();
    user_id
}

async fn seed_images(pool: &PgPool, dataset_id: DbId, count: usize) -> Vec<DbId> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let image = ImageRepo::create(
            pool,
            &CreateImage {
                dataset_id,
                file_name: format!("frame_{i}.png"),
                file_path: format!("original_images/frame_{i}.png"),
                width: 512,
                height: 512,
                file_size_bytes: 2048,
                checksum: format!("checksum_{i}"),
            },
        )
        .await
        .unwrap();
        ids.push(image.id);
    }
    ids
}

async fn workload_of(pool: &PgPool, project_id: DbId, user_id: DbId) -> i32 {
    MemberRepo::find(pool, project_id, user_id)
        .await
        .unwrap()
        .unwrap()
        .current_workload
}

async fn task_count(pool: &PgPool) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_assignment_spreads_equal_pool(pool: PgPool) {
    let uploader = seed_user(&pool, "uploader").await;
    let fx = seed_pipeline(&pool, uploader).await;
    let w1 = seed_worker(&pool, fx.project_id, "w1", 2).await;
    let w2 = seed_worker(&pool, fx.project_id, "w2", 2).await;
    let images = seed_images(&pool, fx.dataset_id, 3).await;

    let outcome = TaskRepo::create_and_assign(
        &pool,
        fx.project_id,
        fx.batch_id,
        ROLE_SEGMENTER,
        &images,
        TaskPriority::Medium,
    )
    .await
    .unwrap();

    assert_eq!(outcome.assigned, 3);
    assert_eq!(outcome.unassigned, 0);
    assert_eq!(outcome.tasks.len(), 3);

    // {2,1} or {1,2} depending on rotation start, never {3,0}.
    let l1 = workload_of(&pool, fx.project_id, w1).await;
    let l2 = workload_of(&pool, fx.project_id, w2).await;
    let mut loads = [l1, l2];
    loads.sort();
    assert_eq!(loads, [1, 2]);

    for task in &outcome.tasks {
        assert_eq!(task.status_id, TaskStatus::Assigned.id());
        assert_eq!(task.segmenter_id, task.assigned_to);
        let image = ImageRepo::find_by_id(&pool, task.image_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(image.status_id, ImageStatus::Assigned.id());
    }
}

#[sqlx::test]
async fn test_capacity_is_never_exceeded(pool: PgPool) {
    let uploader = seed_user(&pool, "uploader").await;
    let fx = seed_pipeline(&pool, uploader).await;
    let w1 = seed_worker(&pool, fx.project_id, "w1", 1).await;
    let w2 = seed_worker(&pool, fx.project_id, "w2", 3).await;
    let images = seed_images(&pool, fx.dataset_id, 6).await;

    let outcome = TaskRepo::create_and_assign(
        &pool,
        fx.project_id,
        fx.batch_id,
        ROLE_SEGMENTER,
        &images,
        TaskPriority::Medium,
    )
    .await
    .unwrap();

    // Pool holds 4 slots; two images stay unassigned with no task rows.
    assert_eq!(outcome.assigned, 4);
    assert_eq!(outcome.unassigned, 2);
    assert_eq!(task_count(&pool).await, 4);

    assert_eq!(workload_of(&pool, fx.project_id, w1).await, 1);
    assert_eq!(workload_of(&pool, fx.project_id, w2).await, 3);
}

#[sqlx::test]
async fn test_empty_pool_commits_nothing(pool: PgPool) {
    let uploader = seed_user(&pool, "uploader").await;
    let fx = seed_pipeline(&pool, uploader).await;
    let images = seed_images(&pool, fx.dataset_id, 2).await;

    let result = TaskRepo::create_and_assign(
        &pool,
        fx.project_id,
        fx.batch_id,
        ROLE_SEGMENTER,
        &images,
        TaskPriority::Medium,
    )
    .await;

    assert_matches!(result, Err(DbError::Domain(CoreError::Conflict(_))));
    assert_eq!(task_count(&pool).await, 0);
}

#[sqlx::test]
async fn test_unavailable_and_full_workers_excluded(pool: PgPool) {
    let uploader = seed_user(&pool, "uploader").await;
    let fx = seed_pipeline(&pool, uploader).await;

    let away = seed_user(&pool, "away").await;
    MemberRepo::upsert(
        &pool,
        fx.project_id,
        &UpsertMember {
            user_id: away,
            role: ROLE_SEGMENTER.to_string(),
            capacity: 10,
            is_available: Some(false),
        },
    )
    .await
    .unwrap();
    let active = seed_worker(&pool, fx.project_id, "active", 5).await;

    let images = seed_images(&pool, fx.dataset_id, 3).await;
    let outcome = TaskRepo::create_and_assign(
        &pool,
        fx.project_id,
        fx.batch_id,
        ROLE_SEGMENTER,
        &images,
        TaskPriority::High,
    )
    .await
    .unwrap();

    assert_eq!(outcome.assigned, 3);
    for task in &outcome.tasks {
        assert_eq!(task.assigned_to, active);
    }
    assert_eq!(workload_of(&pool, fx.project_id, away).await, 0);
}

#[sqlx::test]
async fn test_workload_increments_equal_tasks_created(pool: PgPool) {
    let uploader = seed_user(&pool, "uploader").await;
    let fx = seed_pipeline(&pool, uploader).await;
    seed_worker(&pool, fx.project_id, "w1", 4).await;
    seed_worker(&pool, fx.project_id, "w2", 4).await;
    seed_worker(&pool, fx.project_id, "w3", 4).await;
    let images = seed_images(&pool, fx.dataset_id, 7).await;

    let outcome = TaskRepo::create_and_assign(
        &pool,
        fx.project_id,
        fx.batch_id,
        ROLE_SEGMENTER,
        &images,
        TaskPriority::Medium,
    )
    .await
    .unwrap();

    let total: (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(current_workload), 0) FROM project_members")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(total.0 as usize, outcome.tasks.len());

    // Equal pool: each worker gains floor(7/3) or floor(7/3) + 1.
    let loads: Vec<(i32,)> =
        sqlx::query_as("SELECT current_workload FROM project_members ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert!(loads.iter().all(|(l,)| *l == 2 || *l == 3));
}
