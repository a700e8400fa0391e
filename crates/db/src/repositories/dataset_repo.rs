//! Repository for the `datasets` table.

use sqlx::PgPool;

use segflow_core::types::DbId;

use crate::models::dataset::{CreateDataset, Dataset};
use crate::models::status::DatasetStatus;

/// Column list for `datasets` queries.
const COLUMNS: &str = "\
    id, project_id, name, code, status_id, storage_path, \
    created_by, created_at, updated_at";

/// Provides CRUD operations for datasets.
pub struct DatasetRepo;

impl DatasetRepo {
    /// Create an active dataset for an ingestion batch.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateDataset,
    ) -> Result<Dataset, sqlx::Error> {
        let query = format!(
            "INSERT INTO datasets (project_id, name, code, status_id, storage_path, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(&input.code)
            .bind(DatasetStatus::Active.id())
            .bind(&input.storage_path)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a dataset by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Dataset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets WHERE id = $1");
        sqlx::query_as::<_, Dataset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's datasets, newest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Dataset>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM datasets WHERE project_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, Dataset>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
