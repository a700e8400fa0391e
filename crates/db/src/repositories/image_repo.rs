//! Repository for the `images` table.

use sqlx::PgPool;

use segflow_core::types::DbId;

use crate::models::image::{CreateImage, Image};
use crate::models::status::{ImageStatus, StatusId};

/// Column list for `images` queries.
const COLUMNS: &str = "\
    id, dataset_id, file_name, file_path, width, height, \
    file_size_bytes, checksum, status_id, created_at, updated_at";

/// Provides CRUD operations for source images.
pub struct ImageRepo;

impl ImageRepo {
    /// Insert an accepted image in `Uploaded` status.
    ///
    /// The `uq_images_dataset_checksum` constraint rejects duplicate
    /// content within a dataset; callers treat that violation as an
    /// expected dedup outcome, not a failure.
    pub async fn create(pool: &PgPool, input: &CreateImage) -> Result<Image, sqlx::Error> {
        let query = format!(
            "INSERT INTO images \
                 (dataset_id, file_name, file_path, width, height, \
                  file_size_bytes, checksum, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(input.dataset_id)
            .bind(&input.file_name)
            .bind(&input.file_path)
            .bind(input.width)
            .bind(input.height)
            .bind(input.file_size_bytes)
            .bind(&input.checksum)
            .bind(ImageStatus::Uploaded.id())
            .fetch_one(pool)
            .await
    }

    /// Whether the dataset already holds content with this fingerprint.
    pub async fn exists_by_checksum(
        pool: &PgPool,
        dataset_id: DbId,
        checksum: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM images WHERE dataset_id = $1 AND checksum = $2)",
        )
        .bind(dataset_id)
        .bind(checksum)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Find an image by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images WHERE id = $1");
        sqlx::query_as::<_, Image>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a dataset's images in upload order.
    pub async fn list_by_dataset(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images WHERE dataset_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, Image>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await
    }

    /// Update an image's lifecycle status.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE images SET status_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
