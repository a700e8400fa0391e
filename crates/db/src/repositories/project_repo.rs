//! Repository for the `projects` table.

use sqlx::PgPool;

use segflow_core::types::DbId;

use crate::models::project::{CreateProject, Project};
use crate::models::status::ProjectStatus;

/// Column list for `projects` queries.
const COLUMNS: &str = "\
    id, name, code, description, status_id, storage_path, \
    created_by, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Create an active project. Storage is rooted at `projects/{code}`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, code, description, status_id, storage_path, created_by) \
             VALUES ($1, $2, $3, $4, 'projects/' || $2, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.code)
            .bind(&input.description)
            .bind(ProjectStatus::Active.id())
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }
}
