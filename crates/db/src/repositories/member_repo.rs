//! Repository for the `project_members` table (worker capacity rows).

use sqlx::PgPool;

use segflow_core::types::DbId;

use crate::models::member::{ProjectMember, UpsertMember};

/// Column list for `project_members` queries.
pub(crate) const COLUMNS: &str = "\
    id, project_id, user_id, role, capacity, current_workload, \
    is_available, created_at, updated_at";

/// Provides CRUD operations for worker capacity rows.
pub struct MemberRepo;

impl MemberRepo {
    /// Insert or update a member's role, capacity, and availability.
    ///
    /// `current_workload` is never touched here; it is owned by the
    /// assignment and review paths.
    pub async fn upsert(
        pool: &PgPool,
        project_id: DbId,
        input: &UpsertMember,
    ) -> Result<ProjectMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_members \
                 (project_id, user_id, role, capacity, is_available) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (project_id, user_id) DO UPDATE \
             SET role = EXCLUDED.role, capacity = EXCLUDED.capacity, \
                 is_available = EXCLUDED.is_available, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .bind(input.user_id)
            .bind(&input.role)
            .bind(input.capacity)
            .bind(input.is_available.unwrap_or(true))
            .fetch_one(pool)
            .await
    }

    /// List a project's members, least-loaded first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ProjectMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_members \
             WHERE project_id = $1 \
             ORDER BY current_workload ASC, id ASC"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find the capacity row for one (project, user) pair.
    pub async fn find(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ProjectMember>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM project_members WHERE project_id = $1 AND user_id = $2");
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
