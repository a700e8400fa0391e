//! Repository for the `tasks` table: atomic creation-with-assignment
//! and the task lifecycle state machine.
//!
//! Assignment and every lifecycle transition run inside a single
//! transaction with the affected rows locked `FOR UPDATE`, so capacity
//! and status invariants hold at every commit point.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use segflow_core::assignment::{plan_assignments, WorkerSlot};
use segflow_core::error::CoreError;
use segflow_core::review::{
    DECISION_APPROVED, DECISION_REJECT_EDIT, REVIEW_TYPE_QA,
};
use segflow_core::types::{DbId, Timestamp};

use crate::error::DbError;
use crate::models::member::ProjectMember;
use crate::models::status::{ensure_task_transition, ImageStatus, TaskPriority, TaskStatus};
use crate::models::task::{Task, TaskListQuery};
use crate::repositories::member_repo;

/// Column list for `tasks` queries.
const COLUMNS: &str = "\
    id, image_id, batch_id, segmenter_id, assigned_to, status_id, \
    priority_id, start_time, end_time, total_duration_secs, feedback, \
    mask_path, metadata_path, created_at, updated_at";

/// Maximum page size for task listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for task listing.
const DEFAULT_LIMIT: i64 = 50;

/// Result of one atomic creation-with-assignment run.
#[derive(Debug, Serialize)]
pub struct AssignmentOutcome {
    pub tasks: Vec<Task>,
    pub assigned: usize,
    pub unassigned: usize,
}

impl AssignmentOutcome {
    fn empty() -> Self {
        AssignmentOutcome {
            tasks: Vec::new(),
            assigned: 0,
            unassigned: 0,
        }
    }
}

/// Provides lifecycle operations for annotation tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Create one task per image and assign each to a worker, atomically.
    ///
    /// Locks all available capacity rows for the project/role with
    /// `FOR UPDATE` (least-loaded first), plans the round-robin spread,
    /// inserts the task rows, and applies guarded workload increments.
    /// An empty pool rolls back with a conflict error and zero tasks
    /// committed; a guarded increment that would exceed capacity rolls
    /// back the whole run the same way.
    pub async fn create_and_assign(
        pool: &PgPool,
        project_id: DbId,
        batch_id: DbId,
        role: &str,
        image_ids: &[DbId],
        priority: TaskPriority,
    ) -> Result<AssignmentOutcome, DbError> {
        if image_ids.is_empty() {
            return Ok(AssignmentOutcome::empty());
        }

        let mut tx = pool.begin().await?;

        let lock_query = format!(
            "SELECT {} FROM project_members \
             WHERE project_id = $1 AND role = $2 \
               AND is_available AND current_workload < capacity \
             ORDER BY current_workload ASC, id ASC \
             FOR UPDATE",
            member_repo::COLUMNS
        );
        let members: Vec<ProjectMember> = sqlx::query_as(&lock_query)
            .bind(project_id)
            .bind(role)
            .fetch_all(&mut *tx)
            .await?;

        if members.is_empty() {
            return Err(CoreError::Conflict(format!(
                "No available {role} workers with spare capacity in project {project_id}"
            ))
            .into());
        }

        let mut slots: Vec<WorkerSlot> = members
            .iter()
            .map(|m| WorkerSlot {
                member_id: m.id,
                user_id: m.user_id,
                capacity: m.capacity,
                current_workload: m.current_workload,
            })
            .collect();
        let plan = plan_assignments(&mut slots, image_ids.len());

        let insert_query = format!(
            "INSERT INTO tasks \
                 (image_id, batch_id, segmenter_id, assigned_to, \
                  status_id, priority_id) \
             VALUES ($1, $2, $3, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );

        let mut tasks = Vec::with_capacity(image_ids.len());
        for (image_id, choice) in image_ids.iter().zip(plan.choices.iter()) {
            let Some(slot_idx) = choice else {
                continue;
            };
            let worker = slots[*slot_idx].user_id;

            let task: Task = sqlx::query_as(&insert_query)
                .bind(image_id)
                .bind(batch_id)
                .bind(worker)
                .bind(TaskStatus::Assigned.id())
                .bind(priority.id())
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query("UPDATE images SET status_id = $2, updated_at = NOW() WHERE id = $1")
                .bind(image_id)
                .bind(ImageStatus::Assigned.id())
                .execute(&mut *tx)
                .await?;

            tasks.push(task);
        }

        // Guarded increments: the WHERE clause re-checks capacity so a
        // violation can never commit.
        for (slot, before) in slots.iter().zip(members.iter()) {
            let delta = slot.current_workload - before.current_workload;
            if delta == 0 {
                continue;
            }
            let updated = sqlx::query(
                "UPDATE project_members \
                 SET current_workload = current_workload + $2, updated_at = NOW() \
                 WHERE id = $1 AND current_workload + $2 <= capacity",
            )
            .bind(slot.member_id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() != 1 {
                return Err(CoreError::Conflict(format!(
                    "Workload increment would exceed capacity for member {}",
                    slot.member_id
                ))
                .into());
            }
        }

        tx.commit().await?;

        tracing::debug!(
            project_id,
            batch_id,
            workers = members.len(),
            assigned = plan.assigned_count(),
            unassigned = plan.unassigned_count(),
            "Assigned batch tasks"
        );

        Ok(AssignmentOutcome {
            assigned: plan.assigned_count(),
            unassigned: plan.unassigned_count(),
            tasks,
        })
    }

    /// Find a task by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tasks with optional worker/status filters.
    ///
    /// A worker filter without an explicit status restricts to the
    /// active worklist (ASSIGNED and IN_PROGRESS), highest priority
    /// first.
    pub async fn list(pool: &PgPool, params: &TaskListQuery) -> Result<Vec<Task>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);

        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if params.assigned_to.is_some() {
            conditions.push(format!("assigned_to = ${bind_idx}"));
            bind_idx += 1;
        }

        if params.status_id.is_some() {
            conditions.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        } else if params.assigned_to.is_some() {
            conditions.push(format!(
                "status_id IN ({}, {})",
                TaskStatus::Assigned.id(),
                TaskStatus::InProgress.id()
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             {where_clause} \
             ORDER BY priority_id DESC, created_at ASC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, Task>(&query);

        if let Some(uid) = params.assigned_to {
            q = q.bind(uid);
        }
        if let Some(sid) = params.status_id {
            q = q.bind(sid);
        }

        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// Open a task for work.
    ///
    /// ASSIGNED starts the clock (`start_time = now`); reopening from
    /// QC_REVIEW resets the clock, clearing `end_time` and the prior
    /// duration so each attempt is timed independently. A task already
    /// IN_PROGRESS is returned unchanged.
    pub async fn open(pool: &PgPool, task_id: DbId, actor_id: DbId) -> Result<Task, DbError> {
        let mut tx = pool.begin().await?;

        let task = Self::lock(&mut tx, task_id).await?;
        if !task.held_by(actor_id) {
            return Err(CoreError::Forbidden(format!(
                "User {actor_id} does not hold task {task_id}"
            ))
            .into());
        }

        let status = Self::status_of(&task)?;
        let updated = match status {
            TaskStatus::InProgress => task,
            TaskStatus::Assigned => {
                ensure_task_transition(status, TaskStatus::InProgress)?;
                let query = format!(
                    "UPDATE tasks \
                     SET status_id = $2, start_time = NOW(), updated_at = NOW() \
                     WHERE id = $1 \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as(&query)
                    .bind(task_id)
                    .bind(TaskStatus::InProgress.id())
                    .fetch_one(&mut *tx)
                    .await?
            }
            TaskStatus::QcReview => {
                ensure_task_transition(status, TaskStatus::InProgress)?;
                let query = format!(
                    "UPDATE tasks \
                     SET status_id = $2, start_time = NOW(), end_time = NULL, \
                         total_duration_secs = NULL, updated_at = NOW() \
                     WHERE id = $1 \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as(&query)
                    .bind(task_id)
                    .bind(TaskStatus::InProgress.id())
                    .fetch_one(&mut *tx)
                    .await?
            }
            other => {
                return Err(CoreError::Conflict(format!(
                    "Task {task_id} cannot be opened from {other:?}"
                ))
                .into());
            }
        };

        tx.commit().await?;
        Ok(updated)
    }

    /// Save in-progress artifact paths. Status and timestamps are
    /// untouched.
    pub async fn save_progress(
        pool: &PgPool,
        task_id: DbId,
        actor_id: DbId,
        mask_path: &str,
        metadata_path: &str,
    ) -> Result<Task, DbError> {
        let mut tx = pool.begin().await?;

        let task = Self::lock(&mut tx, task_id).await?;
        if !task.held_by(actor_id) {
            return Err(CoreError::Forbidden(format!(
                "User {actor_id} does not hold task {task_id}"
            ))
            .into());
        }
        if Self::status_of(&task)? != TaskStatus::InProgress {
            return Err(CoreError::Conflict(format!(
                "Task {task_id} is not in progress"
            ))
            .into());
        }

        let updated = Self::write_artifact_paths(&mut tx, task_id, mask_path, metadata_path).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Record artifact paths on behalf of a reviewer draft-save. No
    /// holder or status check; reviewers act independent of assignment.
    pub async fn set_artifact_paths(
        pool: &PgPool,
        task_id: DbId,
        mask_path: &str,
        metadata_path: &str,
    ) -> Result<Task, DbError> {
        let mut tx = pool.begin().await?;
        Self::lock(&mut tx, task_id).await?;
        let updated = Self::write_artifact_paths(&mut tx, task_id, mask_path, metadata_path).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Submit a task for review.
    ///
    /// Requires a saved mask artifact; sets `end_time = now` and derives
    /// the duration from `start_time` when it is set.
    pub async fn submit(pool: &PgPool, task_id: DbId, actor_id: DbId) -> Result<Task, DbError> {
        let mut tx = pool.begin().await?;

        let task = Self::lock(&mut tx, task_id).await?;
        if !task.held_by(actor_id) {
            return Err(CoreError::Forbidden(format!(
                "User {actor_id} does not hold task {task_id}"
            ))
            .into());
        }
        if task.mask_path.is_none() {
            return Err(CoreError::Validation(format!(
                "Task {task_id} has no saved mask; submit requires one"
            ))
            .into());
        }
        ensure_task_transition(Self::status_of(&task)?, TaskStatus::Submitted)?;

        let query = format!(
            "UPDATE tasks \
             SET status_id = $2, end_time = NOW(), \
                 total_duration_secs = CASE WHEN start_time IS NOT NULL \
                     THEN EXTRACT(EPOCH FROM NOW() - start_time)::INTEGER END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated: Task = sqlx::query_as(&query)
            .bind(task_id)
            .bind(TaskStatus::Submitted.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Claim a submitted task for review: SUBMITTED moves to QA_REVIEW.
    /// Claiming an already-claimed task is a no-op, so two reviewers
    /// racing for the same task both land on it cleanly.
    pub async fn begin_review(pool: &PgPool, task_id: DbId) -> Result<Task, DbError> {
        let mut tx = pool.begin().await?;

        let task = Self::lock(&mut tx, task_id).await?;
        let status = Self::status_of(&task)?;
        if status == TaskStatus::QaReview {
            tx.commit().await?;
            return Ok(task);
        }
        ensure_task_transition(status, TaskStatus::QaReview)?;

        let query = format!(
            "UPDATE tasks \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated: Task = sqlx::query_as(&query)
            .bind(task_id)
            .bind(TaskStatus::QaReview.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Approve a submitted task: COMPLETED, feedback cleared, review
    /// record appended, and the worker's active-task count released.
    pub async fn approve(
        pool: &PgPool,
        task_id: DbId,
        reviewer_id: DbId,
        comments: Option<&str>,
        review_started_at: Option<Timestamp>,
    ) -> Result<Task, DbError> {
        let mut tx = pool.begin().await?;

        let task = Self::lock(&mut tx, task_id).await?;
        Self::ensure_reviewable(&task, task_id)?;

        let query = format!(
            "UPDATE tasks \
             SET status_id = $2, feedback = NULL, end_time = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated: Task = sqlx::query_as(&query)
            .bind(task_id)
            .bind(TaskStatus::Completed.id())
            .fetch_one(&mut *tx)
            .await?;

        Self::append_review(
            &mut tx,
            task_id,
            reviewer_id,
            DECISION_APPROVED,
            comments,
            review_started_at,
        )
        .await?;

        // Completion frees a slot for the worker who held the task.
        sqlx::query(
            "UPDATE project_members \
             SET current_workload = current_workload - 1, updated_at = NOW() \
             WHERE user_id = $1 AND current_workload > 0 \
               AND project_id = (SELECT project_id FROM batches WHERE id = $2)",
        )
        .bind(task.assigned_to)
        .bind(task.batch_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Reject a submitted task back to rework: QC_REVIEW, comments stored
    /// as feedback, `end_time` left unset, review record appended.
    pub async fn reject(
        pool: &PgPool,
        task_id: DbId,
        reviewer_id: DbId,
        comments: &str,
        review_started_at: Option<Timestamp>,
    ) -> Result<Task, DbError> {
        let mut tx = pool.begin().await?;

        let task = Self::lock(&mut tx, task_id).await?;
        Self::ensure_reviewable(&task, task_id)?;

        let query = format!(
            "UPDATE tasks \
             SET status_id = $2, feedback = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated: Task = sqlx::query_as(&query)
            .bind(task_id)
            .bind(TaskStatus::QcReview.id())
            .bind(comments)
            .fetch_one(&mut *tx)
            .await?;

        Self::append_review(
            &mut tx,
            task_id,
            reviewer_id,
            DECISION_REJECT_EDIT,
            Some(comments),
            review_started_at,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Fetch a task row with a row lock, or fail with not-found.
    async fn lock(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        task_id: DbId,
    ) -> Result<Task, DbError> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| DbError::not_found("task", task_id))
    }

    fn status_of(task: &Task) -> Result<TaskStatus, DbError> {
        TaskStatus::from_id(task.status_id).ok_or_else(|| {
            DbError::Domain(CoreError::Internal(format!(
                "Task {} has unknown status id {}",
                task.id, task.status_id
            )))
        })
    }

    /// A review decision applies to a task sitting in SUBMITTED or
    /// QA_REVIEW; anything else is a conflict.
    fn ensure_reviewable(task: &Task, task_id: DbId) -> Result<(), DbError> {
        let status = Self::status_of(task)?;
        if matches!(status, TaskStatus::Submitted | TaskStatus::QaReview) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Task {task_id} is not awaiting review (status {status:?})"
            ))
            .into())
        }
    }

    async fn write_artifact_paths(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        task_id: DbId,
        mask_path: &str,
        metadata_path: &str,
    ) -> Result<Task, DbError> {
        let query = format!(
            "UPDATE tasks \
             SET mask_path = $2, metadata_path = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as(&query)
            .bind(task_id)
            .bind(mask_path)
            .bind(metadata_path)
            .fetch_one(&mut **tx)
            .await?;
        Ok(updated)
    }

    async fn append_review(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        task_id: DbId,
        reviewer_id: DbId,
        decision: &str,
        comments: Option<&str>,
        review_started_at: Option<Timestamp>,
    ) -> Result<(), DbError> {
        let now = Utc::now();
        let duration_secs =
            review_started_at.map(|start| (now - start).num_seconds().max(0) as i32);
        let end_time = review_started_at.map(|_| now);

        sqlx::query(
            "INSERT INTO task_reviews \
                 (task_id, reviewer_id, review_type, decision, comments, \
                  start_time, end_time, duration_secs) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(task_id)
        .bind(reviewer_id)
        .bind(REVIEW_TYPE_QA)
        .bind(decision)
        .bind(comments)
        .bind(review_started_at)
        .bind(end_time)
        .bind(duration_secs)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
