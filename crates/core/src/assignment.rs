//! Capacity-bounded round-robin assignment planning.
//!
//! Pure planning half of the assignment scheduler: given a snapshot of
//! locked worker-capacity rows, decide which worker receives each task.
//! The database half (row locking, task inserts, workload updates) lives
//! in `segflow_db::repositories::TaskRepo`.
//!
//! The rotation cursor is ordinary call-scoped loop state threaded
//! through one invocation; it is never stored globally, so concurrent
//! planner calls share no mutable state.

use serde::Serialize;

use crate::types::DbId;

/// Snapshot of one candidate worker's capacity row.
///
/// Callers supply slots ordered least-loaded first; the planner preserves
/// that order and starts its rotation at the first slot.
#[derive(Debug, Clone)]
pub struct WorkerSlot {
    /// Primary key of the capacity row (for the follow-up workload update).
    pub member_id: DbId,
    /// The worker receiving tasks.
    pub user_id: DbId,
    /// Maximum concurrently active tasks for this worker.
    pub capacity: i32,
    /// Active task count; incremented locally as the plan is built so
    /// later tasks observe earlier picks.
    pub current_workload: i32,
}

impl WorkerSlot {
    /// Whether this worker can take one more task.
    pub fn has_room(&self) -> bool {
        self.current_workload < self.capacity
    }
}

/// Result of planning one batch of task assignments.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentPlan {
    /// For each task in input order, the index of the chosen slot, or
    /// `None` when no candidate had room after a full rotation.
    pub choices: Vec<Option<usize>>,
}

impl AssignmentPlan {
    pub fn assigned_count(&self) -> usize {
        self.choices.iter().filter(|c| c.is_some()).count()
    }

    pub fn unassigned_count(&self) -> usize {
        self.choices.len() - self.assigned_count()
    }
}

/// Plan assignments for `task_count` tasks over the given worker slots.
///
/// For each task the planner scans up to `slots.len()` candidates in
/// round-robin order starting from a rotating cursor, picks the first
/// with spare capacity, increments that slot's workload, and advances
/// the cursor past the assignee. A task with no qualifying candidate is
/// recorded as unassigned; with a correctly-guarded pool (every slot
/// pre-filtered to `current_workload < capacity`) this branch is only
/// reachable once the batch itself fills the pool.
pub fn plan_assignments(slots: &mut [WorkerSlot], task_count: usize) -> AssignmentPlan {
    let mut choices = Vec::with_capacity(task_count);

    if slots.is_empty() {
        choices.resize(task_count, None);
        return AssignmentPlan { choices };
    }

    let mut cursor = 0usize;

    for _ in 0..task_count {
        let mut chosen = None;

        for probe in 0..slots.len() {
            let idx = (cursor + probe) % slots.len();
            if slots[idx].has_room() {
                slots[idx].current_workload += 1;
                cursor = (idx + 1) % slots.len();
                chosen = Some(idx);
                break;
            }
        }

        choices.push(chosen);
    }

    AssignmentPlan { choices }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(member_id: DbId, capacity: i32, workload: i32) -> WorkerSlot {
        WorkerSlot {
            member_id,
            user_id: member_id + 100,
            capacity,
            current_workload: workload,
        }
    }

    #[test]
    fn empty_pool_assigns_nothing() {
        let mut slots: Vec<WorkerSlot> = Vec::new();
        let plan = plan_assignments(&mut slots, 3);
        assert_eq!(plan.choices, vec![None, None, None]);
        assert_eq!(plan.unassigned_count(), 3);
    }

    #[test]
    fn round_robin_spreads_equal_loads() {
        let mut slots = vec![slot(1, 2, 0), slot(2, 2, 0)];
        let plan = plan_assignments(&mut slots, 3);

        assert_eq!(plan.assigned_count(), 3);
        // Rotation starts at the first slot: 0, 1, 0.
        assert_eq!(plan.choices, vec![Some(0), Some(1), Some(0)]);
        assert_eq!(slots[0].current_workload, 2);
        assert_eq!(slots[1].current_workload, 1);
    }

    #[test]
    fn equal_pool_even_division() {
        let mut slots = vec![slot(1, 10, 0), slot(2, 10, 0), slot(3, 10, 0)];
        let plan = plan_assignments(&mut slots, 6);

        assert_eq!(plan.assigned_count(), 6);
        for s in &slots {
            assert_eq!(s.current_workload, 2);
        }
    }

    #[test]
    fn fairness_within_one_task() {
        // M tasks over N equally-loaded workers: each gains floor(M/N)
        // or floor(M/N) + 1.
        let mut slots = vec![slot(1, 20, 0), slot(2, 20, 0), slot(3, 20, 0)];
        let plan = plan_assignments(&mut slots, 8);

        assert_eq!(plan.assigned_count(), 8);
        let loads: Vec<i32> = slots.iter().map(|s| s.current_workload).collect();
        assert!(loads.iter().all(|&l| l == 2 || l == 3), "loads: {loads:?}");
        assert_eq!(loads.iter().sum::<i32>(), 8);
    }

    #[test]
    fn full_worker_is_skipped() {
        let mut slots = vec![slot(1, 1, 0), slot(2, 5, 0)];
        let plan = plan_assignments(&mut slots, 4);

        assert_eq!(plan.assigned_count(), 4);
        assert_eq!(slots[0].current_workload, 1);
        assert_eq!(slots[1].current_workload, 3);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut slots = vec![slot(1, 2, 1), slot(2, 3, 1)];
        let plan = plan_assignments(&mut slots, 10);

        // One slot of room in the first worker, two in the second.
        assert_eq!(plan.assigned_count(), 3);
        assert_eq!(plan.unassigned_count(), 7);
        for s in &slots {
            assert!(s.current_workload <= s.capacity);
        }
    }

    #[test]
    fn saturated_pool_leaves_tasks_unassigned() {
        let mut slots = vec![slot(1, 1, 1), slot(2, 2, 2)];
        let plan = plan_assignments(&mut slots, 2);

        assert_eq!(plan.assigned_count(), 0);
        assert_eq!(plan.choices, vec![None, None]);
    }

    #[test]
    fn workload_increments_equal_assigned_count() {
        let mut slots = vec![slot(1, 4, 1), slot(2, 4, 2), slot(3, 4, 3)];
        let before: i32 = slots.iter().map(|s| s.current_workload).sum();
        let plan = plan_assignments(&mut slots, 5);
        let after: i32 = slots.iter().map(|s| s.current_workload).sum();

        assert_eq!((after - before) as usize, plan.assigned_count());
    }

    #[test]
    fn cursor_is_deterministic_across_calls() {
        let mut a = vec![slot(1, 9, 0), slot(2, 9, 0)];
        let mut b = vec![slot(1, 9, 0), slot(2, 9, 0)];
        let plan_a = plan_assignments(&mut a, 5);
        let plan_b = plan_assignments(&mut b, 5);
        assert_eq!(plan_a.choices, plan_b.choices);
    }
}
