//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table. Task and batch
//! transitions are validated against explicit allowed-transition tables,
//! never written as free-form assignments.

use segflow_core::error::CoreError;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Map a database status ID back to the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Project lifecycle status.
    ProjectStatus {
        Active = 1,
        OnHold = 2,
        Archived = 3,
    }
}

define_status_enum! {
    /// Dataset lifecycle status.
    DatasetStatus {
        Active = 1,
        Archived = 2,
    }
}

define_status_enum! {
    /// Batch ingestion run status.
    BatchStatus {
        Pending = 1,
        Processing = 2,
        Completed = 3,
        Failed = 4,
    }
}

define_status_enum! {
    /// Source image lifecycle status.
    ImageStatus {
        Uploaded = 1,
        Assigned = 2,
        InProgress = 3,
        Completed = 4,
        Archived = 5,
        Failed = 6,
    }
}

define_status_enum! {
    /// Annotation task lifecycle status.
    TaskStatus {
        Pending = 1,
        Assigned = 2,
        InProgress = 3,
        Submitted = 4,
        QaReview = 5,
        QcReview = 6,
        Completed = 7,
        Rejected = 8,
    }
}

define_status_enum! {
    /// Task priority level.
    TaskPriority {
        Low = 1,
        Medium = 2,
        High = 3,
        Urgent = 4,
    }
}

impl BatchStatus {
    /// Batch status only ever moves forward: PENDING → PROCESSING →
    /// {COMPLETED, FAILED}. Terminal states allow nothing.
    pub fn can_transition_to(self, next: BatchStatus) -> bool {
        matches!(
            (self, next),
            (BatchStatus::Pending, BatchStatus::Processing)
                | (BatchStatus::Processing, BatchStatus::Completed)
                | (BatchStatus::Processing, BatchStatus::Failed)
        )
    }
}

impl TaskStatus {
    /// Allowed task transitions.
    ///
    /// PENDING → ASSIGNED → IN_PROGRESS → SUBMITTED → QA_REVIEW →
    /// {COMPLETED, QC_REVIEW}; QC_REVIEW reopens to IN_PROGRESS; REJECTED
    /// is the administrative terminal-pending-rework marker reachable from
    /// either review state. COMPLETED allows nothing.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Assigned)
                | (TaskStatus::Assigned, TaskStatus::InProgress)
                | (TaskStatus::InProgress, TaskStatus::Submitted)
                | (TaskStatus::Submitted, TaskStatus::QaReview)
                | (TaskStatus::QaReview, TaskStatus::Completed)
                | (TaskStatus::QaReview, TaskStatus::QcReview)
                | (TaskStatus::QcReview, TaskStatus::InProgress)
                | (TaskStatus::QaReview, TaskStatus::Rejected)
                | (TaskStatus::QcReview, TaskStatus::Rejected)
        )
    }
}

/// Validate a task transition, returning a conflict error on violation.
pub fn ensure_task_transition(from: TaskStatus, to: TaskStatus) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Invalid task transition {from:?} -> {to:?}"
        )))
    }
}
