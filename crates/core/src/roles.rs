//! Well-known project role constants.
//!
//! These must match the role values accepted by the
//! `project_members` table check constraint.

use crate::error::CoreError;

pub const ROLE_SEGMENTER: &str = "segmenter";
pub const ROLE_QC: &str = "qc";
pub const ROLE_QA: &str = "qa";

/// All valid project role values.
pub const VALID_ROLES: &[&str] = &[ROLE_SEGMENTER, ROLE_QC, ROLE_QA];

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), CoreError> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        )))
    }
}
