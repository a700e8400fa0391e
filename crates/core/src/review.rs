//! Review type, decision, and action constants with validation helpers.
//!
//! Defines the vocabulary shared by the DB and API layers for QC/QA
//! review records and the review-action endpoint.

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Maximum length for reviewer comments.
pub const MAX_COMMENT_LENGTH: usize = 10_000;

/// Quality-control review (post-rejection rework loop).
pub const REVIEW_TYPE_QC: &str = "QC";

/// Quality-assurance review (first-pass decision on submitted work).
pub const REVIEW_TYPE_QA: &str = "QA";

/// All valid review type values.
pub const VALID_REVIEW_TYPES: &[&str] = &[REVIEW_TYPE_QC, REVIEW_TYPE_QA];

/// Work accepted as-is.
pub const DECISION_APPROVED: &str = "APPROVED";

/// Work rejected, existing annotation to be corrected.
pub const DECISION_REJECT_EDIT: &str = "REJECT_EDIT";

/// Work rejected, annotation to be redone from scratch.
pub const DECISION_REJECT_REDO: &str = "REJECT_REDO";

/// All valid decision values.
pub const VALID_DECISIONS: &[&str] =
    &[DECISION_APPROVED, DECISION_REJECT_EDIT, DECISION_REJECT_REDO];

/// Review action: accept the work and complete the task.
pub const ACTION_APPROVE: &str = "approve";

/// Review action: send the work back with feedback.
pub const ACTION_REJECT: &str = "reject";

/// Review action: persist reviewer edits without a decision.
pub const ACTION_SAVE: &str = "save";

/// All valid review action values.
pub const VALID_ACTIONS: &[&str] = &[ACTION_APPROVE, ACTION_REJECT, ACTION_SAVE];

/* --------------------------------------------------------------------------
Validation functions
-------------------------------------------------------------------------- */

/// Validate that a review type string is one of the accepted values.
pub fn validate_review_type(review_type: &str) -> Result<(), CoreError> {
    if VALID_REVIEW_TYPES.contains(&review_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid review type '{review_type}'. Must be one of: {}",
            VALID_REVIEW_TYPES.join(", ")
        )))
    }
}

/// Validate that a decision string is one of the accepted values.
pub fn validate_decision(decision: &str) -> Result<(), CoreError> {
    if VALID_DECISIONS.contains(&decision) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid decision '{decision}'. Must be one of: {}",
            VALID_DECISIONS.join(", ")
        )))
    }
}

/// Validate that a review action string is one of the accepted values.
pub fn validate_action(action: &str) -> Result<(), CoreError> {
    if VALID_ACTIONS.contains(&action) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid review action '{action}'. Must be one of: {}",
            VALID_ACTIONS.join(", ")
        )))
    }
}

/// Validate reviewer comments: required and non-blank for rejections.
pub fn validate_reject_comments(comments: &Option<String>) -> Result<(), CoreError> {
    let has_text = comments.as_ref().is_some_and(|c| !c.trim().is_empty());
    if !has_text {
        return Err(CoreError::Validation(
            "A rejection must include reviewer comments".to_string(),
        ));
    }

    if let Some(c) = comments {
        if c.len() > MAX_COMMENT_LENGTH {
            return Err(CoreError::Validation(format!(
                "Comments exceed maximum length of {MAX_COMMENT_LENGTH} characters"
            )));
        }
    }

    Ok(())
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
