use serde::{Deserialize, Serialize};

use crate::core::lifecycle::TransitionError;
use crate::models::{DonorVerification, SeekerVerification, VerificationStatus};

/// Outcome an admin records for a verification request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
    NeedsMoreInfo,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Reject => "reject",
            ReviewDecision::NeedsMoreInfo => "request more information",
        }
    }

    /// Request status the decision lands on
    pub fn request_status(&self) -> VerificationStatus {
        match self {
            ReviewDecision::Approve => VerificationStatus::Approved,
            ReviewDecision::Reject => VerificationStatus::Rejected,
            ReviewDecision::NeedsMoreInfo => VerificationStatus::NeedsMoreInfo,
        }
    }

    /// New donor profile status, `None` when the profile stays pending
    pub fn donor_status(&self) -> Option<DonorVerification> {
        match self {
            ReviewDecision::Approve => Some(DonorVerification::Verified),
            ReviewDecision::Reject => Some(DonorVerification::Rejected),
            ReviewDecision::NeedsMoreInfo => None,
        }
    }

    /// New help seeker status, `None` when the profile stays pending
    pub fn seeker_status(&self) -> Option<SeekerVerification> {
        match self {
            ReviewDecision::Approve => Some(SeekerVerification::Verified),
            ReviewDecision::Reject => Some(SeekerVerification::Rejected),
            ReviewDecision::NeedsMoreInfo => None,
        }
    }

    /// Message fragment for the user notification
    pub fn outcome(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approved",
            ReviewDecision::Reject => "rejected",
            ReviewDecision::NeedsMoreInfo => "returned for more information",
        }
    }
}

/// pending -> under_review
pub fn begin_review(current: VerificationStatus) -> Result<VerificationStatus, TransitionError> {
    match current {
        VerificationStatus::Pending => Ok(VerificationStatus::UnderReview),
        _ => Err(TransitionError {
            from: current.as_str(),
            action: "start review",
        }),
    }
}

/// pending | under_review -> approved | rejected | needs_more_info
///
/// Decided requests are final; a user asked for more information submits a
/// fresh request instead of reviving this one.
pub fn decide(
    current: VerificationStatus,
    decision: ReviewDecision,
) -> Result<VerificationStatus, TransitionError> {
    if current.is_open() {
        Ok(decision.request_status())
    } else {
        Err(TransitionError {
            from: current.as_str(),
            action: decision.as_str(),
        })
    }
}
