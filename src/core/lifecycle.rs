use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MatchStatus, RequestStatus};

/// An illegal state change
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot {action} while {from}")]
pub struct TransitionError {
    pub from: &'static str,
    pub action: &'static str,
}

/// What a party asks to do with a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAction {
    Accept,
    Reject,
    MarkDelivered,
}

impl MatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchAction::Accept => "accept",
            MatchAction::Reject => "reject",
            MatchAction::MarkDelivered => "mark delivered",
        }
    }
}

/// Which side of a match the acting user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchParty {
    Donor,
    Seeker,
}

/// Next status for a match, or `TransitionError` for any other
/// (party, status) combination.
///
/// pending  --seeker accept-->  accepted
/// pending  --seeker reject-->  rejected
/// accepted --donor deliver-->  delivered
pub fn next_match_status(
    current: MatchStatus,
    action: MatchAction,
    party: MatchParty,
) -> Result<MatchStatus, TransitionError> {
    match (current, action, party) {
        (MatchStatus::Pending, MatchAction::Accept, MatchParty::Seeker) => Ok(MatchStatus::Accepted),
        (MatchStatus::Pending, MatchAction::Reject, MatchParty::Seeker) => Ok(MatchStatus::Rejected),
        (MatchStatus::Accepted, MatchAction::MarkDelivered, MatchParty::Donor) => {
            Ok(MatchStatus::Delivered)
        }
        _ => Err(TransitionError {
            from: current.as_str(),
            action: action.as_str(),
        }),
    }
}

/// Next status for a donation request decided by the donor
///
/// pending  -> accepted | rejected
/// accepted -> completed
pub fn next_request_status(
    current: RequestStatus,
    target: RequestStatus,
) -> Result<RequestStatus, TransitionError> {
    match (current, target) {
        (RequestStatus::Pending, RequestStatus::Accepted)
        | (RequestStatus::Pending, RequestStatus::Rejected)
        | (RequestStatus::Accepted, RequestStatus::Completed) => Ok(target),
        _ => Err(TransitionError {
            from: current.as_str(),
            action: match target {
                RequestStatus::Pending => "reopen",
                RequestStatus::Accepted => "accept",
                RequestStatus::Rejected => "reject",
                RequestStatus::Completed => "complete",
            },
        }),
    }
}
