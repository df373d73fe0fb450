// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod lifecycle;
pub mod matcher;
pub mod scoring;
pub mod verification;

pub use distance::{haversine_distance, calculate_bounding_box, is_within_bounding_box};
pub use filters::{is_eligible, is_preferred_type, within_bounding_box};
pub use lifecycle::{next_match_status, next_request_status, MatchAction, MatchParty, TransitionError};
pub use matcher::{CandidateList, MatchError, Matcher, PairScore};
pub use scoring::calculate_match_score;
pub use verification::ReviewDecision;
