use serde::{Deserialize, Serialize};

use crate::models::domain::{
    Candidate, Donation, DonationMatch, DonorProfile, HelpRequest, HelpSeeker, ProfileCounts,
    VerificationRequest,
};

/// Response for the candidate search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesResponse {
    pub donation_id: i64,
    pub radius_km: f64,
    pub candidates: Vec<Candidate>,
    pub total_considered: usize,
}

/// A match together with the records it links
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetail {
    #[serde(rename = "match")]
    pub donation_match: DonationMatch,
    pub donation: Donation,
    pub help_seeker: HelpSeeker,
}

/// Latest verification request per profile kind for the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOverview {
    pub donor: Option<VerificationRequest>,
    pub help_seeker: Option<VerificationRequest>,
}

/// Tally of a bulk admin action; each id is applied independently
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed_donor_ids: Vec<i64>,
    pub failed_seeker_ids: Vec<i64>,
}

/// Superuser panel listing; a kind filtered out comes back empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileListing {
    pub donors: Vec<DonorProfile>,
    pub seekers: Vec<HelpSeeker>,
    pub counts: ProfileCounts,
}

/// Everything a help seeker tracks: its profile, posted needs and offers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekerDashboard {
    pub help_seeker: HelpSeeker,
    pub help_requests: Vec<HelpRequest>,
    pub matches: Vec<DonationMatch>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Acknowledgement for actions without a body of their own
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}
