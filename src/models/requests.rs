use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::ReviewDecision;
use crate::models::domain::{DonorType, ProfileKind, RequestStatus, Urgency};

/// Request to publish a donation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(range(min = 1))]
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[validate(length(min = 1))]
    pub pickup_address: String,
    pub pickup_city: Option<String>,
    pub pickup_state: Option<String>,
    pub pickup_deadline: DateTime<Utc>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub preferred_seeker_types: Vec<String>,
}

fn default_quantity() -> i32 {
    1
}

/// Partial edit of a donation by its owner
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDonationRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    #[validate(length(min = 1))]
    pub pickup_address: Option<String>,
    pub pickup_deadline: Option<DateTime<Utc>>,
    pub preferred_seeker_types: Option<Vec<String>>,
}

/// Query string for the public donation list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationListParams {
    pub category: Option<String>,
}

/// Query string for candidate search
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesParams {
    pub radius_km: Option<f64>,
}

/// Donor proposes a donation to a seeker
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProposeMatchRequest {
    #[validate(range(min = 1))]
    pub seeker_id: i64,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub message: String,
    pub scheduled_pickup: Option<DateTime<Utc>>,
}

/// Seeker's free-text reply when accepting or rejecting
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponseRequest {
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub message: String,
}

/// Ask a donor for a donation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestDonationBody {
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub message: String,
    #[validate(range(min = 1))]
    #[serde(default = "default_quantity")]
    pub requested_quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequestStatusBody {
    pub status: RequestStatus,
}

/// Register the caller as a help-seeker organization
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterHelpSeekerRequest {
    #[validate(length(min = 1, max = 255))]
    pub organization_name: String,
    #[validate(length(min = 1))]
    pub seeker_type: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 15))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(max = 10))]
    #[serde(default)]
    pub pincode: String,
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub urgent_needs: String,
}

/// Query string for the seeker directory
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryParams {
    pub seeker_type: Option<String>,
    pub city: Option<String>,
}

/// Create or edit the caller's donor profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DonorProfileRequest {
    #[validate(length(max = 255))]
    pub organization_name: Option<String>,
    pub donor_type: DonorType,
    #[validate(length(max = 15))]
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[validate(length(max = 10))]
    #[serde(default)]
    pub pincode: String,
}

/// Submit documents for verification
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVerificationRequest {
    pub kind: ProfileKind,
    #[validate(length(min = 1, max = 500))]
    pub document: String,
}

/// Admin decision on a verification request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecisionRequest {
    pub decision: ReviewDecision,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub notes: String,
}

/// Superuser bulk action over donor and seeker profiles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkProfilesRequest {
    #[serde(default)]
    pub donor_ids: Vec<i64>,
    #[serde(default)]
    pub seeker_ids: Vec<i64>,
}

/// Query string for the superuser profile panel
///
/// `kind` and `status` accept "all" as well as leaving them out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileListParams {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub q: Option<String>,
}

/// A need posted by the caller's help-seeker organization
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHelpRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(range(min = 1))]
    pub quantity_needed: i32,
    #[serde(default)]
    pub urgency: Urgency,
    pub deadline: Option<DateTime<Utc>>,
}

/// Query string for the open needs board
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HelpRequestListParams {
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_donation_validation() {
        let json = r#"{
            "title": "",
            "category": "Food",
            "pickupAddress": "FC Road, Pune, Maharashtra",
            "pickupDeadline": "2030-01-01T10:00:00Z",
            "latitude": 123.0
        }"#;

        let req: CreateDonationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.quantity, 1);

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("latitude"));
    }

    #[test]
    fn test_review_decision_parses() {
        let req: ReviewDecisionRequest =
            serde_json::from_str(r#"{"decision": "needs_more_info"}"#).unwrap();
        assert_eq!(req.decision, ReviewDecision::NeedsMoreInfo);
        assert!(req.notes.is_empty());
    }

    #[test]
    fn test_help_request_defaults_to_medium_urgency() {
        let req: CreateHelpRequest = serde_json::from_str(
            r#"{"category": "Food", "title": "Rice for 50", "description": "Weekly meals", "quantityNeeded": 0}"#,
        )
        .unwrap();

        assert_eq!(req.urgency, Urgency::Medium);
        assert!(req.deadline.is_none());
        assert!(req.validate().unwrap_err().field_errors().contains_key("quantity_needed"));
    }

    #[test]
    fn test_submit_verification_accepts_seeker_alias() {
        let req: SubmitVerificationRequest =
            serde_json::from_str(r#"{"kind": "seeker", "document": "reg-cert.pdf"}"#).unwrap();
        assert_eq!(req.kind, ProfileKind::HelpSeeker);
    }
}
