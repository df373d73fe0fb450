use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::core::distance::haversine_distance;

/// A resolved point on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to another point in kilometers
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Build from nullable columns; both halves must be present
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self { latitude, longitude }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "donation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Available,
    Reserved,
    Collected,
    Expired,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Available => "available",
            DonationStatus::Reserved => "reserved",
            DonationStatus::Collected => "collected",
            DonationStatus::Expired => "expired",
        }
    }
}

/// Verification state of a help-seeker organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "seeker_verification", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SeekerVerification {
    Pending,
    Verified,
    Rejected,
}

impl SeekerVerification {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeekerVerification::Pending => "pending",
            SeekerVerification::Verified => "verified",
            SeekerVerification::Rejected => "rejected",
        }
    }
}

/// Verification state of a donor profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "donor_verification", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DonorVerification {
    NotSubmitted,
    Pending,
    Verified,
    Rejected,
}

impl DonorVerification {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonorVerification::NotSubmitted => "not_submitted",
            DonorVerification::Pending => "pending",
            DonorVerification::Verified => "verified",
            DonorVerification::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "donor_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DonorType {
    Individual,
    Hotel,
    Catering,
    Banquet,
    Hostel,
    Corporate,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
    Delivered,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Rejected => "rejected",
            MatchStatus::Delivered => "delivered",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Rejected | MatchStatus::Delivered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }
}

/// Which kind of profile a verification or admin action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Donor,
    #[serde(alias = "seeker")]
    HelpSeeker,
}

impl ProfileKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProfileKind::Donor => "donor verification",
            ProfileKind::HelpSeeker => "help seeker verification",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    NeedsMoreInfo,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::UnderReview => "under_review",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::NeedsMoreInfo => "needs_more_info",
        }
    }

    /// Still waiting on an admin
    pub fn is_open(&self) -> bool {
        matches!(self, VerificationStatus::Pending | VerificationStatus::UnderReview)
    }
}

/// Organization category a help seeker belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekerType {
    pub tag: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorProfile {
    pub id: i64,
    pub user_id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub organization_name: Option<String>,
    pub donor_type: DonorType,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub verification_status: DonorVerification,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DonorProfile {
    pub fn is_verified(&self) -> bool {
        self.verification_status == DonorVerification::Verified
    }

    pub fn display_name(&self) -> &str {
        self.organization_name.as_deref().unwrap_or(&self.username)
    }
}

/// Defaults used when a donor profile is provisioned on first donation
#[derive(Debug, Clone)]
pub struct NewDonorProfile {
    pub user_id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub organization_name: Option<String>,
    pub donor_type: DonorType,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpSeeker {
    pub id: i64,
    pub user_id: Uuid,
    pub email: Option<String>,
    pub organization_name: String,
    pub seeker_type: String,
    pub description: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub location: Option<Coordinates>,
    pub capacity: Option<i32>,
    pub is_urgent: bool,
    pub urgent_needs: String,
    pub verification_status: SeekerVerification,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HelpSeeker {
    pub fn is_verified(&self) -> bool {
        self.verification_status == SeekerVerification::Verified
    }

    /// Verified and geocoded
    pub fn is_eligible(&self) -> bool {
        self.is_verified() && self.location.is_some()
    }

    /// Address string handed to the geocoder
    pub fn full_address(&self) -> String {
        format!("{}, {}, {}, {}", self.address, self.city, self.state, self.pincode)
    }
}

#[derive(Debug, Clone)]
pub struct NewHelpSeeker {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub organization_name: String,
    pub seeker_type: String,
    pub description: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub location: Option<Coordinates>,
    pub capacity: Option<i32>,
    pub is_urgent: bool,
    pub urgent_needs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: i64,
    pub donor_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub quantity: i32,
    pub pickup_address: String,
    pub pickup_city: String,
    pub pickup_state: String,
    pub location: Option<Coordinates>,
    pub pickup_deadline: DateTime<Utc>,
    pub status: DonationStatus,
    pub preferred_seeker_types: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.pickup_deadline
    }

    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.status == DonationStatus::Available && !self.is_expired(now)
    }

    /// Flip an available donation to expired once its deadline has passed.
    ///
    /// Returns true when the status changed and needs to be persisted.
    pub fn refresh_expiry(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == DonationStatus::Available && self.is_expired(now) {
            self.status = DonationStatus::Expired;
            return true;
        }
        false
    }

    pub fn prefers(&self, seeker_type: &str) -> bool {
        self.preferred_seeker_types.contains(seeker_type)
    }
}

#[derive(Debug, Clone)]
pub struct NewDonation {
    pub donor_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub quantity: i32,
    pub pickup_address: String,
    pub pickup_city: String,
    pub pickup_state: String,
    pub location: Option<Coordinates>,
    pub pickup_deadline: DateTime<Utc>,
    pub status: DonationStatus,
    pub preferred_seeker_types: BTreeSet<String>,
}

/// Split "street, city, state" into (city, state) using the last two parts
pub fn locality_from_address(address: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.len() < 2 {
        return None;
    }

    let state = parts[parts.len() - 1].to_string();
    let city = parts[parts.len() - 2].to_string();
    Some((city, state))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationMatch {
    pub id: i64,
    pub donation_id: i64,
    pub help_seeker_id: i64,
    pub status: MatchStatus,
    pub distance_km: Option<f64>,
    pub match_score: f64,
    pub donor_message: String,
    pub seeker_response: String,
    pub scheduled_pickup: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DonationMatch {
    pub fn is_active(&self) -> bool {
        matches!(self.status, MatchStatus::Pending | MatchStatus::Accepted)
    }
}

#[derive(Debug, Clone)]
pub struct NewDonationMatch {
    pub donation_id: i64,
    pub help_seeker_id: i64,
    pub distance_km: Option<f64>,
    pub match_score: f64,
    pub donor_message: String,
    pub scheduled_pickup: Option<DateTime<Utc>>,
}

/// Fields written together with a match status change
#[derive(Debug, Clone)]
pub struct MatchUpdate {
    pub status: MatchStatus,
    pub seeker_response: Option<String>,
    pub actual_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub id: i64,
    pub donation_id: i64,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_email: Option<String>,
    pub message: String,
    pub requested_quantity: i32,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDonationRequest {
    pub donation_id: i64,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_email: Option<String>,
    pub message: String,
    pub requested_quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: i64,
    pub user_id: Uuid,
    pub kind: ProfileKind,
    pub status: VerificationStatus,
    pub document: String,
    pub notes: String,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewVerificationRequest {
    pub user_id: Uuid,
    pub kind: ProfileKind,
    pub document: String,
}

/// Fields written together with a verification status change
#[derive(Debug, Clone)]
pub struct VerificationUpdate {
    pub status: VerificationStatus,
    pub notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Verifier identity and time written on approval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifierStamp {
    pub verified_by: Uuid,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,
    pub message: String,
    pub link: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub message: String,
    pub link: String,
}

/// How pressing a posted need is; ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "help_urgency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }
}

/// A need posted by a help-seeker organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    pub id: i64,
    pub help_seeker_id: i64,
    pub category: String,
    pub title: String,
    pub description: String,
    pub quantity_needed: i32,
    pub urgency: Urgency,
    pub is_active: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HelpRequest {
    pub fn is_urgent(&self) -> bool {
        self.urgency >= Urgency::High
    }

    /// Active and not past its deadline
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.deadline.map_or(true, |deadline| deadline > now)
    }
}

#[derive(Debug, Clone)]
pub struct NewHelpRequest {
    pub help_seeker_id: i64,
    pub category: String,
    pub title: String,
    pub description: String,
    pub quantity_needed: i32,
    pub urgency: Urgency,
    pub deadline: Option<DateTime<Utc>>,
}

/// Most urgent first, then newest
pub fn help_request_order(a: &HelpRequest, b: &HelpRequest) -> std::cmp::Ordering {
    b.urgency
        .cmp(&a.urgency)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Admin listing filter shared by donor and seeker profiles
///
/// `status` is the verification status as written on the wire; `search`
/// matches names, contact details and city case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ProfileQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ProfileQuery {
    pub fn matches_status(&self, status: &str) -> bool {
        self.status.as_deref().map_or(true, |wanted| wanted == status)
    }

    /// True when any of the fields contains the search text
    pub fn matches_text<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        let Some(needle) = self.search.as_deref() else {
            return true;
        };
        let needle = needle.to_lowercase();
        fields
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Dashboard counters for the superuser panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCounts {
    pub total_donors: i64,
    pub verified_donors: i64,
    pub pending_donors: i64,
    pub total_seekers: i64,
    pub verified_seekers: i64,
    pub pending_seekers: i64,
    pub pending_requests: i64,
}

/// A ranked help seeker for one donation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub seeker: HelpSeeker,
    pub distance_km: f64,
    pub match_score: f64,
    pub preferred_type: bool,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Scoring knobs for candidate ranking
#[derive(Debug, Clone, Copy)]
pub struct ScoringRules {
    pub penalty_per_km: f64,
    pub preference_bonus: f64,
    pub neutral_score: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            penalty_per_km: 2.0,
            preference_bonus: 20.0,
            neutral_score: 50.0,
        }
    }
}

/// Store-side filter for the verified seeker pool
#[derive(Debug, Clone, Default)]
pub struct SeekerFilter {
    pub seeker_type: Option<String>,
    pub city: Option<String>,
    pub within: Option<BoundingBox>,
    pub require_location: bool,
}
