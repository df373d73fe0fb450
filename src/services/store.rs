use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Donation, DonationMatch, DonationRequest, DonationStatus, DonorProfile, DonorVerification,
    HelpRequest, HelpSeeker, MatchStatus, MatchUpdate, NewDonation, NewDonationMatch,
    NewDonationRequest, NewDonorProfile, NewHelpRequest, NewHelpSeeker, NewNotification,
    NewVerificationRequest, Notification, ProfileCounts, ProfileKind, ProfileQuery, RequestStatus,
    SeekerFilter, SeekerType, SeekerVerification, VerificationRequest, VerificationStatus,
    VerificationUpdate, VerifierStamp,
};

/// Errors that can occur when reading or writing profile data
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Persistence contract for every record the service owns
///
/// Status writes take the status the caller last observed and only apply
/// when it still holds (compare-and-set). They return `None`/`false` when
/// another writer got there first.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    // Seeker types
    async fn list_seeker_types(&self) -> Result<Vec<SeekerType>, StoreError>;

    async fn seeker_type_exists(&self, tag: &str) -> Result<bool, StoreError>;

    // Donor profiles
    /// Fetch the user's donor profile, creating it from `defaults` when missing.
    ///
    /// Returns the profile and whether it was created.
    async fn get_or_create_donor_profile(
        &self,
        defaults: NewDonorProfile,
    ) -> Result<(DonorProfile, bool), StoreError>;

    /// Create or overwrite the editable fields of the user's donor profile
    async fn upsert_donor_profile(&self, profile: NewDonorProfile) -> Result<DonorProfile, StoreError>;

    async fn get_donor_profile(&self, id: i64) -> Result<DonorProfile, StoreError>;

    async fn find_donor_profile_by_user(&self, user_id: Uuid) -> Result<Option<DonorProfile>, StoreError>;

    /// Set the verification status; the stamp, when given, replaces verifier
    /// identity and time. Without a stamp the previous values are kept.
    async fn set_donor_verification(
        &self,
        id: i64,
        status: DonorVerification,
        stamp: Option<VerifierStamp>,
    ) -> Result<DonorProfile, StoreError>;

    /// Delete a donor profile with its donations, requests and matches
    async fn delete_donor_profile(&self, id: i64) -> Result<(), StoreError>;

    /// Donor profiles for the admin panel, ordered by id
    async fn search_donor_profiles(&self, query: &ProfileQuery) -> Result<Vec<DonorProfile>, StoreError>;

    // Help seekers
    async fn create_help_seeker(&self, seeker: NewHelpSeeker) -> Result<HelpSeeker, StoreError>;

    async fn get_help_seeker(&self, id: i64) -> Result<HelpSeeker, StoreError>;

    async fn find_help_seeker_by_user(&self, user_id: Uuid) -> Result<Option<HelpSeeker>, StoreError>;

    /// Verified seekers matching the filter, ordered by id
    async fn list_verified_seekers(&self, filter: &SeekerFilter) -> Result<Vec<HelpSeeker>, StoreError>;

    async fn set_seeker_verification(
        &self,
        id: i64,
        status: SeekerVerification,
        stamp: Option<VerifierStamp>,
    ) -> Result<HelpSeeker, StoreError>;

    /// Delete a help seeker with its matches and help requests
    async fn delete_help_seeker(&self, id: i64) -> Result<(), StoreError>;

    /// Help seekers in any verification state for the admin panel, ordered by id
    async fn search_help_seekers(&self, query: &ProfileQuery) -> Result<Vec<HelpSeeker>, StoreError>;

    async fn profile_counts(&self) -> Result<ProfileCounts, StoreError>;

    // Help requests
    async fn insert_help_request(&self, request: NewHelpRequest) -> Result<HelpRequest, StoreError>;

    async fn get_help_request(&self, id: i64) -> Result<HelpRequest, StoreError>;

    /// Every request of one seeker, most urgent first, then newest
    async fn list_help_requests_by_seeker(&self, help_seeker_id: i64) -> Result<Vec<HelpRequest>, StoreError>;

    /// Active requests of verified seekers whose deadline is ahead or unset,
    /// most urgent first, then newest
    async fn list_open_help_requests(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
    ) -> Result<Vec<HelpRequest>, StoreError>;

    /// Returns false when the request was already closed
    async fn close_help_request(&self, id: i64) -> Result<bool, StoreError>;

    // Donations
    async fn insert_donation(&self, donation: NewDonation) -> Result<Donation, StoreError>;

    async fn get_donation(&self, id: i64) -> Result<Donation, StoreError>;

    /// Persist the editable fields of an existing donation.
    ///
    /// Status is never written here; it only moves through
    /// `set_donation_status` so concurrent transitions are not overwritten.
    async fn update_donation(&self, donation: &Donation) -> Result<Donation, StoreError>;

    async fn set_donation_status(
        &self,
        id: i64,
        expected: DonationStatus,
        next: DonationStatus,
    ) -> Result<bool, StoreError>;

    /// Available donations whose deadline is still ahead, newest first
    async fn list_available_donations(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
    ) -> Result<Vec<Donation>, StoreError>;

    async fn list_donations_by_donor(&self, donor_id: i64) -> Result<Vec<Donation>, StoreError>;

    // Donation requests
    async fn insert_donation_request(&self, request: NewDonationRequest) -> Result<DonationRequest, StoreError>;

    async fn get_donation_request(&self, id: i64) -> Result<DonationRequest, StoreError>;

    async fn list_donation_requests(&self, donation_id: i64) -> Result<Vec<DonationRequest>, StoreError>;

    async fn set_donation_request_status(
        &self,
        id: i64,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<Option<DonationRequest>, StoreError>;

    // Matches
    /// Fails with `Conflict` while an active match exists for the same pair
    async fn insert_match(&self, new_match: NewDonationMatch) -> Result<DonationMatch, StoreError>;

    async fn get_match(&self, id: i64) -> Result<DonationMatch, StoreError>;

    /// Matches offered to one seeker, newest first
    async fn list_matches_by_seeker(&self, help_seeker_id: i64) -> Result<Vec<DonationMatch>, StoreError>;

    async fn transition_match(
        &self,
        id: i64,
        expected: MatchStatus,
        update: MatchUpdate,
    ) -> Result<Option<DonationMatch>, StoreError>;

    // Verification requests
    async fn insert_verification_request(
        &self,
        request: NewVerificationRequest,
    ) -> Result<VerificationRequest, StoreError>;

    async fn get_verification_request(&self, id: i64) -> Result<VerificationRequest, StoreError>;

    /// Pending and under-review requests, oldest first
    async fn list_open_verification_requests(&self) -> Result<Vec<VerificationRequest>, StoreError>;

    async fn latest_verification_request(
        &self,
        user_id: Uuid,
        kind: ProfileKind,
    ) -> Result<Option<VerificationRequest>, StoreError>;

    async fn transition_verification_request(
        &self,
        id: i64,
        expected: VerificationStatus,
        update: VerificationUpdate,
    ) -> Result<Option<VerificationRequest>, StoreError>;

    // Notifications
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, StoreError>;

    /// Newest first
    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError>;

    /// Returns false when the notification is missing or belongs to someone else
    async fn mark_notification_read(&self, id: i64, user_id: Uuid) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
