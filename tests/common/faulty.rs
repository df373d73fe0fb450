// Store wrapper that fails chosen writes on demand

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sharehub_match::models::{
    Donation, DonationMatch, DonationRequest, DonationStatus, DonorProfile, DonorVerification,
    HelpRequest, HelpSeeker, MatchStatus, MatchUpdate, NewDonation, NewDonationMatch,
    NewDonationRequest, NewDonorProfile, NewHelpRequest, NewHelpSeeker, NewNotification,
    NewVerificationRequest, Notification, ProfileCounts, ProfileKind, ProfileQuery, RequestStatus,
    SeekerFilter, SeekerType, SeekerVerification, VerificationRequest, VerificationStatus,
    VerificationUpdate, VerifierStamp,
};
use sharehub_match::services::{MemoryStore, ProfileStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Delegates to a `MemoryStore` until a failure switch is flipped
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    fail_verification_writes: AtomicBool,
    fail_verification_inserts: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_verification_writes: AtomicBool::new(false),
            fail_verification_inserts: AtomicBool::new(false),
        }
    }

    /// Make donor and seeker status writes fail
    pub fn fail_verification_writes(&self, fail: bool) {
        self.fail_verification_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_verification_inserts(&self, fail: bool) {
        self.fail_verification_inserts.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict(format!("{} unavailable", what)));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FaultyStore {
    async fn list_seeker_types(&self) -> Result<Vec<SeekerType>, StoreError> {
        self.inner.list_seeker_types().await
    }

    async fn seeker_type_exists(&self, tag: &str) -> Result<bool, StoreError> {
        self.inner.seeker_type_exists(tag).await
    }

    async fn get_or_create_donor_profile(
        &self,
        defaults: NewDonorProfile,
    ) -> Result<(DonorProfile, bool), StoreError> {
        self.inner.get_or_create_donor_profile(defaults).await
    }

    async fn upsert_donor_profile(&self, profile: NewDonorProfile) -> Result<DonorProfile, StoreError> {
        self.inner.upsert_donor_profile(profile).await
    }

    async fn get_donor_profile(&self, id: i64) -> Result<DonorProfile, StoreError> {
        self.inner.get_donor_profile(id).await
    }

    async fn find_donor_profile_by_user(&self, user_id: Uuid) -> Result<Option<DonorProfile>, StoreError> {
        self.inner.find_donor_profile_by_user(user_id).await
    }

    async fn set_donor_verification(
        &self,
        id: i64,
        status: DonorVerification,
        stamp: Option<VerifierStamp>,
    ) -> Result<DonorProfile, StoreError> {
        Self::check(&self.fail_verification_writes, "donor profile")?;
        self.inner.set_donor_verification(id, status, stamp).await
    }

    async fn delete_donor_profile(&self, id: i64) -> Result<(), StoreError> {
        self.inner.delete_donor_profile(id).await
    }

    async fn search_donor_profiles(&self, query: &ProfileQuery) -> Result<Vec<DonorProfile>, StoreError> {
        self.inner.search_donor_profiles(query).await
    }

    async fn create_help_seeker(&self, seeker: NewHelpSeeker) -> Result<HelpSeeker, StoreError> {
        self.inner.create_help_seeker(seeker).await
    }

    async fn get_help_seeker(&self, id: i64) -> Result<HelpSeeker, StoreError> {
        self.inner.get_help_seeker(id).await
    }

    async fn find_help_seeker_by_user(&self, user_id: Uuid) -> Result<Option<HelpSeeker>, StoreError> {
        self.inner.find_help_seeker_by_user(user_id).await
    }

    async fn list_verified_seekers(&self, filter: &SeekerFilter) -> Result<Vec<HelpSeeker>, StoreError> {
        self.inner.list_verified_seekers(filter).await
    }

    async fn set_seeker_verification(
        &self,
        id: i64,
        status: SeekerVerification,
        stamp: Option<VerifierStamp>,
    ) -> Result<HelpSeeker, StoreError> {
        Self::check(&self.fail_verification_writes, "help seeker")?;
        self.inner.set_seeker_verification(id, status, stamp).await
    }

    async fn delete_help_seeker(&self, id: i64) -> Result<(), StoreError> {
        self.inner.delete_help_seeker(id).await
    }

    async fn search_help_seekers(&self, query: &ProfileQuery) -> Result<Vec<HelpSeeker>, StoreError> {
        self.inner.search_help_seekers(query).await
    }

    async fn profile_counts(&self) -> Result<ProfileCounts, StoreError> {
        self.inner.profile_counts().await
    }

    async fn insert_help_request(&self, request: NewHelpRequest) -> Result<HelpRequest, StoreError> {
        self.inner.insert_help_request(request).await
    }

    async fn get_help_request(&self, id: i64) -> Result<HelpRequest, StoreError> {
        self.inner.get_help_request(id).await
    }

    async fn list_help_requests_by_seeker(&self, help_seeker_id: i64) -> Result<Vec<HelpRequest>, StoreError> {
        self.inner.list_help_requests_by_seeker(help_seeker_id).await
    }

    async fn list_open_help_requests(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
    ) -> Result<Vec<HelpRequest>, StoreError> {
        self.inner.list_open_help_requests(now, category).await
    }

    async fn close_help_request(&self, id: i64) -> Result<bool, StoreError> {
        self.inner.close_help_request(id).await
    }

    async fn insert_donation(&self, donation: NewDonation) -> Result<Donation, StoreError> {
        self.inner.insert_donation(donation).await
    }

    async fn get_donation(&self, id: i64) -> Result<Donation, StoreError> {
        self.inner.get_donation(id).await
    }

    async fn update_donation(&self, donation: &Donation) -> Result<Donation, StoreError> {
        self.inner.update_donation(donation).await
    }

    async fn set_donation_status(
        &self,
        id: i64,
        expected: DonationStatus,
        next: DonationStatus,
    ) -> Result<bool, StoreError> {
        self.inner.set_donation_status(id, expected, next).await
    }

    async fn list_available_donations(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
    ) -> Result<Vec<Donation>, StoreError> {
        self.inner.list_available_donations(now, category).await
    }

    async fn list_donations_by_donor(&self, donor_id: i64) -> Result<Vec<Donation>, StoreError> {
        self.inner.list_donations_by_donor(donor_id).await
    }

    async fn insert_donation_request(&self, request: NewDonationRequest) -> Result<DonationRequest, StoreError> {
        self.inner.insert_donation_request(request).await
    }

    async fn get_donation_request(&self, id: i64) -> Result<DonationRequest, StoreError> {
        self.inner.get_donation_request(id).await
    }

    async fn list_donation_requests(&self, donation_id: i64) -> Result<Vec<DonationRequest>, StoreError> {
        self.inner.list_donation_requests(donation_id).await
    }

    async fn set_donation_request_status(
        &self,
        id: i64,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<Option<DonationRequest>, StoreError> {
        self.inner.set_donation_request_status(id, expected, next).await
    }

    async fn insert_match(&self, new_match: NewDonationMatch) -> Result<DonationMatch, StoreError> {
        self.inner.insert_match(new_match).await
    }

    async fn get_match(&self, id: i64) -> Result<DonationMatch, StoreError> {
        self.inner.get_match(id).await
    }

    async fn list_matches_by_seeker(&self, help_seeker_id: i64) -> Result<Vec<DonationMatch>, StoreError> {
        self.inner.list_matches_by_seeker(help_seeker_id).await
    }

    async fn transition_match(
        &self,
        id: i64,
        expected: MatchStatus,
        update: MatchUpdate,
    ) -> Result<Option<DonationMatch>, StoreError> {
        self.inner.transition_match(id, expected, update).await
    }

    async fn insert_verification_request(
        &self,
        request: NewVerificationRequest,
    ) -> Result<VerificationRequest, StoreError> {
        Self::check(&self.fail_verification_inserts, "verification queue")?;
        self.inner.insert_verification_request(request).await
    }

    async fn get_verification_request(&self, id: i64) -> Result<VerificationRequest, StoreError> {
        self.inner.get_verification_request(id).await
    }

    async fn list_open_verification_requests(&self) -> Result<Vec<VerificationRequest>, StoreError> {
        self.inner.list_open_verification_requests().await
    }

    async fn latest_verification_request(
        &self,
        user_id: Uuid,
        kind: ProfileKind,
    ) -> Result<Option<VerificationRequest>, StoreError> {
        self.inner.latest_verification_request(user_id, kind).await
    }

    async fn transition_verification_request(
        &self,
        id: i64,
        expected: VerificationStatus,
        update: VerificationUpdate,
    ) -> Result<Option<VerificationRequest>, StoreError> {
        self.inner.transition_verification_request(id, expected, update).await
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        self.inner.insert_notification(notification).await
    }

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        self.inner.list_notifications(user_id).await
    }

    async fn mark_notification_read(&self, id: i64, user_id: Uuid) -> Result<bool, StoreError> {
        self.inner.mark_notification_read(id, user_id).await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.inner.health_check().await
    }
}
