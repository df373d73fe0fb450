use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::distance::is_within_bounding_box;
use crate::models::{
    help_request_order, Donation, DonationMatch, DonationRequest, DonationStatus, DonorProfile,
    DonorVerification, HelpRequest, HelpSeeker, MatchStatus, MatchUpdate, NewDonation,
    NewDonationMatch, NewDonationRequest, NewDonorProfile, NewHelpRequest, NewHelpSeeker,
    NewNotification, NewVerificationRequest, Notification, ProfileCounts, ProfileKind,
    ProfileQuery, RequestStatus, SeekerFilter, SeekerType, SeekerVerification,
    VerificationRequest, VerificationStatus, VerificationUpdate, VerifierStamp,
};
use crate::services::seed::default_seeker_types;
use crate::services::store::{ProfileStore, StoreError};

#[derive(Default)]
struct Tables {
    next_id: i64,
    seeker_types: Vec<SeekerType>,
    donors: BTreeMap<i64, DonorProfile>,
    seekers: BTreeMap<i64, HelpSeeker>,
    help_requests: BTreeMap<i64, HelpRequest>,
    donations: BTreeMap<i64, Donation>,
    requests: BTreeMap<i64, DonationRequest>,
    matches: BTreeMap<i64, DonationMatch>,
    verifications: BTreeMap<i64, VerificationRequest>,
    notifications: BTreeMap<i64, Notification>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn drop_donation(&mut self, donation_id: i64) {
        self.donations.remove(&donation_id);
        self.requests.retain(|_, r| r.donation_id != donation_id);
        self.matches.retain(|_, m| m.donation_id != donation_id);
    }
}

/// In-process store used by tests and `store.backend = "memory"`
///
/// Same contract as the PostgreSQL store, including cascading deletes and
/// compare-and-set status writes; nothing survives a restart.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Empty store seeded with the default seeker types
    pub fn new() -> Self {
        let tables = Tables {
            seeker_types: default_seeker_types(),
            ..Tables::default()
        };
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(what: &str, id: i64) -> StoreError {
    StoreError::NotFound(format!("{} {}", what, id))
}

fn donor_from_new(id: i64, new: NewDonorProfile, now: DateTime<Utc>) -> DonorProfile {
    DonorProfile {
        id,
        user_id: new.user_id,
        username: new.username,
        email: new.email,
        organization_name: new.organization_name,
        donor_type: new.donor_type,
        phone: new.phone,
        address: new.address,
        city: new.city,
        state: new.state,
        pincode: new.pincode,
        verification_status: DonorVerification::NotSubmitted,
        verified_by: None,
        verified_at: None,
        created_at: now,
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn list_seeker_types(&self) -> Result<Vec<SeekerType>, StoreError> {
        Ok(self.tables.read().await.seeker_types.clone())
    }

    async fn seeker_type_exists(&self, tag: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.seeker_types.iter().any(|t| t.tag == tag))
    }

    async fn get_or_create_donor_profile(
        &self,
        defaults: NewDonorProfile,
    ) -> Result<(DonorProfile, bool), StoreError> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.donors.values().find(|d| d.user_id == defaults.user_id) {
            return Ok((existing.clone(), false));
        }

        let id = tables.allocate_id();
        let profile = donor_from_new(id, defaults, Utc::now());
        tables.donors.insert(id, profile.clone());
        Ok((profile, true))
    }

    async fn upsert_donor_profile(&self, profile: NewDonorProfile) -> Result<DonorProfile, StoreError> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.donors.values_mut().find(|d| d.user_id == profile.user_id) {
            existing.username = profile.username;
            existing.email = profile.email;
            existing.organization_name = profile.organization_name;
            existing.donor_type = profile.donor_type;
            existing.phone = profile.phone;
            existing.address = profile.address;
            existing.city = profile.city;
            existing.state = profile.state;
            existing.pincode = profile.pincode;
            return Ok(existing.clone());
        }

        let id = tables.allocate_id();
        let created = donor_from_new(id, profile, Utc::now());
        tables.donors.insert(id, created.clone());
        Ok(created)
    }

    async fn get_donor_profile(&self, id: i64) -> Result<DonorProfile, StoreError> {
        self.tables
            .read()
            .await
            .donors
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("donor profile", id))
    }

    async fn find_donor_profile_by_user(&self, user_id: Uuid) -> Result<Option<DonorProfile>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .donors
            .values()
            .find(|d| d.user_id == user_id)
            .cloned())
    }

    async fn set_donor_verification(
        &self,
        id: i64,
        status: DonorVerification,
        stamp: Option<VerifierStamp>,
    ) -> Result<DonorProfile, StoreError> {
        let mut tables = self.tables.write().await;
        let profile = tables.donors.get_mut(&id).ok_or_else(|| not_found("donor profile", id))?;

        profile.verification_status = status;
        if let Some(stamp) = stamp {
            profile.verified_by = Some(stamp.verified_by);
            profile.verified_at = Some(stamp.verified_at);
        }
        Ok(profile.clone())
    }

    async fn delete_donor_profile(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.donors.remove(&id).is_none() {
            return Err(not_found("donor profile", id));
        }

        let owned: Vec<i64> = tables
            .donations
            .values()
            .filter(|d| d.donor_id == id)
            .map(|d| d.id)
            .collect();
        for donation_id in owned {
            tables.drop_donation(donation_id);
        }
        Ok(())
    }

    async fn search_donor_profiles(&self, query: &ProfileQuery) -> Result<Vec<DonorProfile>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables
            .donors
            .values()
            .filter(|d| query.matches_status(d.verification_status.as_str()))
            .filter(|d| {
                query.matches_text([
                    d.username.as_str(),
                    d.email.as_deref().unwrap_or_default(),
                    d.organization_name.as_deref().unwrap_or_default(),
                    d.city.as_str(),
                ])
            })
            .cloned()
            .collect())
    }

    async fn create_help_seeker(&self, seeker: NewHelpSeeker) -> Result<HelpSeeker, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.seekers.values().any(|s| s.user_id == seeker.user_id) {
            return Err(StoreError::Conflict(format!(
                "user {} is already registered as a help seeker",
                seeker.user_id
            )));
        }

        let id = tables.allocate_id();
        let now = Utc::now();
        let created = HelpSeeker {
            id,
            user_id: seeker.user_id,
            email: seeker.email,
            organization_name: seeker.organization_name,
            seeker_type: seeker.seeker_type,
            description: seeker.description,
            phone: seeker.phone,
            address: seeker.address,
            city: seeker.city,
            state: seeker.state,
            pincode: seeker.pincode,
            location: seeker.location,
            capacity: seeker.capacity,
            is_urgent: seeker.is_urgent,
            urgent_needs: seeker.urgent_needs,
            verification_status: SeekerVerification::Pending,
            verified_by: None,
            verified_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.seekers.insert(id, created.clone());
        Ok(created)
    }

    async fn get_help_seeker(&self, id: i64) -> Result<HelpSeeker, StoreError> {
        self.tables
            .read()
            .await
            .seekers
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("help seeker", id))
    }

    async fn find_help_seeker_by_user(&self, user_id: Uuid) -> Result<Option<HelpSeeker>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .seekers
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn list_verified_seekers(&self, filter: &SeekerFilter) -> Result<Vec<HelpSeeker>, StoreError> {
        let tables = self.tables.read().await;

        let seekers = tables
            .seekers
            .values()
            .filter(|s| s.is_verified())
            .filter(|s| !filter.require_location || s.location.is_some())
            .filter(|s| {
                filter
                    .seeker_type
                    .as_deref()
                    .map_or(true, |tag| s.seeker_type == tag)
            })
            .filter(|s| {
                filter
                    .city
                    .as_deref()
                    .map_or(true, |city| s.city.eq_ignore_ascii_case(city))
            })
            .filter(|s| match (&filter.within, s.location) {
                (Some(bbox), Some(point)) => is_within_bounding_box(point.latitude, point.longitude, bbox),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect();

        Ok(seekers)
    }

    async fn set_seeker_verification(
        &self,
        id: i64,
        status: SeekerVerification,
        stamp: Option<VerifierStamp>,
    ) -> Result<HelpSeeker, StoreError> {
        let mut tables = self.tables.write().await;
        let seeker = tables.seekers.get_mut(&id).ok_or_else(|| not_found("help seeker", id))?;

        seeker.verification_status = status;
        if let Some(stamp) = stamp {
            seeker.verified_by = Some(stamp.verified_by);
            seeker.verified_at = Some(stamp.verified_at);
        }
        seeker.updated_at = Utc::now();
        Ok(seeker.clone())
    }

    async fn delete_help_seeker(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.seekers.remove(&id).is_none() {
            return Err(not_found("help seeker", id));
        }
        tables.matches.retain(|_, m| m.help_seeker_id != id);
        tables.help_requests.retain(|_, r| r.help_seeker_id != id);
        Ok(())
    }

    async fn search_help_seekers(&self, query: &ProfileQuery) -> Result<Vec<HelpSeeker>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables
            .seekers
            .values()
            .filter(|s| query.matches_status(s.verification_status.as_str()))
            .filter(|s| {
                query.matches_text([
                    s.organization_name.as_str(),
                    s.email.as_deref().unwrap_or_default(),
                    s.city.as_str(),
                    s.description.as_str(),
                ])
            })
            .cloned()
            .collect())
    }

    async fn profile_counts(&self) -> Result<ProfileCounts, StoreError> {
        let tables = self.tables.read().await;
        let count = |n: usize| n as i64;

        Ok(ProfileCounts {
            total_donors: count(tables.donors.len()),
            verified_donors: count(tables.donors.values().filter(|d| d.is_verified()).count()),
            pending_donors: count(
                tables
                    .donors
                    .values()
                    .filter(|d| d.verification_status == DonorVerification::Pending)
                    .count(),
            ),
            total_seekers: count(tables.seekers.len()),
            verified_seekers: count(tables.seekers.values().filter(|s| s.is_verified()).count()),
            pending_seekers: count(
                tables
                    .seekers
                    .values()
                    .filter(|s| s.verification_status == SeekerVerification::Pending)
                    .count(),
            ),
            pending_requests: count(
                tables
                    .verifications
                    .values()
                    .filter(|v| v.status == VerificationStatus::Pending)
                    .count(),
            ),
        })
    }

    async fn insert_help_request(&self, request: NewHelpRequest) -> Result<HelpRequest, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.seekers.contains_key(&request.help_seeker_id) {
            return Err(not_found("help seeker", request.help_seeker_id));
        }

        let id = tables.allocate_id();
        let now = Utc::now();
        let created = HelpRequest {
            id,
            help_seeker_id: request.help_seeker_id,
            category: request.category,
            title: request.title,
            description: request.description,
            quantity_needed: request.quantity_needed,
            urgency: request.urgency,
            is_active: true,
            deadline: request.deadline,
            created_at: now,
            updated_at: now,
        };
        tables.help_requests.insert(id, created.clone());
        Ok(created)
    }

    async fn get_help_request(&self, id: i64) -> Result<HelpRequest, StoreError> {
        self.tables
            .read()
            .await
            .help_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("help request", id))
    }

    async fn list_help_requests_by_seeker(&self, help_seeker_id: i64) -> Result<Vec<HelpRequest>, StoreError> {
        let tables = self.tables.read().await;

        let mut requests: Vec<HelpRequest> = tables
            .help_requests
            .values()
            .filter(|r| r.help_seeker_id == help_seeker_id)
            .cloned()
            .collect();

        requests.sort_by(help_request_order);
        Ok(requests)
    }

    async fn list_open_help_requests(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
    ) -> Result<Vec<HelpRequest>, StoreError> {
        let tables = self.tables.read().await;

        let mut requests: Vec<HelpRequest> = tables
            .help_requests
            .values()
            .filter(|r| r.is_open(now))
            .filter(|r| category.map_or(true, |c| r.category.eq_ignore_ascii_case(c)))
            .filter(|r| {
                tables
                    .seekers
                    .get(&r.help_seeker_id)
                    .is_some_and(HelpSeeker::is_verified)
            })
            .cloned()
            .collect();

        requests.sort_by(help_request_order);
        Ok(requests)
    }

    async fn close_help_request(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let request = tables
            .help_requests
            .get_mut(&id)
            .ok_or_else(|| not_found("help request", id))?;

        if !request.is_active {
            return Ok(false);
        }
        request.is_active = false;
        request.updated_at = Utc::now();
        Ok(true)
    }

    async fn insert_donation(&self, donation: NewDonation) -> Result<Donation, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.donors.contains_key(&donation.donor_id) {
            return Err(not_found("donor profile", donation.donor_id));
        }

        let id = tables.allocate_id();
        let now = Utc::now();
        let created = Donation {
            id,
            donor_id: donation.donor_id,
            title: donation.title,
            description: donation.description,
            category: donation.category,
            quantity: donation.quantity,
            pickup_address: donation.pickup_address,
            pickup_city: donation.pickup_city,
            pickup_state: donation.pickup_state,
            location: donation.location,
            pickup_deadline: donation.pickup_deadline,
            status: donation.status,
            preferred_seeker_types: donation.preferred_seeker_types,
            created_at: now,
            updated_at: now,
        };
        tables.donations.insert(id, created.clone());
        Ok(created)
    }

    async fn get_donation(&self, id: i64) -> Result<Donation, StoreError> {
        self.tables
            .read()
            .await
            .donations
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("donation", id))
    }

    async fn update_donation(&self, donation: &Donation) -> Result<Donation, StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .donations
            .get_mut(&donation.id)
            .ok_or_else(|| not_found("donation", donation.id))?;

        stored.title = donation.title.clone();
        stored.description = donation.description.clone();
        stored.category = donation.category.clone();
        stored.quantity = donation.quantity;
        stored.pickup_address = donation.pickup_address.clone();
        stored.pickup_city = donation.pickup_city.clone();
        stored.pickup_state = donation.pickup_state.clone();
        stored.location = donation.location;
        stored.pickup_deadline = donation.pickup_deadline;
        stored.preferred_seeker_types = donation.preferred_seeker_types.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn set_donation_status(
        &self,
        id: i64,
        expected: DonationStatus,
        next: DonationStatus,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let donation = tables.donations.get_mut(&id).ok_or_else(|| not_found("donation", id))?;

        if donation.status != expected {
            return Ok(false);
        }
        donation.status = next;
        donation.updated_at = Utc::now();
        Ok(true)
    }

    async fn list_available_donations(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
    ) -> Result<Vec<Donation>, StoreError> {
        let tables = self.tables.read().await;

        let mut donations: Vec<Donation> = tables
            .donations
            .values()
            .filter(|d| d.status == DonationStatus::Available && d.pickup_deadline > now)
            .filter(|d| category.map_or(true, |c| d.category.eq_ignore_ascii_case(c)))
            .cloned()
            .collect();

        donations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(donations)
    }

    async fn list_donations_by_donor(&self, donor_id: i64) -> Result<Vec<Donation>, StoreError> {
        let tables = self.tables.read().await;

        let mut donations: Vec<Donation> = tables
            .donations
            .values()
            .filter(|d| d.donor_id == donor_id)
            .cloned()
            .collect();

        donations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(donations)
    }

    async fn insert_donation_request(&self, request: NewDonationRequest) -> Result<DonationRequest, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.donations.contains_key(&request.donation_id) {
            return Err(not_found("donation", request.donation_id));
        }

        let duplicate = tables
            .requests
            .values()
            .any(|r| r.donation_id == request.donation_id && r.requester_id == request.requester_id);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "donation {} was already requested by this user",
                request.donation_id
            )));
        }

        let id = tables.allocate_id();
        let created = DonationRequest {
            id,
            donation_id: request.donation_id,
            requester_id: request.requester_id,
            requester_name: request.requester_name,
            requester_email: request.requester_email,
            message: request.message,
            requested_quantity: request.requested_quantity,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        };
        tables.requests.insert(id, created.clone());
        Ok(created)
    }

    async fn get_donation_request(&self, id: i64) -> Result<DonationRequest, StoreError> {
        self.tables
            .read()
            .await
            .requests
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("donation request", id))
    }

    async fn list_donation_requests(&self, donation_id: i64) -> Result<Vec<DonationRequest>, StoreError> {
        let tables = self.tables.read().await;

        let mut requests: Vec<DonationRequest> = tables
            .requests
            .values()
            .filter(|r| r.donation_id == donation_id)
            .cloned()
            .collect();

        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn set_donation_request_status(
        &self,
        id: i64,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<Option<DonationRequest>, StoreError> {
        let mut tables = self.tables.write().await;
        let request = tables
            .requests
            .get_mut(&id)
            .ok_or_else(|| not_found("donation request", id))?;

        if request.status != expected {
            return Ok(None);
        }
        request.status = next;
        Ok(Some(request.clone()))
    }

    async fn insert_match(&self, new_match: NewDonationMatch) -> Result<DonationMatch, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.donations.contains_key(&new_match.donation_id) {
            return Err(not_found("donation", new_match.donation_id));
        }
        if !tables.seekers.contains_key(&new_match.help_seeker_id) {
            return Err(not_found("help seeker", new_match.help_seeker_id));
        }

        let active_pair = tables.matches.values().any(|m| {
            m.donation_id == new_match.donation_id
                && m.help_seeker_id == new_match.help_seeker_id
                && m.is_active()
        });
        if active_pair {
            return Err(StoreError::Conflict(format!(
                "donation {} already has an active match with help seeker {}",
                new_match.donation_id, new_match.help_seeker_id
            )));
        }

        let id = tables.allocate_id();
        let created = DonationMatch {
            id,
            donation_id: new_match.donation_id,
            help_seeker_id: new_match.help_seeker_id,
            status: MatchStatus::Pending,
            distance_km: new_match.distance_km,
            match_score: new_match.match_score,
            donor_message: new_match.donor_message,
            seeker_response: String::new(),
            scheduled_pickup: new_match.scheduled_pickup,
            actual_delivery: None,
            created_at: Utc::now(),
        };
        tables.matches.insert(id, created.clone());
        Ok(created)
    }

    async fn get_match(&self, id: i64) -> Result<DonationMatch, StoreError> {
        self.tables
            .read()
            .await
            .matches
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("donation match", id))
    }

    async fn list_matches_by_seeker(&self, help_seeker_id: i64) -> Result<Vec<DonationMatch>, StoreError> {
        let tables = self.tables.read().await;

        let mut matches: Vec<DonationMatch> = tables
            .matches
            .values()
            .filter(|m| m.help_seeker_id == help_seeker_id)
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(matches)
    }

    async fn transition_match(
        &self,
        id: i64,
        expected: MatchStatus,
        update: MatchUpdate,
    ) -> Result<Option<DonationMatch>, StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .matches
            .get_mut(&id)
            .ok_or_else(|| not_found("donation match", id))?;

        if stored.status != expected {
            return Ok(None);
        }

        stored.status = update.status;
        if let Some(response) = update.seeker_response {
            stored.seeker_response = response;
        }
        if let Some(delivered_at) = update.actual_delivery {
            stored.actual_delivery = Some(delivered_at);
        }
        Ok(Some(stored.clone()))
    }

    async fn insert_verification_request(
        &self,
        request: NewVerificationRequest,
    ) -> Result<VerificationRequest, StoreError> {
        let mut tables = self.tables.write().await;

        let id = tables.allocate_id();
        let created = VerificationRequest {
            id,
            user_id: request.user_id,
            kind: request.kind,
            status: VerificationStatus::Pending,
            document: request.document,
            notes: String::new(),
            submitted_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        };
        tables.verifications.insert(id, created.clone());
        Ok(created)
    }

    async fn get_verification_request(&self, id: i64) -> Result<VerificationRequest, StoreError> {
        self.tables
            .read()
            .await
            .verifications
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("verification request", id))
    }

    async fn list_open_verification_requests(&self) -> Result<Vec<VerificationRequest>, StoreError> {
        let tables = self.tables.read().await;

        let mut open: Vec<VerificationRequest> = tables
            .verifications
            .values()
            .filter(|v| v.status.is_open())
            .cloned()
            .collect();

        open.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then_with(|| a.id.cmp(&b.id)));
        Ok(open)
    }

    async fn latest_verification_request(
        &self,
        user_id: Uuid,
        kind: ProfileKind,
    ) -> Result<Option<VerificationRequest>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables
            .verifications
            .values()
            .filter(|v| v.user_id == user_id && v.kind == kind)
            .max_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then_with(|| a.id.cmp(&b.id)))
            .cloned())
    }

    async fn transition_verification_request(
        &self,
        id: i64,
        expected: VerificationStatus,
        update: VerificationUpdate,
    ) -> Result<Option<VerificationRequest>, StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .verifications
            .get_mut(&id)
            .ok_or_else(|| not_found("verification request", id))?;

        if stored.status != expected {
            return Ok(None);
        }

        stored.status = update.status;
        if let Some(notes) = update.notes {
            stored.notes = notes;
        }
        if update.reviewed_by.is_some() {
            stored.reviewed_by = update.reviewed_by;
        }
        if update.reviewed_at.is_some() {
            stored.reviewed_at = update.reviewed_at;
        }
        Ok(Some(stored.clone()))
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        let mut tables = self.tables.write().await;

        let id = tables.allocate_id();
        let created = Notification {
            id,
            user_id: notification.user_id,
            message: notification.message,
            link: notification.link,
            is_read: false,
            created_at: Utc::now(),
        };
        tables.notifications.insert(id, created.clone());
        Ok(created)
    }

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        let tables = self.tables.read().await;

        let mut notifications: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn mark_notification_read(&self, id: i64, user_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;

        match tables.notifications.get_mut(&id) {
            Some(notification) if notification.user_id == user_id => {
                notification.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
