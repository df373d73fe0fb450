// Shared fixtures for the workflow and API tests
#![allow(dead_code)]

mod faulty;

pub use faulty::FaultyStore;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sharehub_match::auth::{Actor, TokenVerifier};
use sharehub_match::core::Matcher;
use sharehub_match::models::{
    Coordinates, CreateDonationRequest, Donation, HelpSeeker, NewHelpSeeker, SeekerVerification,
    VerifierStamp,
};
use sharehub_match::services::{Geocoder, MemoryStore, Notice, Notifier, ProfileStore};
use sharehub_match::state::AppState;
use sharehub_match::workflows::donations;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const PUNE: Coordinates = Coordinates {
    latitude: 18.52,
    longitude: 73.85,
};

pub const TEST_SECRET: &str = "test-secret";

/// A point `km` kilometers due north of `origin`
pub fn north_of(origin: Coordinates, km: f64) -> Coordinates {
    Coordinates::new(origin.latitude + (km / 6371.0088_f64).to_degrees(), origin.longitude)
}

/// Geocoder answering from a fixed table
#[derive(Default)]
pub struct FixedGeocoder {
    places: HashMap<String, Coordinates>,
}

impl FixedGeocoder {
    pub fn with(mut self, address: &str, point: Coordinates) -> Self {
        self.places.insert(address.trim().to_lowercase(), point);
        self
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        self.places.get(&address.trim().to_lowercase()).copied()
    }
}

/// Keeps every notice so tests can inspect what would have been sent
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    harness_with(FixedGeocoder::default(), false)
}

pub fn harness_with(geocoder: FixedGeocoder, regeocode_on_edit: bool) -> Harness {
    let store = Arc::new(MemoryStore::new());
    build(store.clone(), store, geocoder, regeocode_on_edit)
}

/// Harness whose workflows go through a `FaultyStore`; `store` stays the
/// plain memory store underneath for setup and inspection
pub fn faulty_harness() -> (Harness, Arc<FaultyStore>) {
    let store = Arc::new(MemoryStore::new());
    let faulty = Arc::new(FaultyStore::new(store.clone()));
    (build(faulty.clone(), store, FixedGeocoder::default(), false), faulty)
}

fn build(
    backing: Arc<dyn ProfileStore>,
    store: Arc<MemoryStore>,
    geocoder: FixedGeocoder,
    regeocode_on_edit: bool,
) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState {
        store: backing,
        geocoder: Arc::new(geocoder),
        notifier: notifier.clone(),
        matcher: Matcher::with_default_rules(),
        tokens: TokenVerifier::new(TEST_SECRET, None, 0),
        regeocode_on_edit,
    };

    Harness {
        state,
        store,
        notifier,
    }
}

pub fn actor(name: &str) -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        username: name.to_string(),
        email: Some(format!("{}@example.org", name)),
        is_staff: false,
        is_superuser: false,
    }
}

pub fn staff(name: &str) -> Actor {
    Actor {
        is_staff: true,
        ..actor(name)
    }
}

pub fn superuser(name: &str) -> Actor {
    Actor {
        is_superuser: true,
        ..actor(name)
    }
}

pub fn donation_request(location: Option<Coordinates>, preferred: &[&str]) -> CreateDonationRequest {
    CreateDonationRequest {
        title: "Cooked rice and dal".to_string(),
        description: "Serves about 40 people".to_string(),
        category: "Food".to_string(),
        quantity: 40,
        pickup_address: "FC Road, Pune, Maharashtra".to_string(),
        pickup_city: None,
        pickup_state: None,
        pickup_deadline: Utc::now() + Duration::days(2),
        latitude: location.map(|c| c.latitude),
        longitude: location.map(|c| c.longitude),
        preferred_seeker_types: preferred.iter().map(|t| t.to_string()).collect(),
    }
}

pub async fn donation(
    h: &Harness,
    donor: &Actor,
    location: Option<Coordinates>,
    preferred: &[&str],
) -> Donation {
    donations::create_donation(&h.state, donor, donation_request(location, preferred))
        .await
        .unwrap()
}

/// Insert a help seeker straight into the store
pub async fn seeker(
    h: &Harness,
    owner: &Actor,
    seeker_type: &str,
    location: Option<Coordinates>,
) -> HelpSeeker {
    h.store
        .create_help_seeker(NewHelpSeeker {
            user_id: owner.user_id,
            email: owner.email.clone(),
            organization_name: format!("{} home", owner.username),
            seeker_type: seeker_type.to_string(),
            description: String::new(),
            phone: "9800000000".to_string(),
            address: "Shivaji Nagar".to_string(),
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "411005".to_string(),
            location,
            capacity: Some(50),
            is_urgent: false,
            urgent_needs: String::new(),
        })
        .await
        .unwrap()
}

pub async fn verified_seeker(
    h: &Harness,
    owner: &Actor,
    seeker_type: &str,
    location: Option<Coordinates>,
) -> HelpSeeker {
    let created = seeker(h, owner, seeker_type, location).await;
    h.store
        .set_seeker_verification(
            created.id,
            SeekerVerification::Verified,
            Some(VerifierStamp {
                verified_by: Uuid::new_v4(),
                verified_at: Utc::now(),
            }),
        )
        .await
        .unwrap()
}
