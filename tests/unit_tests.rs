// Unit tests for ShareHub Match

use chrono::{Duration, Utc};
use sharehub_match::core::{
    calculate_match_score,
    distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box},
    filters::{is_eligible, is_preferred_type},
    next_match_status, next_request_status,
    verification::decide,
    MatchAction, MatchParty, Matcher, ReviewDecision,
};
use sharehub_match::models::{
    locality_from_address, Coordinates, Donation, DonationStatus, HelpSeeker, MatchStatus,
    RequestStatus, ScoringRules, SeekerVerification, VerificationStatus,
};
use sharehub_match::services::{EmailContext, EmailTemplate};
use uuid::Uuid;

fn test_seeker(id: i64, seeker_type: &str, location: Option<Coordinates>) -> HelpSeeker {
    HelpSeeker {
        id,
        user_id: Uuid::new_v4(),
        email: None,
        organization_name: format!("Org {}", id),
        seeker_type: seeker_type.to_string(),
        description: String::new(),
        phone: String::new(),
        address: "Kothrud".to_string(),
        city: "Pune".to_string(),
        state: "Maharashtra".to_string(),
        pincode: "411038".to_string(),
        location,
        capacity: None,
        is_urgent: false,
        urgent_needs: String::new(),
        verification_status: SeekerVerification::Verified,
        verified_by: None,
        verified_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn test_donation(location: Option<Coordinates>, preferred: &[&str]) -> Donation {
    Donation {
        id: 1,
        donor_id: 1,
        title: "Rice".to_string(),
        description: String::new(),
        category: "Food".to_string(),
        quantity: 10,
        pickup_address: "FC Road, Pune, Maharashtra".to_string(),
        pickup_city: "Pune".to_string(),
        pickup_state: "Maharashtra".to_string(),
        location,
        pickup_deadline: Utc::now() + Duration::days(1),
        status: DonationStatus::Available,
        preferred_seeker_types: preferred.iter().map(|t| t.to_string()).collect(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(18.52, 73.85, 18.52, 73.85);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_pune_to_mumbai() {
    // Pune to Mumbai is roughly 120 km as the crow flies
    let distance = haversine_distance(18.5204, 73.8567, 19.0760, 72.8777);
    assert!(distance > 110.0 && distance < 130.0);
}

#[test]
fn test_bounding_box_creation() {
    let bbox = calculate_bounding_box(18.52, 73.85, 10.0);

    assert!(bbox.min_lat < 18.52);
    assert!(bbox.max_lat > 18.52);
    assert!(bbox.min_lon < 73.85);
    assert!(bbox.max_lon > 73.85);

    // Roughly 0.18 degrees of latitude for 10 km either side
    let lat_span = bbox.max_lat - bbox.min_lat;
    assert!((lat_span - 0.18).abs() < 0.02);
}

#[test]
fn test_point_within_bbox() {
    let bbox = calculate_bounding_box(18.52, 73.85, 10.0);

    assert!(is_within_bounding_box(18.52, 73.85, &bbox));
    assert!(is_within_bounding_box(18.55, 73.80, &bbox));
    assert!(!is_within_bounding_box(19.07, 72.87, &bbox));
    assert!(!is_within_bounding_box(bbox.max_lat + 0.01, 73.85, &bbox));
}

#[test]
fn test_eligibility_needs_verification_and_location() {
    let point = Some(Coordinates::new(18.52, 73.85));

    assert!(is_eligible(&test_seeker(1, "orphanage", point)));
    assert!(!is_eligible(&test_seeker(2, "orphanage", None)));

    let mut pending = test_seeker(3, "orphanage", point);
    pending.verification_status = SeekerVerification::Pending;
    assert!(!is_eligible(&pending));
}

#[test]
fn test_preferred_type_lookup() {
    let donation = test_donation(None, &["orphanage", "food_bank"]);

    assert!(is_preferred_type(&donation, &test_seeker(1, "food_bank", None)));
    assert!(!is_preferred_type(&donation, &test_seeker(2, "old_age_home", None)));
    assert!(!is_preferred_type(&test_donation(None, &[]), &test_seeker(3, "orphanage", None)));
}

#[test]
fn test_scoring_pune_examples() {
    let rules = ScoringRules::default();

    assert_eq!(calculate_match_score(0.0, true, &rules), 100.0);
    assert!((calculate_match_score(30.0, false, &rules) - 40.0).abs() < 1e-9);
    assert!((calculate_match_score(30.0, true, &rules) - 60.0).abs() < 1e-9);
}

#[test]
fn test_scoring_stays_in_range() {
    let rules = ScoringRules::default();

    for km in [0.0, 0.5, 10.0, 49.9, 50.0, 75.0, 500.0] {
        for preferred in [false, true] {
            let score = calculate_match_score(km, preferred, &rules);
            assert!((0.0..=100.0).contains(&score), "{} km -> {}", km, score);
        }
    }
}

#[test]
fn test_score_pair_falls_back_to_neutral() {
    let matcher = Matcher::with_default_rules();
    let seeker = test_seeker(1, "orphanage", None);

    let pair = matcher.score_pair(&test_donation(Some(Coordinates::new(18.52, 73.85)), &[]), &seeker);
    assert_eq!(pair.distance_km, None);
    assert_eq!(pair.match_score, 50.0);
}

#[test]
fn test_matcher_drops_ineligible_and_distant() {
    let matcher = Matcher::with_default_rules();
    let origin = Coordinates::new(18.52, 73.85);

    let mut unverified = test_seeker(2, "orphanage", Some(origin));
    unverified.verification_status = SeekerVerification::Rejected;

    let pool = vec![
        test_seeker(1, "orphanage", Some(origin)),
        unverified,
        test_seeker(3, "orphanage", None),
        test_seeker(4, "orphanage", Some(Coordinates::new(19.0760, 72.8777))),
    ];

    let result = matcher
        .find_candidates(&test_donation(Some(origin), &[]), pool, 50.0)
        .unwrap();

    assert_eq!(result.total_considered, 4);
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.candidates[0].seeker.id, 1);
}

#[test]
fn test_matcher_rejects_unresolved_donation() {
    let matcher = Matcher::with_default_rules();
    let result = matcher.find_candidates(&test_donation(None, &[]), vec![], 50.0);
    assert!(result.is_err());
}

#[test]
fn test_match_lifecycle_rules() {
    assert_eq!(
        next_match_status(MatchStatus::Pending, MatchAction::Accept, MatchParty::Seeker),
        Ok(MatchStatus::Accepted)
    );
    assert!(next_match_status(MatchStatus::Pending, MatchAction::Accept, MatchParty::Donor).is_err());
    assert!(next_match_status(MatchStatus::Pending, MatchAction::MarkDelivered, MatchParty::Donor).is_err());
    assert!(next_match_status(MatchStatus::Delivered, MatchAction::Reject, MatchParty::Seeker).is_err());
}

#[test]
fn test_request_lifecycle_rules() {
    assert!(next_request_status(RequestStatus::Pending, RequestStatus::Accepted).is_ok());
    assert!(next_request_status(RequestStatus::Accepted, RequestStatus::Completed).is_ok());
    assert!(next_request_status(RequestStatus::Pending, RequestStatus::Completed).is_err());
    assert!(next_request_status(RequestStatus::Rejected, RequestStatus::Accepted).is_err());
}

#[test]
fn test_verification_decisions() {
    assert_eq!(
        decide(VerificationStatus::UnderReview, ReviewDecision::NeedsMoreInfo),
        Ok(VerificationStatus::NeedsMoreInfo)
    );
    assert!(decide(VerificationStatus::Rejected, ReviewDecision::Approve).is_err());
    assert_eq!(ReviewDecision::NeedsMoreInfo.seeker_status(), None);
}

#[test]
fn test_locality_from_address() {
    assert_eq!(
        locality_from_address("12 MG Road, Camp, Pune, Maharashtra"),
        Some(("Pune".to_string(), "Maharashtra".to_string()))
    );
    assert_eq!(locality_from_address("Pune"), None);
}

#[test]
fn test_email_render() {
    let email = EmailTemplate::MatchProposal.render(
        "org@example.org",
        &EmailContext {
            recipient_name: "Balgram".to_string(),
            subject_line: "Winter blankets".to_string(),
            counterpart_name: "Asha".to_string(),
            message: "Pickup after 6pm".to_string(),
            link: "/matches/7".to_string(),
            ..EmailContext::default()
        },
        "UHV ShareHub",
        "https://sharehub.example/",
    );

    assert_eq!(email.subject, "New Donation Offer: Winter blankets");
    assert!(email.body.starts_with("Hello Balgram,"));
    assert!(email.body.contains("Message: Pickup after 6pm"));
    assert!(email.body.contains("https://sharehub.example/matches/7"));
}
