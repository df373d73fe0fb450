use thiserror::Error;

use crate::core::{
    distance::calculate_bounding_box,
    filters::{is_eligible, is_preferred_type, within_bounding_box},
    scoring::{calculate_match_score, unresolved_score},
};
use crate::models::{Candidate, Donation, HelpSeeker, ScoringRules};

/// Default search radius around a donation's pickup point
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    #[error("donation {0} has no resolved pickup location")]
    UnresolvedLocation(i64),
}

/// Result of the matching process
#[derive(Debug)]
pub struct CandidateList {
    pub candidates: Vec<Candidate>,
    pub total_considered: usize,
    pub radius_km: f64,
}

/// Distance and score computed for a single donation/seeker pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub distance_km: Option<f64>,
    pub match_score: f64,
}

/// Ranks help seekers for a donation
///
/// # Pipeline Stages
/// 1. Eligibility (verified with resolved coordinates)
/// 2. Geospatial bounding box pre-filter
/// 3. Exact distance and radius cut
/// 4. Scoring and ranking
#[derive(Debug, Clone)]
pub struct Matcher {
    rules: ScoringRules,
    default_radius_km: f64,
    max_radius_km: f64,
}

impl Matcher {
    pub fn new(rules: ScoringRules, default_radius_km: f64, max_radius_km: f64) -> Self {
        Self {
            rules,
            default_radius_km,
            max_radius_km: max_radius_km.max(default_radius_km),
        }
    }

    pub fn with_default_rules() -> Self {
        Self::new(ScoringRules::default(), DEFAULT_RADIUS_KM, DEFAULT_RADIUS_KM * 4.0)
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Resolve a caller-supplied radius against the configured default and cap
    pub fn effective_radius(&self, requested: Option<f64>) -> f64 {
        match requested {
            Some(radius) if radius.is_finite() && radius > 0.0 => radius.min(self.max_radius_km),
            _ => self.default_radius_km,
        }
    }

    /// Find help seekers near a donation, best first
    ///
    /// Pure computation over the provided pool. Results are sorted by score
    /// descending; equal scores fall back to seeker id ascending so the
    /// order never depends on how the pool was fetched.
    ///
    /// # Arguments
    /// * `donation` - The donation to place; must have a resolved location
    /// * `pool` - Candidate seekers, normally pre-filtered by the store
    /// * `radius_km` - Seekers farther than this are dropped
    pub fn find_candidates(
        &self,
        donation: &Donation,
        pool: Vec<HelpSeeker>,
        radius_km: f64,
    ) -> Result<CandidateList, MatchError> {
        let origin = donation
            .location
            .ok_or(MatchError::UnresolvedLocation(donation.id))?;

        let total_considered = pool.len();
        let bounding_box = calculate_bounding_box(origin.latitude, origin.longitude, radius_km);

        let mut candidates: Vec<Candidate> = pool
            .into_iter()
            // Stage 1: Eligibility
            .filter(is_eligible)
            // Stage 2: Bounding box pre-filter
            .filter(|seeker| within_bounding_box(seeker, &bounding_box))
            // Stage 3 & 4: Exact distance, radius cut, scoring
            .filter_map(|seeker| {
                let location = seeker.location?;
                let distance_km = origin.distance_km(&location);

                if distance_km > radius_km {
                    return None;
                }

                let preferred_type = is_preferred_type(donation, &seeker);
                let match_score = calculate_match_score(distance_km, preferred_type, &self.rules);

                Some(Candidate {
                    seeker,
                    distance_km,
                    match_score,
                    preferred_type,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.match_score
                .total_cmp(&a.match_score)
                .then_with(|| a.seeker.id.cmp(&b.seeker.id))
        });

        tracing::debug!(
            "Ranked {} of {} seekers for donation {} within {} km",
            candidates.len(),
            total_considered,
            donation.id,
            radius_km
        );

        Ok(CandidateList {
            candidates,
            total_considered,
            radius_km,
        })
    }

    /// Score one pair at proposal time
    ///
    /// Unlike `find_candidates` this never fails on missing coordinates:
    /// the distance stays unset and the neutral score is used.
    pub fn score_pair(&self, donation: &Donation, seeker: &HelpSeeker) -> PairScore {
        match (donation.location, seeker.location) {
            (Some(origin), Some(target)) => {
                let distance_km = origin.distance_km(&target);
                PairScore {
                    distance_km: Some(distance_km),
                    match_score: calculate_match_score(
                        distance_km,
                        is_preferred_type(donation, seeker),
                        &self.rules,
                    ),
                }
            }
            _ => PairScore {
                distance_km: None,
                match_score: unresolved_score(&self.rules),
            },
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::EARTH_RADIUS_KM;
    use crate::models::{Coordinates, DonationStatus, SeekerVerification};
    use chrono::Utc;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    const PUNE: (f64, f64) = (18.52, 73.85);

    fn north_of_pune(km: f64) -> Coordinates {
        Coordinates::new(PUNE.0 + (km / EARTH_RADIUS_KM).to_degrees(), PUNE.1)
    }

    fn create_seeker(id: i64, seeker_type: &str, location: Option<Coordinates>) -> HelpSeeker {
        HelpSeeker {
            id,
            user_id: Uuid::new_v4(),
            email: None,
            organization_name: format!("Org {}", id),
            seeker_type: seeker_type.to_string(),
            description: String::new(),
            phone: String::new(),
            address: String::new(),
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: String::new(),
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

    fn create_donation(preferred: &[&str]) -> Donation {
        Donation {
            id: 7,
            donor_id: 1,
            title: "Cooked rice".to_string(),
            description: String::new(),
            category: "Food".to_string(),
            quantity: 40,
            pickup_address: "FC Road, Pune, Maharashtra".to_string(),
            pickup_city: "Pune".to_string(),
            pickup_state: "Maharashtra".to_string(),
            location: Some(Coordinates::new(PUNE.0, PUNE.1)),
            pickup_deadline: Utc::now(),
            status: DonationStatus::Available,
            preferred_seeker_types: preferred.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pune_scenario() {
        let matcher = Matcher::with_default_rules();
        let donation = create_donation(&["orphanage"]);

        let pool = vec![
            create_seeker(1, "orphanage", Some(Coordinates::new(PUNE.0, PUNE.1))),
            create_seeker(2, "food_bank", Some(north_of_pune(30.0))),
        ];

        let result = matcher.find_candidates(&donation, pool, 50.0).unwrap();

        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[0].seeker.id, 1);
        assert_eq!(result.candidates[0].match_score, 100.0);
        assert!(result.candidates[0].preferred_type);
        assert_eq!(result.candidates[1].seeker.id, 2);
        assert!((result.candidates[1].match_score - 40.0).abs() < 1e-6);
        assert!((result.candidates[1].distance_km - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_unresolved_donation_fails() {
        let matcher = Matcher::with_default_rules();
        let mut donation = create_donation(&[]);
        donation.location = None;

        let pool = vec![create_seeker(1, "orphanage", Some(north_of_pune(1.0)))];

        assert_eq!(
            matcher.find_candidates(&donation, pool, 50.0).unwrap_err(),
            MatchError::UnresolvedLocation(7)
        );
    }

    #[test]
    fn test_radius_cut() {
        let matcher = Matcher::with_default_rules();
        let donation = create_donation(&[]);

        let pool = vec![
            create_seeker(1, "orphanage", Some(north_of_pune(49.0))),
            create_seeker(2, "orphanage", Some(north_of_pune(51.0))),
            create_seeker(3, "orphanage", Some(Coordinates::new(28.61, 77.20))),
        ];

        let result = matcher.find_candidates(&donation, pool, 50.0).unwrap();

        assert_eq!(result.total_considered, 3);
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].seeker.id, 1);
    }

    #[test]
    fn test_ineligible_seekers_dropped() {
        let matcher = Matcher::with_default_rules();
        let donation = create_donation(&["orphanage"]);

        let mut pending = create_seeker(1, "orphanage", Some(north_of_pune(1.0)));
        pending.verification_status = SeekerVerification::Pending;
        let unresolved = create_seeker(2, "orphanage", None);
        let good = create_seeker(3, "orphanage", Some(north_of_pune(1.0)));

        let result = matcher
            .find_candidates(&donation, vec![pending, unresolved, good], 50.0)
            .unwrap();

        let ids: Vec<i64> = result.candidates.iter().map(|c| c.seeker.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_ties_break_by_seeker_id() {
        let matcher = Matcher::with_default_rules();
        let donation = create_donation(&[]);
        let spot = north_of_pune(10.0);

        let pool = vec![
            create_seeker(9, "orphanage", Some(spot)),
            create_seeker(2, "orphanage", Some(spot)),
            create_seeker(5, "orphanage", Some(spot)),
        ];

        let result = matcher.find_candidates(&donation, pool, 50.0).unwrap();
        let ids: Vec<i64> = result.candidates.iter().map(|c| c.seeker.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn test_effective_radius() {
        let matcher = Matcher::new(ScoringRules::default(), 50.0, 200.0);
        assert_eq!(matcher.effective_radius(None), 50.0);
        assert_eq!(matcher.effective_radius(Some(10.0)), 10.0);
        assert_eq!(matcher.effective_radius(Some(1000.0)), 200.0);
        assert_eq!(matcher.effective_radius(Some(-3.0)), 50.0);
        assert_eq!(matcher.effective_radius(Some(f64::NAN)), 50.0);
    }

    #[test]
    fn test_score_pair_without_location() {
        let matcher = Matcher::with_default_rules();
        let donation = create_donation(&[]);
        let seeker = create_seeker(1, "orphanage", None);

        let pair = matcher.score_pair(&donation, &seeker);
        assert_eq!(pair.distance_km, None);
        assert_eq!(pair.match_score, 50.0);
    }

    #[test]
    fn test_score_pair_matches_listing() {
        let matcher = Matcher::with_default_rules();
        let donation = create_donation(&["orphanage"]);
        let seeker = create_seeker(1, "orphanage", Some(north_of_pune(20.0)));

        let pair = matcher.score_pair(&donation, &seeker);
        let listed = matcher
            .find_candidates(&donation, vec![seeker], 50.0)
            .unwrap();

        assert_eq!(pair.match_score, listed.candidates[0].match_score);
    }

    /// Small deterministic generator so the pool is the same on every run
    struct Lcg(u64);

    impl Lcg {
        fn next_f64(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }

        fn offset(&mut self, spread: f64) -> f64 {
            (self.next_f64() * 2.0 - 1.0) * spread
        }
    }

    #[test]
    fn test_generated_pool_ranking_holds() {
        let matcher = Matcher::with_default_rules();
        let donation = create_donation(&["orphanage"]);
        let origin = donation.location.unwrap();
        let types = ["orphanage", "old_age_home", "shelter", "school"];
        let mut rng = Lcg(0x5eed);

        let pool: Vec<HelpSeeker> = (1..=600)
            .map(|id| {
                let location = Coordinates::new(PUNE.0 + rng.offset(2.0), PUNE.1 + rng.offset(2.0));
                let seeker_type = types[(rng.next_f64() * types.len() as f64) as usize];
                let mut seeker = create_seeker(id, seeker_type, Some(location));
                // Every tenth seeker is still pending and must never be ranked
                if id % 10 == 0 {
                    seeker.verification_status = SeekerVerification::Pending;
                }
                seeker
            })
            .collect();

        for radius_km in [5.0, 25.0, 50.0, 120.0, 200.0] {
            let ranked = matcher
                .find_candidates(&donation, pool.clone(), radius_km)
                .unwrap();
            assert_eq!(ranked.total_considered, pool.len());

            for candidate in &ranked.candidates {
                assert!(candidate.distance_km <= radius_km);
                assert!((0.0..=100.0).contains(&candidate.match_score));
                assert_eq!(candidate.preferred_type, candidate.seeker.seeker_type == "orphanage");
                assert_ne!(candidate.seeker.id % 10, 0);
            }

            for pair in ranked.candidates.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                assert!(
                    a.match_score > b.match_score
                        || (a.match_score == b.match_score && a.seeker.id < b.seeker.id),
                    "seeker {} ({}) ranked before {} ({})",
                    a.seeker.id,
                    a.match_score,
                    b.seeker.id,
                    b.match_score
                );
            }

            // The bounding box pre-filter must not lose seekers inside the radius
            let ranked_ids: BTreeSet<i64> = ranked.candidates.iter().map(|c| c.seeker.id).collect();
            for seeker in pool.iter().filter(|s| s.id % 10 != 0) {
                let distance = origin.distance_km(&seeker.location.unwrap());
                if distance < radius_km - 0.01 {
                    assert!(ranked_ids.contains(&seeker.id), "seeker {} at {:.2} km missing", seeker.id, distance);
                }
            }
        }
    }
}
