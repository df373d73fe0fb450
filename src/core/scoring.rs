use crate::models::ScoringRules;

/// Calculate a match score (0-100) for a seeker at `distance_km`
///
/// Scoring formula:
/// score = clamp(0, 100, 100 - distance_km * penalty_per_km)
///       + preference_bonus            # seeker type is on the donation's preferred list
/// clamped again to [0, 100]
pub fn calculate_match_score(distance_km: f64, preferred_type: bool, rules: &ScoringRules) -> f64 {
    let distance_score = clamp_score(MAX_SCORE - distance_km * rules.penalty_per_km);

    let bonus = if preferred_type { rules.preference_bonus } else { 0.0 };

    clamp_score(distance_score + bonus)
}

/// Score used when a proposal is made without coordinates on both sides
#[inline]
pub fn unresolved_score(rules: &ScoringRules) -> f64 {
    clamp_score(rules.neutral_score)
}

const MAX_SCORE: f64 = 100.0;

#[inline]
fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, MAX_SCORE)
}
