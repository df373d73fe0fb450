use crate::models::{BoundingBox, Donation, HelpSeeker};

/// Check if a seeker may receive donations at all
///
/// Only verified organizations with resolved coordinates qualify; the
/// engine re-checks this even when the store already filtered the pool.
#[inline]
pub fn is_eligible(seeker: &HelpSeeker) -> bool {
    seeker.is_eligible()
}

/// Whether the donor listed this seeker's organization type as preferred
#[inline]
pub fn is_preferred_type(donation: &Donation, seeker: &HelpSeeker) -> bool {
    donation.prefers(&seeker.seeker_type)
}

/// Cheap geospatial pre-filter ahead of exact distances
#[inline]
pub fn within_bounding_box(seeker: &HelpSeeker, bbox: &BoundingBox) -> bool {
    match seeker.location {
        Some(point) => super::distance::is_within_bounding_box(point.latitude, point.longitude, bbox),
        None => false,
    }
}
