use chrono::Utc;
use validator::Validate;

use crate::auth::Actor;
use crate::core::{calculate_bounding_box, next_match_status, MatchAction, MatchParty};
use crate::error::AppError;
use crate::models::{
    CandidatesResponse, Donation, DonationMatch, DonationStatus, MatchDetail, MatchResponseRequest,
    MatchStatus, MatchUpdate, NewDonationMatch, ProposeMatchRequest, SeekerFilter,
};
use crate::services::{EmailContext, EmailTemplate, Notice};
use crate::state::AppState;
use crate::workflows::donations::{load_donation, load_owned_donation};

/// Rank verified seekers around one of the actor's donations
pub async fn find_candidates(
    state: &AppState,
    actor: &Actor,
    donation_id: i64,
    radius_km: Option<f64>,
) -> Result<CandidatesResponse, AppError> {
    let (donation, _) = load_owned_donation(state, actor, donation_id).await?;
    let radius_km = state.matcher.effective_radius(radius_km);

    // Narrow the pool in the store before exact distances are computed
    let within = donation
        .location
        .map(|origin| calculate_bounding_box(origin.latitude, origin.longitude, radius_km));

    let pool = match within {
        Some(bbox) => {
            state
                .store
                .list_verified_seekers(&SeekerFilter {
                    within: Some(bbox),
                    require_location: true,
                    ..SeekerFilter::default()
                })
                .await?
        }
        None => Vec::new(),
    };

    let ranked = state.matcher.find_candidates(&donation, pool, radius_km)?;

    Ok(CandidatesResponse {
        donation_id,
        radius_km: ranked.radius_km,
        total_considered: ranked.total_considered,
        candidates: ranked.candidates,
    })
}

/// Donor offers a donation to a verified seeker
pub async fn propose_match(
    state: &AppState,
    actor: &Actor,
    donation_id: i64,
    req: ProposeMatchRequest,
) -> Result<DonationMatch, AppError> {
    req.validate()?;

    let (donation, donor) = load_owned_donation(state, actor, donation_id).await?;
    let seeker = state.store.get_help_seeker(req.seeker_id).await?;

    if !seeker.is_verified() {
        return Err(AppError::SeekerNotEligible(format!(
            "Help seeker {} is not verified",
            seeker.id
        )));
    }
    if !donation.is_available(Utc::now()) {
        return Err(AppError::Forbidden(format!(
            "cannot propose donation while {}",
            donation.status.as_str()
        )));
    }

    let score = state.matcher.score_pair(&donation, &seeker);

    let created = state
        .store
        .insert_match(NewDonationMatch {
            donation_id,
            help_seeker_id: seeker.id,
            distance_km: score.distance_km,
            match_score: score.match_score,
            donor_message: req.message,
            scheduled_pickup: req.scheduled_pickup,
        })
        .await?;

    tracing::info!(
        "Match {} proposed: donation {} -> help seeker {} (score {:.1})",
        created.id,
        donation_id,
        seeker.id,
        created.match_score
    );

    let link = format!("/matches/{}", created.id);
    state.notifier.notify(
        Notice::new(
            seeker.user_id,
            format!("{} offered you \"{}\"", donor.display_name(), donation.title),
            link.clone(),
        )
        .with_email(
            seeker.email.as_deref(),
            EmailTemplate::MatchProposal,
            EmailContext {
                recipient_name: seeker.organization_name.clone(),
                subject_line: donation.title.clone(),
                counterpart_name: donor.display_name().to_string(),
                message: created.donor_message.clone(),
                status: created.status.as_str().to_string(),
                link,
            },
        ),
    );

    Ok(created)
}

/// A match with its donation and seeker; parties and staff only
pub async fn get_match(state: &AppState, actor: &Actor, id: i64) -> Result<MatchDetail, AppError> {
    let donation_match = state.store.get_match(id).await?;
    let donation = load_donation(state, donation_match.donation_id).await?;
    let donor = state.store.get_donor_profile(donation.donor_id).await?;
    let help_seeker = state.store.get_help_seeker(donation_match.help_seeker_id).await?;

    let is_party = actor.user_id == donor.user_id || actor.user_id == help_seeker.user_id;
    if !is_party && !actor.is_staff && !actor.is_superuser {
        return Err(AppError::NotAuthorized(format!(
            "You are not a party to match {}",
            id
        )));
    }

    Ok(MatchDetail {
        donation_match,
        donation,
        help_seeker,
    })
}

pub async fn accept_match(
    state: &AppState,
    actor: &Actor,
    id: i64,
    req: MatchResponseRequest,
) -> Result<DonationMatch, AppError> {
    req.validate()?;
    transition(state, actor, id, MatchAction::Accept, Some(req.message)).await
}

pub async fn reject_match(
    state: &AppState,
    actor: &Actor,
    id: i64,
    req: MatchResponseRequest,
) -> Result<DonationMatch, AppError> {
    req.validate()?;
    transition(state, actor, id, MatchAction::Reject, Some(req.message)).await
}

pub async fn mark_delivered(state: &AppState, actor: &Actor, id: i64) -> Result<DonationMatch, AppError> {
    transition(state, actor, id, MatchAction::MarkDelivered, None).await
}

async fn transition(
    state: &AppState,
    actor: &Actor,
    id: i64,
    action: MatchAction,
    response: Option<String>,
) -> Result<DonationMatch, AppError> {
    let current = state.store.get_match(id).await?;
    let donation = state.store.get_donation(current.donation_id).await?;
    let donor = state.store.get_donor_profile(donation.donor_id).await?;
    let seeker = state.store.get_help_seeker(current.help_seeker_id).await?;

    // Seeker actions are checked from the seeker's side first so a user
    // holding both roles still acts on the right one
    let party = match action {
        MatchAction::Accept | MatchAction::Reject if actor.user_id == seeker.user_id => MatchParty::Seeker,
        _ if actor.user_id == donor.user_id => MatchParty::Donor,
        _ if actor.user_id == seeker.user_id => MatchParty::Seeker,
        _ => {
            return Err(AppError::NotAuthorized(format!(
                "You are not a party to match {}",
                id
            )))
        }
    };

    let next = next_match_status(current.status, action, party)?;

    let update = MatchUpdate {
        status: next,
        seeker_response: response,
        actual_delivery: (next == MatchStatus::Delivered).then(Utc::now),
    };

    // The donation is claimed before the match moves so two seekers
    // cannot both hold an accepted match for it
    if next == MatchStatus::Accepted {
        reserve_donation(state, &donation).await?;
    }

    let updated = match state.store.transition_match(id, current.status, update).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            if next == MatchStatus::Accepted {
                release_donation(state, donation.id).await;
            }
            return Err(AppError::Forbidden(format!("match {} changed concurrently", id)));
        }
        Err(e) => {
            if next == MatchStatus::Accepted {
                release_donation(state, donation.id).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        "Match {} {} -> {} by {}",
        id,
        current.status.as_str(),
        updated.status.as_str(),
        actor.username
    );

    if updated.status == MatchStatus::Delivered {
        match state
            .store
            .set_donation_status(donation.id, DonationStatus::Reserved, DonationStatus::Collected)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                "Donation {} was not reserved when match {} was delivered",
                donation.id,
                id
            ),
            Err(e) => tracing::warn!("Failed to update donation {}: {}", donation.id, e),
        }
    }

    let link = format!("/matches/{}", id);
    let notice = match updated.status {
        MatchStatus::Accepted | MatchStatus::Rejected => {
            let template = if updated.status == MatchStatus::Accepted {
                EmailTemplate::MatchAccepted
            } else {
                EmailTemplate::MatchRejected
            };
            Notice::new(
                donor.user_id,
                format!(
                    "{} {} your donation \"{}\"",
                    seeker.organization_name,
                    updated.status.as_str(),
                    donation.title
                ),
                link.clone(),
            )
            .with_email(
                donor.email.as_deref(),
                template,
                EmailContext {
                    recipient_name: donor.display_name().to_string(),
                    subject_line: donation.title.clone(),
                    counterpart_name: seeker.organization_name.clone(),
                    message: updated.seeker_response.clone(),
                    status: updated.status.as_str().to_string(),
                    link,
                },
            )
        }
        _ => Notice::new(
            seeker.user_id,
            format!("\"{}\" was marked delivered", donation.title),
            link.clone(),
        )
        .with_email(
            seeker.email.as_deref(),
            EmailTemplate::MatchDelivered,
            EmailContext {
                recipient_name: seeker.organization_name.clone(),
                subject_line: donation.title.clone(),
                counterpart_name: donor.display_name().to_string(),
                message: String::new(),
                status: updated.status.as_str().to_string(),
                link,
            },
        ),
    };
    state.notifier.notify(notice);

    Ok(updated)
}

async fn reserve_donation(state: &AppState, donation: &Donation) -> Result<(), AppError> {
    if !donation.is_available(Utc::now()) {
        return Err(AppError::Forbidden(format!(
            "cannot accept match while donation is {}",
            donation.status.as_str()
        )));
    }

    let reserved = state
        .store
        .set_donation_status(donation.id, DonationStatus::Available, DonationStatus::Reserved)
        .await?;
    if !reserved {
        return Err(AppError::Forbidden(format!(
            "donation {} is no longer available",
            donation.id
        )));
    }
    Ok(())
}

/// Undo a reservation taken for an accept that did not go through
async fn release_donation(state: &AppState, donation_id: i64) {
    match state
        .store
        .set_donation_status(donation_id, DonationStatus::Reserved, DonationStatus::Available)
        .await
    {
        Ok(true) => tracing::info!("Donation {} released after failed accept", donation_id),
        Ok(false) => tracing::warn!("Donation {} was not reserved on release", donation_id),
        Err(e) => tracing::warn!("Failed to release donation {}: {}", donation_id, e),
    }
}
