use chrono::Utc;
use std::collections::BTreeSet;
use validator::Validate;

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{
    locality_from_address, Coordinates, CreateDonationRequest, Donation, DonationRequest,
    DonationStatus, DonorProfile, DonorType, NewDonation, NewDonationRequest, NewDonorProfile,
    RequestDonationBody, RequestStatus, UpdateDonationRequest,
};
use crate::core::next_request_status;
use crate::services::{EmailContext, EmailTemplate, Notice};
use crate::state::AppState;

/// Load a donation, expiring it first when its deadline has passed
pub(crate) async fn load_donation(state: &AppState, id: i64) -> Result<Donation, AppError> {
    let mut donation = state.store.get_donation(id).await?;

    if donation.refresh_expiry(Utc::now()) {
        let flipped = state
            .store
            .set_donation_status(id, DonationStatus::Available, DonationStatus::Expired)
            .await?;

        if flipped {
            tracing::info!("Donation {} expired at {}", id, donation.pickup_deadline);
        } else {
            // Someone reserved it in between; their status wins
            donation = state.store.get_donation(id).await?;
        }
    }

    Ok(donation)
}

/// Load a donation together with its donor, failing unless the actor owns it
pub(crate) async fn load_owned_donation(
    state: &AppState,
    actor: &Actor,
    id: i64,
) -> Result<(Donation, DonorProfile), AppError> {
    let donation = load_donation(state, id).await?;
    let donor = state.store.get_donor_profile(donation.donor_id).await?;

    if donor.user_id != actor.user_id {
        return Err(AppError::NotAuthorized(format!(
            "You do not own donation {}",
            id
        )));
    }

    Ok((donation, donor))
}

async fn check_seeker_types(state: &AppState, tags: &[String]) -> Result<BTreeSet<String>, AppError> {
    let mut preferred = BTreeSet::new();
    for tag in tags {
        if !state.store.seeker_type_exists(tag).await? {
            return Err(AppError::Validation(format!("Unknown seeker type '{}'", tag)));
        }
        preferred.insert(tag.clone());
    }
    Ok(preferred)
}

fn pickup_locality(address: &str, city: Option<String>, region: Option<String>) -> (String, String) {
    let derived = locality_from_address(address).unwrap_or_default();
    let city = city.filter(|c| !c.trim().is_empty()).unwrap_or(derived.0);
    let region = region.filter(|s| !s.trim().is_empty()).unwrap_or(derived.1);
    (city, region)
}

/// Publish a donation, provisioning the actor's donor profile on first use
pub async fn create_donation(
    state: &AppState,
    actor: &Actor,
    req: CreateDonationRequest,
) -> Result<Donation, AppError> {
    req.validate()?;

    let preferred = check_seeker_types(state, &req.preferred_seeker_types).await?;

    let (donor, created) = state
        .store
        .get_or_create_donor_profile(NewDonorProfile {
            user_id: actor.user_id,
            username: actor.username.clone(),
            email: actor.email.clone(),
            organization_name: Some(actor.username.clone()),
            donor_type: DonorType::Individual,
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            pincode: String::new(),
        })
        .await?;

    if created {
        tracing::info!("Provisioned donor profile {} for {}", donor.id, actor.username);
    }

    let (pickup_city, pickup_state) =
        pickup_locality(&req.pickup_address, req.pickup_city, req.pickup_state);

    let location = match Coordinates::from_parts(req.latitude, req.longitude) {
        Some(coordinates) => Some(coordinates),
        None => state.geocoder.geocode(&req.pickup_address).await,
    };

    let status = if req.pickup_deadline < Utc::now() {
        DonationStatus::Expired
    } else {
        DonationStatus::Available
    };

    let donation = state
        .store
        .insert_donation(NewDonation {
            donor_id: donor.id,
            title: req.title,
            description: req.description,
            category: req.category,
            quantity: req.quantity,
            pickup_address: req.pickup_address,
            pickup_city,
            pickup_state,
            location,
            pickup_deadline: req.pickup_deadline,
            status,
            preferred_seeker_types: preferred,
        })
        .await?;

    tracing::info!(
        "Donation {} '{}' created by donor {} (location resolved: {})",
        donation.id,
        donation.title,
        donor.id,
        donation.location.is_some()
    );

    Ok(donation)
}

/// Available donations, newest first
pub async fn list_available(state: &AppState, category: Option<&str>) -> Result<Vec<Donation>, AppError> {
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    Ok(state.store.list_available_donations(Utc::now(), category).await?)
}

/// The actor's own donations, with lazy expiry applied
pub async fn list_mine(state: &AppState, actor: &Actor) -> Result<Vec<Donation>, AppError> {
    let Some(donor) = state.store.find_donor_profile_by_user(actor.user_id).await? else {
        return Ok(Vec::new());
    };

    let now = Utc::now();
    let mut donations = state.store.list_donations_by_donor(donor.id).await?;
    for donation in donations.iter_mut() {
        if donation.refresh_expiry(now) {
            state
                .store
                .set_donation_status(donation.id, DonationStatus::Available, DonationStatus::Expired)
                .await?;
        }
    }

    Ok(donations)
}

pub async fn get_donation(state: &AppState, id: i64) -> Result<Donation, AppError> {
    load_donation(state, id).await
}

/// Owner edit.
///
/// A donation without coordinates is geocoded on every edit. Resolved
/// coordinates only follow an address change when `regeocode_on_edit` is
/// enabled. Status is left to the compare-and-set transitions.
pub async fn update_donation(
    state: &AppState,
    actor: &Actor,
    id: i64,
    req: UpdateDonationRequest,
) -> Result<Donation, AppError> {
    req.validate()?;

    let (mut donation, _) = load_owned_donation(state, actor, id).await?;

    if matches!(donation.status, DonationStatus::Collected | DonationStatus::Expired) {
        return Err(AppError::Forbidden(format!(
            "cannot edit donation while {}",
            donation.status.as_str()
        )));
    }

    if let Some(tags) = &req.preferred_seeker_types {
        donation.preferred_seeker_types = check_seeker_types(state, tags).await?;
    }
    if let Some(title) = req.title {
        donation.title = title;
    }
    if let Some(description) = req.description {
        donation.description = description;
    }
    if let Some(quantity) = req.quantity {
        donation.quantity = quantity;
    }
    if let Some(deadline) = req.pickup_deadline {
        donation.pickup_deadline = deadline;
    }
    let mut address_changed = false;
    if let Some(address) = req.pickup_address {
        if address != donation.pickup_address {
            let (city, region) = pickup_locality(&address, None, None);
            donation.pickup_city = city;
            donation.pickup_state = region;
            donation.pickup_address = address;
            address_changed = true;
        }
    }

    if donation.location.is_none() || (address_changed && state.regeocode_on_edit) {
        donation.location = state.geocoder.geocode(&donation.pickup_address).await;
        tracing::debug!(
            "Geocoded donation {} on edit (resolved: {})",
            id,
            donation.location.is_some()
        );
    }

    let mut updated = state.store.update_donation(&donation).await?;

    // A deadline moved into the past expires the donation
    if updated.refresh_expiry(Utc::now()) {
        let flipped = state
            .store
            .set_donation_status(id, DonationStatus::Available, DonationStatus::Expired)
            .await?;
        if !flipped {
            updated = state.store.get_donation(id).await?;
        }
    }

    tracing::info!("Donation {} updated by {}", id, actor.username);

    Ok(updated)
}

/// Ask the donor for a donation; one request per user and donation
pub async fn request_donation(
    state: &AppState,
    actor: &Actor,
    donation_id: i64,
    body: RequestDonationBody,
) -> Result<DonationRequest, AppError> {
    body.validate()?;

    let donation = load_donation(state, donation_id).await?;
    let donor = state.store.get_donor_profile(donation.donor_id).await?;

    if donor.user_id == actor.user_id {
        return Err(AppError::Forbidden("cannot request your own donation".to_string()));
    }
    if !donation.is_available(Utc::now()) {
        return Err(AppError::Forbidden(format!(
            "cannot request donation while {}",
            donation.status.as_str()
        )));
    }

    let request = state
        .store
        .insert_donation_request(NewDonationRequest {
            donation_id,
            requester_id: actor.user_id,
            requester_name: actor.username.clone(),
            requester_email: actor.email.clone(),
            message: body.message,
            requested_quantity: body.requested_quantity,
        })
        .await?;

    tracing::info!(
        "Donation request {} from {} for donation {}",
        request.id,
        actor.username,
        donation_id
    );

    let link = format!("/donations/{}/requests", donation_id);
    state.notifier.notify(
        Notice::new(
            donor.user_id,
            format!("{} requested your donation \"{}\"", actor.username, donation.title),
            link.clone(),
        )
        .with_email(
            donor.email.as_deref(),
            EmailTemplate::RequestReceived,
            EmailContext {
                recipient_name: donor.display_name().to_string(),
                subject_line: donation.title.clone(),
                counterpart_name: actor.username.clone(),
                message: request.message.clone(),
                status: request.status.as_str().to_string(),
                link,
            },
        ),
    );

    Ok(request)
}

/// Requests for one of the actor's donations, newest first
pub async fn list_requests(
    state: &AppState,
    actor: &Actor,
    donation_id: i64,
) -> Result<Vec<DonationRequest>, AppError> {
    load_owned_donation(state, actor, donation_id).await?;
    Ok(state.store.list_donation_requests(donation_id).await?)
}

/// Donor decides a request: accept (reserving the donation), reject, or complete
pub async fn update_request_status(
    state: &AppState,
    actor: &Actor,
    request_id: i64,
    target: RequestStatus,
) -> Result<DonationRequest, AppError> {
    let request = state.store.get_donation_request(request_id).await?;
    let (donation, donor) = load_owned_donation(state, actor, request.donation_id).await?;

    next_request_status(request.status, target)?;

    if target == RequestStatus::Accepted {
        let reserved = state
            .store
            .set_donation_status(donation.id, DonationStatus::Available, DonationStatus::Reserved)
            .await?;
        if !reserved {
            return Err(AppError::Forbidden(format!(
                "cannot accept request while donation is {}",
                donation.status.as_str()
            )));
        }
    }

    let updated = match state
        .store
        .set_donation_request_status(request_id, request.status, target)
        .await?
    {
        Some(updated) => updated,
        None => {
            if target == RequestStatus::Accepted {
                // Hand the reservation back; the request moved under us
                state
                    .store
                    .set_donation_status(donation.id, DonationStatus::Reserved, DonationStatus::Available)
                    .await?;
            }
            return Err(AppError::Forbidden(format!(
                "donation request {} changed concurrently",
                request_id
            )));
        }
    };

    if target == RequestStatus::Completed {
        match state
            .store
            .set_donation_status(donation.id, DonationStatus::Reserved, DonationStatus::Collected)
            .await
        {
            Ok(true) => tracing::info!("Donation {} collected", donation.id),
            Ok(false) => tracing::warn!(
                "Donation {} was {} when its request completed",
                donation.id,
                donation.status.as_str()
            ),
            Err(e) => tracing::warn!("Failed to mark donation {} collected: {}", donation.id, e),
        }
    }

    tracing::info!(
        "Donation request {} {} -> {}",
        request_id,
        request.status.as_str(),
        updated.status.as_str()
    );

    let link = format!("/donations/{}", donation.id);
    state.notifier.notify(
        Notice::new(
            updated.requester_id,
            format!(
                "Your request for \"{}\" was {}",
                donation.title,
                updated.status.as_str()
            ),
            link.clone(),
        )
        .with_email(
            updated.requester_email.as_deref(),
            EmailTemplate::RequestStatus,
            EmailContext {
                recipient_name: updated.requester_name.clone(),
                subject_line: donation.title.clone(),
                counterpart_name: donor.display_name().to_string(),
                message: String::new(),
                status: updated.status.as_str().to_string(),
                link,
            },
        ),
    );

    Ok(updated)
}
