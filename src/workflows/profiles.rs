use validator::Validate;

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{
    DirectoryParams, DonorProfile, DonorProfileRequest, HelpSeeker, NewDonorProfile, NewHelpSeeker,
    RegisterHelpSeekerRequest, SeekerFilter, SeekerType,
};
use crate::state::AppState;

pub async fn list_seeker_types(state: &AppState) -> Result<Vec<SeekerType>, AppError> {
    Ok(state.store.list_seeker_types().await?)
}

/// Register the actor as a help-seeker organization, pending verification
pub async fn register_help_seeker(
    state: &AppState,
    actor: &Actor,
    req: RegisterHelpSeekerRequest,
) -> Result<HelpSeeker, AppError> {
    req.validate()?;

    if !state.store.seeker_type_exists(&req.seeker_type).await? {
        return Err(AppError::Validation(format!(
            "Unknown seeker type '{}'",
            req.seeker_type
        )));
    }
    if state.store.find_help_seeker_by_user(actor.user_id).await?.is_some() {
        return Err(AppError::Conflict(
            "You are already registered as a help seeker".to_string(),
        ));
    }

    let address = format!("{}, {}, {}, {}", req.address, req.city, req.state, req.pincode);
    let location = state.geocoder.geocode(&address).await;
    if location.is_none() {
        tracing::info!(
            "Help seeker '{}' registered without coordinates; it will not appear in candidate searches",
            req.organization_name
        );
    }

    let seeker = state
        .store
        .create_help_seeker(NewHelpSeeker {
            user_id: actor.user_id,
            email: actor.email.clone(),
            organization_name: req.organization_name,
            seeker_type: req.seeker_type,
            description: req.description,
            phone: req.phone,
            address: req.address,
            city: req.city,
            state: req.state,
            pincode: req.pincode,
            location,
            capacity: req.capacity,
            is_urgent: req.is_urgent,
            urgent_needs: req.urgent_needs,
        })
        .await?;

    tracing::info!("Help seeker {} registered by {}", seeker.id, actor.username);
    Ok(seeker)
}

/// Verified organizations, optionally narrowed by type and city
pub async fn directory(state: &AppState, params: DirectoryParams) -> Result<Vec<HelpSeeker>, AppError> {
    let filter = SeekerFilter {
        seeker_type: params.seeker_type.filter(|t| !t.trim().is_empty()),
        city: params.city.filter(|c| !c.trim().is_empty()),
        ..SeekerFilter::default()
    };

    Ok(state.store.list_verified_seekers(&filter).await?)
}

pub async fn get_donor_profile(state: &AppState, actor: &Actor) -> Result<DonorProfile, AppError> {
    state
        .store
        .find_donor_profile_by_user(actor.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("You have no donor profile yet".to_string()))
}

/// Create or edit the actor's donor profile; verification state is untouched
pub async fn save_donor_profile(
    state: &AppState,
    actor: &Actor,
    req: DonorProfileRequest,
) -> Result<DonorProfile, AppError> {
    req.validate()?;

    let profile = state
        .store
        .upsert_donor_profile(NewDonorProfile {
            user_id: actor.user_id,
            username: actor.username.clone(),
            email: actor.email.clone(),
            organization_name: req.organization_name.filter(|n| !n.trim().is_empty()),
            donor_type: req.donor_type,
            phone: req.phone,
            address: req.address,
            city: req.city,
            state: req.state,
            pincode: req.pincode,
        })
        .await?;

    tracing::info!("Donor profile {} saved by {}", profile.id, actor.username);
    Ok(profile)
}
