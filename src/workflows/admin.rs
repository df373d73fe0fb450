use chrono::Utc;

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{
    BulkOutcome, BulkProfilesRequest, DonorVerification, ProfileCounts, ProfileKind,
    ProfileListParams, ProfileListing, ProfileQuery, SeekerVerification, VerifierStamp,
};
use crate::state::AppState;
use crate::workflows::verification::{notify_decision, LinkedProfile};

/// Superuser action applied straight to a profile, bypassing the request queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAction {
    Verify,
    Reject,
    Delete,
}

impl ProfileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileAction::Verify => "verified",
            ProfileAction::Reject => "rejected",
            ProfileAction::Delete => "deleted",
        }
    }
}

/// Apply one action to one profile
pub async fn apply(
    state: &AppState,
    actor: &Actor,
    kind: ProfileKind,
    id: i64,
    action: ProfileAction,
) -> Result<(), AppError> {
    actor.require_superuser()?;
    apply_one(state, actor, kind, id, action).await
}

async fn apply_one(
    state: &AppState,
    actor: &Actor,
    kind: ProfileKind,
    id: i64,
    action: ProfileAction,
) -> Result<(), AppError> {
    let stamp = VerifierStamp {
        verified_by: actor.user_id,
        verified_at: Utc::now(),
    };

    let profile = match (kind, action) {
        (ProfileKind::Donor, ProfileAction::Delete) => {
            state.store.delete_donor_profile(id).await?;
            tracing::info!("Donor profile {} deleted by {}", id, actor.username);
            return Ok(());
        }
        (ProfileKind::HelpSeeker, ProfileAction::Delete) => {
            state.store.delete_help_seeker(id).await?;
            tracing::info!("Help seeker {} deleted by {}", id, actor.username);
            return Ok(());
        }
        (ProfileKind::Donor, ProfileAction::Verify) => {
            let donor = state
                .store
                .set_donor_verification(id, DonorVerification::Verified, Some(stamp))
                .await?;
            LinkedProfile::Donor(donor)
        }
        (ProfileKind::Donor, ProfileAction::Reject) => {
            let donor = state
                .store
                .set_donor_verification(id, DonorVerification::Rejected, None)
                .await?;
            LinkedProfile::Donor(donor)
        }
        (ProfileKind::HelpSeeker, ProfileAction::Verify) => {
            let seeker = state
                .store
                .set_seeker_verification(id, SeekerVerification::Verified, Some(stamp))
                .await?;
            LinkedProfile::Seeker(seeker)
        }
        (ProfileKind::HelpSeeker, ProfileAction::Reject) => {
            let seeker = state
                .store
                .set_seeker_verification(id, SeekerVerification::Rejected, None)
                .await?;
            LinkedProfile::Seeker(seeker)
        }
    };

    tracing::info!(
        "{:?} profile {} {} by {}",
        kind,
        id,
        action.as_str(),
        actor.username
    );
    notify_decision(state, &profile, &actor.username, action.as_str(), "");

    Ok(())
}

/// Apply one action to many profiles; each id succeeds or fails on its own
pub async fn apply_bulk(
    state: &AppState,
    actor: &Actor,
    req: BulkProfilesRequest,
    action: ProfileAction,
) -> Result<BulkOutcome, AppError> {
    actor.require_superuser()?;

    let mut outcome = BulkOutcome::default();

    for id in req.donor_ids {
        match apply_one(state, actor, ProfileKind::Donor, id, action).await {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                tracing::warn!("Bulk {} skipped donor profile {}: {}", action.as_str(), id, e);
                outcome.failed_donor_ids.push(id);
            }
        }
    }

    for id in req.seeker_ids {
        match apply_one(state, actor, ProfileKind::HelpSeeker, id, action).await {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                tracing::warn!("Bulk {} skipped help seeker {}: {}", action.as_str(), id, e);
                outcome.failed_seeker_ids.push(id);
            }
        }
    }

    tracing::info!(
        "Bulk {} by {}: {} succeeded, {} failed",
        action.as_str(),
        actor.username,
        outcome.succeeded,
        outcome.failed_donor_ids.len() + outcome.failed_seeker_ids.len()
    );

    Ok(outcome)
}

const DONOR_STATUSES: [&str; 4] = ["not_submitted", "pending", "verified", "rejected"];
const SEEKER_STATUSES: [&str; 3] = ["pending", "verified", "rejected"];

/// Donor and help-seeker profiles for the superuser panel, plus counters
///
/// `kind` narrows to one side; the other list comes back empty.
pub async fn list_profiles(
    state: &AppState,
    actor: &Actor,
    params: ProfileListParams,
) -> Result<ProfileListing, AppError> {
    actor.require_superuser()?;

    let kind = match params.kind.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some("donor") | Some("donors") => Some(ProfileKind::Donor),
        Some("seeker") | Some("seekers") | Some("help_seeker") | Some("help-seeker") => {
            Some(ProfileKind::HelpSeeker)
        }
        Some(other) => {
            return Err(AppError::Validation(format!("Unknown profile kind '{}'", other)))
        }
    };

    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(status) => {
            let known = match kind {
                Some(ProfileKind::HelpSeeker) => SEEKER_STATUSES.contains(&status),
                _ => DONOR_STATUSES.contains(&status),
            };
            if !known {
                return Err(AppError::Validation(format!("Unknown verification status '{}'", status)));
            }
            Some(status.to_string())
        }
    };

    let query = ProfileQuery {
        status,
        search: params
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty()),
    };

    let donors = if kind != Some(ProfileKind::HelpSeeker) {
        state.store.search_donor_profiles(&query).await?
    } else {
        Vec::new()
    };
    let seekers = if kind != Some(ProfileKind::Donor) {
        state.store.search_help_seekers(&query).await?
    } else {
        Vec::new()
    };

    Ok(ProfileListing {
        donors,
        seekers,
        counts: state.store.profile_counts().await?,
    })
}

pub async fn counts(state: &AppState, actor: &Actor) -> Result<ProfileCounts, AppError> {
    actor.require_superuser()?;
    Ok(state.store.profile_counts().await?)
}
