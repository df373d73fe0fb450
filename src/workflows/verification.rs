use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Actor;
use crate::core::verification::{begin_review as begin_review_status, decide};
use crate::core::ReviewDecision;
use crate::error::AppError;
use crate::models::{
    DonorProfile, DonorType, DonorVerification, HelpSeeker, NewDonorProfile, NewVerificationRequest, ProfileKind,
    ReviewDecisionRequest, SeekerVerification, SubmitVerificationRequest, VerificationOverview,
    VerificationRequest, VerificationStatus, VerificationUpdate, VerifierStamp,
};
use crate::services::{EmailContext, EmailTemplate, Notice};
use crate::state::AppState;

/// Submit documents for the actor's donor or help-seeker profile
///
/// The linked profile goes back to pending until an admin decides.
pub async fn submit(
    state: &AppState,
    actor: &Actor,
    req: SubmitVerificationRequest,
) -> Result<VerificationRequest, AppError> {
    req.validate()?;

    if let Some(latest) = state
        .store
        .latest_verification_request(actor.user_id, req.kind)
        .await?
    {
        if latest.status.is_open() {
            return Err(AppError::Conflict(format!(
                "Your {} request {} is still {}",
                req.kind.label(),
                latest.id,
                latest.status.as_str()
            )));
        }
    }

    let profile = match req.kind {
        ProfileKind::Donor => {
            let (donor, _) = state
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
            if donor.is_verified() {
                return Err(AppError::Conflict("Your donor profile is already verified".to_string()));
            }
            LinkedProfile::Donor(donor)
        }
        ProfileKind::HelpSeeker => {
            let seeker = state
                .store
                .find_help_seeker_by_user(actor.user_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound("Register as a help seeker before requesting verification".to_string())
                })?;
            if seeker.is_verified() {
                return Err(AppError::Conflict(
                    "Your help seeker profile is already verified".to_string(),
                ));
            }
            LinkedProfile::Seeker(seeker)
        }
    };

    profile.mark_pending(state).await?;

    let request = match state
        .store
        .insert_verification_request(NewVerificationRequest {
            user_id: actor.user_id,
            kind: req.kind,
            document: req.document,
        })
        .await
    {
        Ok(request) => request,
        Err(e) => {
            // A profile left pending without a request would never be reviewed
            if let Err(restore) = profile.restore(state).await {
                tracing::error!(
                    "Failed to restore {} status for {}: {}",
                    req.kind.label(),
                    actor.username,
                    restore
                );
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        "Verification request {} ({}) submitted by {}",
        request.id,
        req.kind.label(),
        actor.username
    );

    Ok(request)
}

/// The actor's latest request per profile kind
pub async fn status(state: &AppState, actor: &Actor) -> Result<VerificationOverview, AppError> {
    Ok(VerificationOverview {
        donor: state
            .store
            .latest_verification_request(actor.user_id, ProfileKind::Donor)
            .await?,
        help_seeker: state
            .store
            .latest_verification_request(actor.user_id, ProfileKind::HelpSeeker)
            .await?,
    })
}

/// Pending and under-review requests, oldest first
pub async fn queue(state: &AppState, actor: &Actor) -> Result<Vec<VerificationRequest>, AppError> {
    actor.require_staff()?;
    Ok(state.store.list_open_verification_requests().await?)
}

/// pending -> under_review
pub async fn begin_review(state: &AppState, actor: &Actor, id: i64) -> Result<VerificationRequest, AppError> {
    actor.require_staff()?;

    let current = state.store.get_verification_request(id).await?;
    let next = begin_review_status(current.status)?;

    let updated = state
        .store
        .transition_verification_request(
            id,
            current.status,
            VerificationUpdate {
                status: next,
                notes: None,
                reviewed_by: Some(actor.user_id),
                reviewed_at: None,
            },
        )
        .await?
        .ok_or_else(|| AppError::Forbidden(format!("verification request {} changed concurrently", id)))?;

    tracing::info!("Verification request {} under review by {}", id, actor.username);
    Ok(updated)
}

/// Record an admin decision and apply it to the linked profile
pub async fn decide_request(
    state: &AppState,
    actor: &Actor,
    id: i64,
    req: ReviewDecisionRequest,
) -> Result<VerificationRequest, AppError> {
    actor.require_staff()?;
    req.validate()?;

    let current = state.store.get_verification_request(id).await?;
    let next = decide(current.status, req.decision)?;
    let profile = LinkedProfile::load(state, &current).await?;
    let now = Utc::now();

    let updated = state
        .store
        .transition_verification_request(
            id,
            current.status,
            VerificationUpdate {
                status: next,
                notes: Some(req.notes),
                reviewed_by: Some(actor.user_id),
                reviewed_at: Some(now),
            },
        )
        .await?
        .ok_or_else(|| AppError::Forbidden(format!("verification request {} changed concurrently", id)))?;

    // Only approval writes the verifier; rejection keeps the previous stamp
    let stamp = (req.decision == ReviewDecision::Approve).then_some(VerifierStamp {
        verified_by: actor.user_id,
        verified_at: now,
    });

    if let Err(e) = profile.apply(state, req.decision, stamp).await {
        undo_decision(state, &current, next).await;
        return Err(e);
    }

    tracing::info!(
        "Verification request {} {} by {}",
        id,
        updated.status.as_str(),
        actor.username
    );

    notify_decision(state, &profile, &actor.username, req.decision.outcome(), &updated.notes);

    Ok(updated)
}

/// Put a request back where it was after its profile write failed
async fn undo_decision(state: &AppState, previous: &VerificationRequest, applied: VerificationStatus) {
    let restore = VerificationUpdate {
        status: previous.status,
        notes: Some(previous.notes.clone()),
        reviewed_by: previous.reviewed_by,
        reviewed_at: previous.reviewed_at,
    };

    match state
        .store
        .transition_verification_request(previous.id, applied, restore)
        .await
    {
        Ok(Some(_)) => tracing::warn!(
            "Verification request {} returned to {} after profile update failed",
            previous.id,
            previous.status.as_str()
        ),
        Ok(None) => tracing::error!(
            "Verification request {} moved on before its decision could be undone",
            previous.id
        ),
        Err(e) => tracing::error!("Failed to undo decision on request {}: {}", previous.id, e),
    }
}

/// The donor or help-seeker profile a verification decision lands on
pub(crate) enum LinkedProfile {
    Donor(DonorProfile),
    Seeker(HelpSeeker),
}

impl LinkedProfile {
    async fn load(state: &AppState, request: &VerificationRequest) -> Result<Self, AppError> {
        let profile = match request.kind {
            ProfileKind::Donor => state
                .store
                .find_donor_profile_by_user(request.user_id)
                .await?
                .map(LinkedProfile::Donor),
            ProfileKind::HelpSeeker => state
                .store
                .find_help_seeker_by_user(request.user_id)
                .await?
                .map(LinkedProfile::Seeker),
        };

        profile.ok_or_else(|| {
            AppError::NotFound(format!(
                "Verification request {} has no {} profile",
                request.id,
                request.kind.label()
            ))
        })
    }

    fn kind(&self) -> ProfileKind {
        match self {
            LinkedProfile::Donor(_) => ProfileKind::Donor,
            LinkedProfile::Seeker(_) => ProfileKind::HelpSeeker,
        }
    }

    fn user_id(&self) -> Uuid {
        match self {
            LinkedProfile::Donor(donor) => donor.user_id,
            LinkedProfile::Seeker(seeker) => seeker.user_id,
        }
    }

    fn email(&self) -> Option<String> {
        match self {
            LinkedProfile::Donor(donor) => donor.email.clone(),
            LinkedProfile::Seeker(seeker) => seeker.email.clone(),
        }
    }

    fn name(&self) -> &str {
        match self {
            LinkedProfile::Donor(donor) => donor.display_name(),
            LinkedProfile::Seeker(seeker) => &seeker.organization_name,
        }
    }

    async fn apply(
        &self,
        state: &AppState,
        decision: ReviewDecision,
        stamp: Option<VerifierStamp>,
    ) -> Result<(), AppError> {
        match self {
            LinkedProfile::Donor(donor) => {
                if let Some(status) = decision.donor_status() {
                    state.store.set_donor_verification(donor.id, status, stamp).await?;
                }
            }
            LinkedProfile::Seeker(seeker) => {
                if let Some(status) = decision.seeker_status() {
                    state.store.set_seeker_verification(seeker.id, status, stamp).await?;
                }
            }
        }
        Ok(())
    }

    async fn mark_pending(&self, state: &AppState) -> Result<(), AppError> {
        match self {
            LinkedProfile::Donor(donor) => {
                state
                    .store
                    .set_donor_verification(donor.id, DonorVerification::Pending, None)
                    .await?;
            }
            LinkedProfile::Seeker(seeker) => {
                state
                    .store
                    .set_seeker_verification(seeker.id, SeekerVerification::Pending, None)
                    .await?;
            }
        }
        Ok(())
    }

    /// Write back the status loaded before `mark_pending`
    async fn restore(&self, state: &AppState) -> Result<(), AppError> {
        match self {
            LinkedProfile::Donor(donor) => {
                state
                    .store
                    .set_donor_verification(donor.id, donor.verification_status, None)
                    .await?;
            }
            LinkedProfile::Seeker(seeker) => {
                state
                    .store
                    .set_seeker_verification(seeker.id, seeker.verification_status, None)
                    .await?;
            }
        }
        Ok(())
    }
}

pub(crate) fn notify_decision(
    state: &AppState,
    profile: &LinkedProfile,
    reviewer: &str,
    outcome: &str,
    notes: &str,
) {
    let kind = profile.kind();
    let link = "/verification/status".to_string();
    let email = profile.email();
    state.notifier.notify(
        Notice::new(
            profile.user_id(),
            format!("Your {} was {}", kind.label(), outcome),
            link.clone(),
        )
        .with_email(
            email.as_deref(),
            EmailTemplate::VerificationDecision,
            EmailContext {
                recipient_name: profile.name().to_string(),
                subject_line: kind.label().to_string(),
                counterpart_name: reviewer.to_string(),
                message: notes.to_string(),
                status: outcome.to_string(),
                link,
            },
        ),
    );
}
