use chrono::Utc;
use validator::Validate;

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{
    CreateHelpRequest, HelpRequest, HelpRequestListParams, HelpSeeker, NewHelpRequest,
    SeekerDashboard,
};
use crate::state::AppState;

/// The actor's help-seeker organization; posting needs requires one
async fn own_seeker(state: &AppState, actor: &Actor) -> Result<HelpSeeker, AppError> {
    state
        .store
        .find_help_seeker_by_user(actor.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Register as a help seeker first".to_string()))
}

/// Post a need on behalf of the actor's organization
pub async fn create_help_request(
    state: &AppState,
    actor: &Actor,
    req: CreateHelpRequest,
) -> Result<HelpRequest, AppError> {
    req.validate()?;

    if req.deadline.is_some_and(|deadline| deadline <= Utc::now()) {
        return Err(AppError::Validation("Deadline must be in the future".to_string()));
    }

    let seeker = own_seeker(state, actor).await?;

    let created = state
        .store
        .insert_help_request(NewHelpRequest {
            help_seeker_id: seeker.id,
            category: req.category.trim().to_string(),
            title: req.title,
            description: req.description,
            quantity_needed: req.quantity_needed,
            urgency: req.urgency,
            deadline: req.deadline,
        })
        .await?;

    tracing::info!(
        "Help request {} ({} urgency) posted by help seeker {}",
        created.id,
        created.urgency.as_str(),
        seeker.id
    );

    Ok(created)
}

/// Active needs of verified organizations, most urgent first
pub async fn list_open(state: &AppState, params: HelpRequestListParams) -> Result<Vec<HelpRequest>, AppError> {
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    Ok(state.store.list_open_help_requests(Utc::now(), category).await?)
}

pub async fn close_help_request(state: &AppState, actor: &Actor, id: i64) -> Result<HelpRequest, AppError> {
    let request = state.store.get_help_request(id).await?;
    let seeker = state.store.get_help_seeker(request.help_seeker_id).await?;

    if seeker.user_id != actor.user_id {
        return Err(AppError::NotAuthorized(format!(
            "Help request {} belongs to another organization",
            id
        )));
    }

    if !state.store.close_help_request(id).await? {
        return Err(AppError::Forbidden(format!("help request {} is already closed", id)));
    }

    tracing::info!("Help request {} closed by {}", id, actor.username);
    Ok(state.store.get_help_request(id).await?)
}

/// The actor's organization with its needs and the offers made to it
pub async fn seeker_dashboard(state: &AppState, actor: &Actor) -> Result<SeekerDashboard, AppError> {
    let help_seeker = own_seeker(state, actor).await?;
    let help_requests = state.store.list_help_requests_by_seeker(help_seeker.id).await?;
    let matches = state.store.list_matches_by_seeker(help_seeker.id).await?;

    Ok(SeekerDashboard {
        help_seeker,
        help_requests,
        matches,
    })
}
