use actix_web::{web, HttpResponse};

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{ActionResponse, BulkProfilesRequest, ProfileKind, ProfileListParams};
use crate::state::AppState;
use crate::workflows::{admin, ProfileAction};

/// Superuser profile management
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Fixed paths first so "bulk-*" and "counts" are never read as a profile kind
    cfg.route("/admin/profiles", web::get().to(list_profiles))
        .route("/admin/profiles/counts", web::get().to(profile_counts))
        .route("/admin/profiles/bulk-verify", web::post().to(bulk_verify))
        .route("/admin/profiles/bulk-reject", web::post().to(bulk_reject))
        .route("/admin/profiles/bulk-delete", web::post().to(bulk_delete))
        .route("/admin/profiles/{kind}/{id}/verify", web::post().to(verify))
        .route("/admin/profiles/{kind}/{id}/reject", web::post().to(reject))
        .route("/admin/profiles/{kind}/{id}/delete", web::post().to(delete));
}

/// GET /api/v1/admin/profiles?kind=&status=&q=
async fn list_profiles(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<ProfileListParams>,
) -> Result<HttpResponse, AppError> {
    let listing = admin::list_profiles(&state, &actor, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(listing))
}

/// GET /api/v1/admin/profiles/counts
async fn profile_counts(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, AppError> {
    let counts = admin::counts(&state, &actor).await?;
    Ok(HttpResponse::Ok().json(counts))
}

fn parse_kind(raw: &str) -> Result<ProfileKind, AppError> {
    match raw {
        "donor" => Ok(ProfileKind::Donor),
        "seeker" | "help_seeker" | "help-seeker" => Ok(ProfileKind::HelpSeeker),
        other => Err(AppError::NotFound(format!("Unknown profile kind '{}'", other))),
    }
}

async fn single(
    state: &AppState,
    actor: &Actor,
    path: (String, i64),
    action: ProfileAction,
) -> Result<HttpResponse, AppError> {
    let (kind, id) = path;
    let kind = parse_kind(&kind)?;

    admin::apply(state, actor, kind, id, action).await?;

    Ok(HttpResponse::Ok().json(ActionResponse {
        success: true,
        message: format!("Profile {} {}", id, action.as_str()),
    }))
}

async fn verify(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, AppError> {
    single(&state, &actor, path.into_inner(), ProfileAction::Verify).await
}

async fn reject(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, AppError> {
    single(&state, &actor, path.into_inner(), ProfileAction::Reject).await
}

async fn delete(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, AppError> {
    single(&state, &actor, path.into_inner(), ProfileAction::Delete).await
}

async fn bulk_verify(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<BulkProfilesRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(admin::apply_bulk(&state, &actor, req.into_inner(), ProfileAction::Verify).await?))
}

async fn bulk_reject(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<BulkProfilesRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(admin::apply_bulk(&state, &actor, req.into_inner(), ProfileAction::Reject).await?))
}

async fn bulk_delete(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<BulkProfilesRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(admin::apply_bulk(&state, &actor, req.into_inner(), ProfileAction::Delete).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("donor").unwrap(), ProfileKind::Donor);
        assert_eq!(parse_kind("seeker").unwrap(), ProfileKind::HelpSeeker);
        assert_eq!(parse_kind("help_seeker").unwrap(), ProfileKind::HelpSeeker);
        assert!(matches!(parse_kind("admin"), Err(AppError::NotFound(_))));
    }
}
