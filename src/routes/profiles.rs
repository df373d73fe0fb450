use actix_web::{web, HttpResponse};

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{DirectoryParams, DonorProfileRequest, RegisterHelpSeekerRequest};
use crate::state::AppState;
use crate::workflows::profiles;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/seeker-types", web::get().to(seeker_types))
        .route("/help-seekers", web::post().to(register_help_seeker))
        .route("/help-seekers", web::get().to(directory))
        .route("/donor-profile", web::get().to(get_donor_profile))
        .route("/donor-profile", web::put().to(save_donor_profile));
}

async fn seeker_types(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(profiles::list_seeker_types(&state).await?))
}

async fn register_help_seeker(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<RegisterHelpSeekerRequest>,
) -> Result<HttpResponse, AppError> {
    let seeker = profiles::register_help_seeker(&state, &actor, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(seeker))
}

/// GET /api/v1/help-seekers?seekerType=&city=
async fn directory(
    state: web::Data<AppState>,
    query: web::Query<DirectoryParams>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(profiles::directory(&state, query.into_inner()).await?))
}

async fn get_donor_profile(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(profiles::get_donor_profile(&state, &actor).await?))
}

async fn save_donor_profile(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<DonorProfileRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(profiles::save_donor_profile(&state, &actor, req.into_inner()).await?))
}
