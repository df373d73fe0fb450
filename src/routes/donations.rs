use actix_web::{web, HttpResponse};

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{
    CandidatesParams, CreateDonationRequest, DonationListParams, ProposeMatchRequest,
    RequestDonationBody, UpdateDonationRequest, UpdateRequestStatusBody,
};
use crate::state::AppState;
use crate::workflows::{donations, matching};

/// Configure donation and donation-request routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/donations", web::post().to(create_donation))
        .route("/donations", web::get().to(list_donations))
        .route("/donations/mine", web::get().to(my_donations))
        .route("/donations/{id}", web::get().to(get_donation))
        .route("/donations/{id}", web::put().to(update_donation))
        .route("/donations/{id}/candidates", web::get().to(find_candidates))
        .route("/donations/{id}/matches", web::post().to(propose_match))
        .route("/donations/{id}/requests", web::post().to(request_donation))
        .route("/donations/{id}/requests", web::get().to(list_requests))
        .route("/donation-requests/{id}/status", web::post().to(update_request_status));
}

/// POST /api/v1/donations
async fn create_donation(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<CreateDonationRequest>,
) -> Result<HttpResponse, AppError> {
    let donation = donations::create_donation(&state, &actor, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(donation))
}

/// GET /api/v1/donations?category=
async fn list_donations(
    state: web::Data<AppState>,
    query: web::Query<DonationListParams>,
) -> Result<HttpResponse, AppError> {
    let list = donations::list_available(&state, query.category.as_deref()).await?;
    Ok(HttpResponse::Ok().json(list))
}

async fn my_donations(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(donations::list_mine(&state, &actor).await?))
}

async fn get_donation(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(donations::get_donation(&state, path.into_inner()).await?))
}

async fn update_donation(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    req: web::Json<UpdateDonationRequest>,
) -> Result<HttpResponse, AppError> {
    let donation =
        donations::update_donation(&state, &actor, path.into_inner(), req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(donation))
}

/// GET /api/v1/donations/{id}/candidates?radiusKm=
///
/// Verified seekers within the radius, best score first.
async fn find_candidates(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    query: web::Query<CandidatesParams>,
) -> Result<HttpResponse, AppError> {
    let donation_id = path.into_inner();
    let response = matching::find_candidates(&state, &actor, donation_id, query.radius_km).await?;

    tracing::info!(
        "Returning {} candidates for donation {} (from {} considered)",
        response.candidates.len(),
        donation_id,
        response.total_considered
    );

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/donations/{id}/matches
///
/// Request body:
/// ```json
/// { "seekerId": 12, "message": "string", "scheduledPickup": "2030-01-01T10:00:00Z" }
/// ```
async fn propose_match(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    req: web::Json<ProposeMatchRequest>,
) -> Result<HttpResponse, AppError> {
    let created = matching::propose_match(&state, &actor, path.into_inner(), req.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

async fn request_donation(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    req: web::Json<RequestDonationBody>,
) -> Result<HttpResponse, AppError> {
    let request =
        donations::request_donation(&state, &actor, path.into_inner(), req.into_inner()).await?;
    Ok(HttpResponse::Created().json(request))
}

async fn list_requests(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(donations::list_requests(&state, &actor, path.into_inner()).await?))
}

async fn update_request_status(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    req: web::Json<UpdateRequestStatusBody>,
) -> Result<HttpResponse, AppError> {
    let updated =
        donations::update_request_status(&state, &actor, path.into_inner(), req.status).await?;
    Ok(HttpResponse::Ok().json(updated))
}
