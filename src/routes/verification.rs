use actix_web::{web, HttpResponse};

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{ReviewDecisionRequest, SubmitVerificationRequest};
use crate::state::AppState;
use crate::workflows::verification;

/// User-facing and staff verification routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/verification", web::post().to(submit))
        .route("/verification/status", web::get().to(status))
        .route("/admin/verification", web::get().to(queue))
        .route("/admin/verification/{id}/review", web::post().to(begin_review))
        .route("/admin/verification/{id}/decision", web::post().to(decide));
}

async fn submit(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<SubmitVerificationRequest>,
) -> Result<HttpResponse, AppError> {
    let request = verification::submit(&state, &actor, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(request))
}

async fn status(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(verification::status(&state, &actor).await?))
}

async fn queue(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(verification::queue(&state, &actor).await?))
}

async fn begin_review(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(verification::begin_review(&state, &actor, path.into_inner()).await?))
}

/// POST /api/v1/admin/verification/{id}/decision
///
/// Request body:
/// ```json
/// { "decision": "approve|reject|needs_more_info", "notes": "string" }
/// ```
async fn decide(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    req: web::Json<ReviewDecisionRequest>,
) -> Result<HttpResponse, AppError> {
    let updated =
        verification::decide_request(&state, &actor, path.into_inner(), req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}
