use actix_web::{web, HttpResponse};

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::MatchResponseRequest;
use crate::state::AppState;
use crate::workflows::matching;

/// Configure match lifecycle routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/matches/{id}", web::get().to(get_match))
        .route("/matches/{id}/accept", web::post().to(accept_match))
        .route("/matches/{id}/reject", web::post().to(reject_match))
        .route("/matches/{id}/deliver", web::post().to(mark_delivered));
}

async fn get_match(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(matching::get_match(&state, &actor, path.into_inner()).await?))
}

/// POST /api/v1/matches/{id}/accept
///
/// Request body (optional):
/// ```json
/// { "message": "We can collect on Saturday" }
/// ```
async fn accept_match(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    req: Option<web::Json<MatchResponseRequest>>,
) -> Result<HttpResponse, AppError> {
    let body = req.map(web::Json::into_inner).unwrap_or_default();
    let updated = matching::accept_match(&state, &actor, path.into_inner(), body).await?;
    Ok(HttpResponse::Ok().json(updated))
}

async fn reject_match(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    req: Option<web::Json<MatchResponseRequest>>,
) -> Result<HttpResponse, AppError> {
    let body = req.map(web::Json::into_inner).unwrap_or_default();
    let updated = matching::reject_match(&state, &actor, path.into_inner(), body).await?;
    Ok(HttpResponse::Ok().json(updated))
}

async fn mark_delivered(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let updated = matching::mark_delivered(&state, &actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}
