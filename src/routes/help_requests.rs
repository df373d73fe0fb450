use actix_web::{web, HttpResponse};

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{CreateHelpRequest, HelpRequestListParams};
use crate::state::AppState;
use crate::workflows::help_requests;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/help-requests", web::post().to(create_help_request))
        .route("/help-requests", web::get().to(list_open))
        .route("/help-requests/{id}/close", web::post().to(close_help_request))
        .route("/help-seekers/me/dashboard", web::get().to(dashboard));
}

async fn create_help_request(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<CreateHelpRequest>,
) -> Result<HttpResponse, AppError> {
    let created = help_requests::create_help_request(&state, &actor, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// GET /api/v1/help-requests?category=
async fn list_open(
    state: web::Data<AppState>,
    query: web::Query<HelpRequestListParams>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(help_requests::list_open(&state, query.into_inner()).await?))
}

async fn close_help_request(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let closed = help_requests::close_help_request(&state, &actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(closed))
}

async fn dashboard(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(help_requests::seeker_dashboard(&state, &actor).await?))
}
