use actix_web::{web, HttpResponse};

use crate::auth::Actor;
use crate::error::AppError;
use crate::models::ActionResponse;
use crate::state::AppState;
use crate::workflows::notifications;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/notifications", web::get().to(list))
        .route("/notifications/{id}/read", web::post().to(mark_read));
}

async fn list(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(notifications::list(&state, &actor).await?))
}

async fn mark_read(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    notifications::mark_read(&state, &actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ActionResponse {
        success: true,
        message: "Notification marked as read".to_string(),
    }))
}
