use crate::auth::Actor;
use crate::error::AppError;
use crate::models::Notification;
use crate::state::AppState;

pub async fn list(state: &AppState, actor: &Actor) -> Result<Vec<Notification>, AppError> {
    Ok(state.store.list_notifications(actor.user_id).await?)
}

/// Only the recipient may mark a notification read
pub async fn mark_read(state: &AppState, actor: &Actor, id: i64) -> Result<(), AppError> {
    if state.store.mark_notification_read(id, actor.user_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("notification {} not found", id)))
    }
}
