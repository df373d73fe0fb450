// Route exports
pub mod admin;
pub mod donations;
pub mod health;
pub mod help_requests;
pub mod matches;
pub mod notifications;
pub mod profiles;
pub mod verification;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(profiles::configure)
            .configure(help_requests::configure)
            .configure(donations::configure)
            .configure(matches::configure)
            .configure(verification::configure)
            .configure(admin::configure)
            .configure(notifications::configure),
    );
}
