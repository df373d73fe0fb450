// Request workflows: authorization, orchestration and side effects over the
// store, geocoder and notifier. Handlers stay thin and call into these.
pub mod admin;
pub mod donations;
pub mod help_requests;
pub mod matching;
pub mod notifications;
pub mod profiles;
pub mod verification;

pub use admin::ProfileAction;
