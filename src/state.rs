use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::core::Matcher;
use crate::services::{Geocoder, Notifier, ProfileStore};

/// Shared handles every request works against
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub notifier: Arc<dyn Notifier>,
    pub matcher: Matcher,
    pub tokens: TokenVerifier,
    /// Re-resolve donation coordinates when the pickup address changes
    pub regeocode_on_edit: bool,
}
