use crate::config::Config;
use crate::dmed::session::SessionStore;
use crate::render::header_image::HeaderImageHandle;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// The last processed DMED file. Replaced on every upload.
    pub sessions: SessionStore,
    /// Readiness of the header image fetched at startup.
    pub header_image: HeaderImageHandle,
}
