pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::dmed::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // DMED processing
        .route(
            "/api/v1/dmed",
            post(handlers::handle_upload).layer(upload_limit),
        )
        .route("/api/v1/dmed/session", get(handlers::handle_get_session))
        // Holder lookup and declarations
        .route("/api/v1/holders/search", get(handlers::handle_search))
        .route("/api/v1/holders/:cpf", get(handlers::handle_get_holder))
        .route(
            "/api/v1/holders/:cpf/declaration",
            get(handlers::handle_declaration),
        )
        .with_state(state)
}
