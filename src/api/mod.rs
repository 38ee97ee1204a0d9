mod handlers;
pub mod identity;
pub mod middleware;

use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::controller::NoteApiController;
use crate::db::Database;

pub use identity::{CurrentUser, USER_HEADER};
pub use middleware::SecurityConfig;

/// Router backed by the SQLite store for notes, shares and users.
pub fn create_router(db: Database, security: SecurityConfig) -> Router {
    let controller = NoteApiController::new(
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        Arc::new(db),
    );
    create_router_with_controller(controller, security)
}

pub fn create_router_with_controller(
    controller: NoteApiController,
    security: SecurityConfig,
) -> Router {
    let api = Router::new()
        // Notes
        .route(
            "/notes",
            get(handlers::list_notes).post(handlers::create_note),
        )
        .route(
            "/notes/{id}",
            get(handlers::get_note)
                .put(handlers::update_note)
                .delete(handlers::delete_note),
        )
        // Shares
        .route(
            "/notes/{id}/shares/{uid}",
            put(handlers::share_note).delete(handlers::unshare_note),
        )
        // Users
        .route("/me", get(handlers::me))
        .route_layer(axum::middleware::from_fn_with_state(
            security.clone(),
            middleware::auth_middleware,
        ))
        // Health (unauthenticated)
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security.cors_layer()),
        )
        .with_state(controller)
}
