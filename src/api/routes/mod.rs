pub mod health;
pub mod party;

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tower_http::timeout::TimeoutLayer;

use crate::api::middleware::auth_middleware;
use crate::api::AppState;

/// REST request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Create the main API router
pub fn create_api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/party", create_party_router(state.clone()))
        .route("/health", get(health::health_handler))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

/// Create party router
fn create_party_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/:partyCode",
            get(party::get_party_details).layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state)
}
