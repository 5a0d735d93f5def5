//! Light client suitability probes for beacon, execution and prover nodes.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

pub mod checks;
pub mod config;
pub mod detect;
pub mod history;
pub mod routes;
pub mod rpc;
pub mod state;
pub mod transport;

use state::AppState;

/// Router serving the JSON API under `/api`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", routes::api_router(state))
        .layer(CorsLayer::very_permissive())
}
