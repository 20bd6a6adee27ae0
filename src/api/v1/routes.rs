/*
 * Responsibility
 * - v1 URL structure
 * - /health stays open; /me sits behind the bearer+enrichment middleware
 */
use axum::{Router, routing::get};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{health::health, me::me};

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = middleware::auth::access::apply(Router::new().route("/me", get(me)), state);

    Router::new().route("/health", get(health)).merge(protected)
}
