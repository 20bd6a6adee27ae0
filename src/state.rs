/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Clone-cheap by construction (Arc inside)
 */
use std::sync::Arc;

use crate::services::auth::AuthService;
use crate::services::enrich::ClaimsEnricher;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub enricher: Arc<dyn ClaimsEnricher>,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, enricher: Arc<dyn ClaimsEnricher>) -> Self {
        Self { auth, enricher }
    }
}
