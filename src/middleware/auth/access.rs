//! Bearer verification → identity construction → claims enrichment.
//!
//! This middleware is the sign-in pipeline: it verifies the inbound access
//! token, builds the base `Identity`, and hands it to the claims enricher
//! before storing it in the request extensions. Verification failure is a
//! 401; enrichment failure never is.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::identity::Identity;
use crate::state::AppState;

/// Apply bearer authentication + enrichment to a router subtree.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8's from_fn cannot take a State extractor, so pass state explicitly.
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

    let verified = match state.auth.verify_verified(token) {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(
                error = ?err,
                "access token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    // Base identity from the token, then best-effort directory claims.
    // enrich() never fails; a failed enrichment just yields fewer claims.
    let identity = Identity::authenticated(verified.user_id);
    let identity = state.enricher.enrich(identity).await;

    // middleware → extractor handoff
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
