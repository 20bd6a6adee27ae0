use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::identity::Identity;
use crate::state::AppState;

/// Extractor that hands handlers the identity built by the auth middleware.
/// Missing identity means the route is not behind the middleware: 401.
pub struct IdentityExtractor(pub Identity);

impl FromRequestParts<AppState> for IdentityExtractor
where
    AppState: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(IdentityExtractor)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
