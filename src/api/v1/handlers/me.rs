/*
 * Responsibility
 * - GET /me: surface the signed-in identity's claim set
 * - The middleware already ran enrichment; this handler only projects the DTO
 */
use axum::Json;

use crate::api::v1::dto::me::MeResponse;
use crate::api::v1::extractors::IdentityExtractor;

pub async fn me(IdentityExtractor(identity): IdentityExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(&identity))
}
