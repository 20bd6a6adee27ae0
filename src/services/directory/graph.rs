//! Microsoft Graph implementation of `DirectoryClient`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::GraphOptions;
use crate::services::directory::client::{
    DirectoryClient, DirectoryError, DirectoryResult, UserProfile,
};
use crate::services::directory::token::TokenProvider;

/// Error code Graph uses for "this user has no photo".
const IMAGE_NOT_FOUND: &str = "ImageNotFound";

/// OData error envelope: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Deserialize)]
struct ODataErrorEnvelope {
    error: ODataErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ODataErrorBody {
    code: Option<String>,
    message: Option<String>,
}

pub struct GraphClient {
    http: reqwest::Client,
    options: GraphOptions,
    tokens: Arc<dyn TokenProvider>,
}

impl GraphClient {
    pub fn new(options: GraphOptions, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            options,
            tokens,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.options.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    async fn bearer(&self) -> DirectoryResult<String> {
        self.tokens
            .access_token(&self.options.scopes)
            .await
            .map_err(|e| DirectoryError::TokenUnavailable(e.to_string()))
    }
}

#[async_trait]
impl DirectoryClient for GraphClient {
    async fn fetch_me(&self, select: &[&str]) -> DirectoryResult<Option<UserProfile>> {
        let token = self.bearer().await?;

        let response = self
            .http
            .get(self.endpoint("me"))
            .query(&[("$select", select.join(","))])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(service_error(status, &body));
        }

        parse_profile(&body)
    }

    async fn fetch_photo(&self, size: &str) -> DirectoryResult<Vec<u8>> {
        let token = self.bearer().await?;

        let response = self
            .http
            .get(self.endpoint(&format!("me/photos/{size}/$value")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(photo_error(status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

fn parse_odata_error(body: &str) -> Option<ODataErrorBody> {
    serde_json::from_str::<ODataErrorEnvelope>(body)
        .ok()
        .map(|e| e.error)
}

/// Map a non-2xx response to a `Service` error, preserving the raw body.
fn service_error(status: StatusCode, body: &str) -> DirectoryError {
    let parsed = parse_odata_error(body).unwrap_or_default();
    DirectoryError::Service {
        code: parsed.code.unwrap_or_else(|| status.as_u16().to_string()),
        message: parsed
            .message
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
        body: (!body.is_empty()).then(|| body.to_string()),
    }
}

/// Photo lookups treat "no photo exists" as `NotFound`: either a bare 404 or
/// an OData error whose code is `ImageNotFound`.
fn photo_error(status: StatusCode, body: &str) -> DirectoryError {
    if status == StatusCode::NOT_FOUND {
        return DirectoryError::NotFound;
    }
    if let Some(parsed) = parse_odata_error(body) {
        if parsed.code.as_deref() == Some(IMAGE_NOT_FOUND) {
            return DirectoryError::NotFound;
        }
    }
    service_error(status, body)
}

/// A 2xx body that is empty or literal `null` means "no user record".
fn parse_profile(body: &str) -> DirectoryResult<Option<UserProfile>> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }

    serde_json::from_str::<UserProfile>(trimmed)
        .map(Some)
        .map_err(|e| DirectoryError::Service {
            code: "InvalidResponse".into(),
            message: e.to_string(),
            body: Some(body.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ODATA_THROTTLED: &str =
        r#"{"error":{"code":"TooManyRequests","message":"Throttled for 30s"}}"#;
    const ODATA_NO_IMAGE: &str =
        r#"{"error":{"code":"ImageNotFound","message":"No photo for this user."}}"#;

    #[test]
    fn service_error_keeps_code_message_and_body() {
        let err = service_error(StatusCode::TOO_MANY_REQUESTS, ODATA_THROTTLED);
        assert_eq!(
            err,
            DirectoryError::Service {
                code: "TooManyRequests".into(),
                message: "Throttled for 30s".into(),
                body: Some(ODATA_THROTTLED.into()),
            }
        );
    }

    #[test]
    fn service_error_falls_back_to_http_status() {
        let err = service_error(StatusCode::BAD_GATEWAY, "upstream died");
        match err {
            DirectoryError::Service { code, body, .. } => {
                assert_eq!(code, "502");
                assert_eq!(body.as_deref(), Some("upstream died"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn photo_404_maps_to_not_found() {
        assert_eq!(
            photo_error(StatusCode::NOT_FOUND, ""),
            DirectoryError::NotFound
        );
    }

    #[test]
    fn photo_image_not_found_code_maps_to_not_found() {
        assert_eq!(
            photo_error(StatusCode::BAD_REQUEST, ODATA_NO_IMAGE),
            DirectoryError::NotFound
        );
    }

    #[test]
    fn other_photo_errors_stay_service_errors() {
        let err = photo_error(StatusCode::FORBIDDEN, ODATA_THROTTLED);
        assert!(matches!(err, DirectoryError::Service { .. }));
    }

    #[test]
    fn empty_or_null_profile_body_is_no_user_record() {
        assert_eq!(parse_profile("").unwrap(), None);
        assert_eq!(parse_profile("  ").unwrap(), None);
        assert_eq!(parse_profile("null").unwrap(), None);
    }

    #[test]
    fn profile_body_deserializes_selected_fields() {
        let body = r#"{
            "displayName": "Jane Doe",
            "mail": "jane@example.com",
            "mailboxSettings": {"timeZone": "UTC"},
            "userPrincipalName": "jane@contoso.onmicrosoft.com"
        }"#;

        let profile = parse_profile(body).unwrap().unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.mail.as_deref(), Some("jane@example.com"));
        assert_eq!(
            profile.mailbox_settings.unwrap().time_zone.as_deref(),
            Some("UTC")
        );
        assert_eq!(
            profile.user_principal_name.as_deref(),
            Some("jane@contoso.onmicrosoft.com")
        );
    }

    #[test]
    fn malformed_profile_body_is_a_service_error() {
        let err = parse_profile("{not json").unwrap_err();
        assert!(matches!(err, DirectoryError::Service { ref code, .. } if code == "InvalidResponse"));
    }
}
