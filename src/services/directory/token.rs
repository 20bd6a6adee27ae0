//! Access-token acquisition for outbound directory calls.
//!
//! The enrichment path never talks to the token endpoint directly; it goes
//! through `TokenProvider` so the flow (client credentials here, anything else
//! later) stays swappable and tests can fail token acquisition on demand.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::AzureAdOptions;

/// Refresh this many seconds before the provider-reported expiry.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token endpoint rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("token request failed: {0}")]
    Transport(String),

    #[error("token response malformed: {0}")]
    InvalidResponse(String),
}

/// Supplies bearer tokens for the directory client.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self, scopes: &[String]) -> Result<String, TokenError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECONDS) > now
    }
}

/// OAuth2 client-credentials provider against the Azure AD v2 token endpoint.
///
/// Tokens are cached until shortly before expiry; a single Mutex is enough
/// since acquisition is rare and cheap relative to the directory calls.
pub struct ClientCredentialsProvider {
    http: reqwest::Client,
    options: AzureAdOptions,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsProvider {
    pub fn new(options: AzureAdOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            options,
            cached: Mutex::new(None),
        }
    }

    fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.options.authority.as_str().trim_end_matches('/'),
            self.options.tenant_id
        )
    }

    async fn request_token(&self, scopes: &[String]) -> Result<TokenResponse, TokenError> {
        let scope = scopes.join(" ");
        let params = [
            ("client_id", self.options.client_id.as_str()),
            ("client_secret", self.options.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http
            .post(self.token_endpoint())
            .form(&params)
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| TokenError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn access_token(&self, scopes: &[String]) -> Result<String, TokenError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let issued = self.request_token(scopes).await?;
        tracing::debug!(expires_in = issued.expires_in, "acquired directory access token");

        let token = CachedToken {
            value: issued.access_token,
            expires_at: Utc::now() + Duration::seconds(issued.expires_in),
        };
        let value = token.value.clone();
        *cached = Some(token);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_token_expires_with_margin() {
        let now = Utc::now();
        let token = CachedToken {
            value: "t".into(),
            expires_at: now + Duration::seconds(EXPIRY_MARGIN_SECONDS + 30),
        };
        assert!(token.is_fresh(now));

        let stale = CachedToken {
            value: "t".into(),
            expires_at: now + Duration::seconds(EXPIRY_MARGIN_SECONDS - 30),
        };
        assert!(!stale.is_fresh(now));
    }

    #[test]
    fn token_endpoint_joins_authority_and_tenant() {
        let provider = ClientCredentialsProvider::new(AzureAdOptions {
            authority: url::Url::parse("https://login.microsoftonline.com").unwrap(),
            tenant_id: "common".into(),
            client_id: "app".into(),
            client_secret: "secret".into(),
        });

        assert_eq!(
            provider.token_endpoint(),
            "https://login.microsoftonline.com/common/oauth2/v2.0/token"
        );
    }
}
