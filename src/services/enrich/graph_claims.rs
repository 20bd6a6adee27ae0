//! Best-effort claims enrichment from the directory.
//!
//! Runs when the auth pipeline constructs a signed-in identity: one profile
//! read, then one photo read, both folded into the claim set. Enrichment is
//! an optional enhancement; authentication is not. No failure here may ever
//! surface to the caller as a sign-in failure, so every failure path ends in
//! a log line and a pass-through of the identity as built so far.

use std::sync::Arc;

use async_trait::async_trait;

use crate::identity::Identity;
use crate::services::directory::{DirectoryClient, DirectoryError};

/// The profile fields requested for claims. Kept to exactly what the claim
/// mapping consumes.
const PROFILE_SELECT: [&str; 4] = ["displayName", "mail", "mailboxSettings", "userPrincipalName"];

/// Smallest standard photo size.
const PHOTO_SIZE: &str = "48x48";

/// Capability the auth pipeline composes in when building identities.
#[async_trait]
pub trait ClaimsEnricher: Send + Sync {
    /// Augment an identity with directory claims.
    ///
    /// Unauthenticated identities pass through unchanged. Always returns the
    /// identity; never errors.
    async fn enrich(&self, identity: Identity) -> Identity;
}

/// Failures that abort the enrichment attempt and are logged once at the
/// outer boundary.
enum EnrichFailure {
    MissingProfile,
    Photo(DirectoryError),
}

pub struct GraphClaimsEnricher {
    directory: Arc<dyn DirectoryClient>,
}

impl GraphClaimsEnricher {
    pub fn new(directory: Arc<dyn DirectoryClient>) -> Self {
        Self { directory }
    }

    async fn add_directory_claims(&self, identity: &mut Identity) -> Result<(), EnrichFailure> {
        let profile = match self.directory.fetch_me(&PROFILE_SELECT).await {
            Ok(Some(profile)) => profile,
            // The service answered but produced no user record: abort the
            // whole attempt, photo fetch included.
            Ok(None) => return Err(EnrichFailure::MissingProfile),
            Err(DirectoryError::TokenUnavailable(reason)) => {
                tracing::error!(%reason, "directory access token unavailable; skipping enrichment");
                return Ok(());
            }
            Err(DirectoryError::Service {
                code,
                message,
                body,
            }) => {
                tracing::error!(
                    %code,
                    %message,
                    body = body.as_deref().unwrap_or(""),
                    "directory service error; skipping enrichment"
                );
                return Ok(());
            }
            Err(err) => {
                tracing::error!(error = %err, "directory request failed; skipping enrichment");
                return Ok(());
            }
        };

        tracing::info!(
            user = profile.display_name.as_deref().unwrap_or("<unknown>"),
            "retrieved directory profile"
        );
        identity.add_profile_claims(&profile);

        // Photo is best-effort and must not undo the claims committed above.
        match self.directory.fetch_photo(PHOTO_SIZE).await {
            Ok(bytes) => identity.add_photo_claim(&bytes),
            Err(DirectoryError::NotFound) => {
                // Expected for accounts without a photo.
                tracing::debug!("user has no directory photo");
            }
            Err(err) => return Err(EnrichFailure::Photo(err)),
        }

        Ok(())
    }
}

#[async_trait]
impl ClaimsEnricher for GraphClaimsEnricher {
    async fn enrich(&self, mut identity: Identity) -> Identity {
        if !identity.is_authenticated() {
            return identity;
        }

        if let Err(failure) = self.add_directory_claims(&mut identity).await {
            match failure {
                EnrichFailure::MissingProfile => {
                    tracing::error!("directory returned no user record; identity left unenriched");
                }
                EnrichFailure::Photo(err) => {
                    tracing::error!(error = %err, "failed to fetch user photo");
                }
            }
        }

        identity
    }
}
