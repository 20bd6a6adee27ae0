//! Directory client interface used by the claims enricher.
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Result type for directory reads.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Directory-layer failures, kept as a typed outcome rather than opaque
/// transport errors so the enricher can branch on them explicitly.
///
/// `Clone`/`PartialEq` let tests script a fake client and assert on exact
/// outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// No valid access token could be obtained for the downstream call.
    #[error("access token unavailable: {0}")]
    TokenUnavailable(String),

    /// The service answered with an error payload (authorization, throttling,
    /// malformed request, ...). The raw body is retained for logging.
    #[error("directory service error {code}: {message}")]
    Service {
        code: String,
        message: String,
        body: Option<String>,
    },

    /// The requested resource does not exist. Expected for photo lookups.
    #[error("resource not found")]
    NotFound,

    /// The request never produced a response (DNS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(String),
}

/// The profile fields requested from the directory.
///
/// Everything is optional: the service omits fields the caller did not select
/// or the account does not carry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub mailbox_settings: Option<MailboxSettings>,
    pub user_principal_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxSettings {
    pub time_zone: Option<String>,
    pub date_format: Option<String>,
    pub time_format: Option<String>,
}

/// Read-only directory operations needed for claims enrichment.
///
/// Implementations must be cheap to share (`Arc<dyn DirectoryClient>`).
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch the signed-in user's profile, limited to `select` fields.
    ///
    /// Returns:
    /// - `Ok(Some(profile))` on success
    /// - `Ok(None)` when the service answered but produced no user record
    async fn fetch_me(&self, select: &[&str]) -> DirectoryResult<Option<UserProfile>>;

    /// Fetch the signed-in user's photo at a fixed size (e.g. `48x48`).
    ///
    /// `Err(DirectoryError::NotFound)` is the expected outcome for accounts
    /// without a photo.
    async fn fetch_photo(&self, size: &str) -> DirectoryResult<Vec<u8>>;
}
