//! Claim-bag identity built by the auth pipeline.
//!
//! The middleware constructs an `Identity` from a verified access token and
//! hands it to the claims enricher; handlers only ever see the finished
//! identity through the request extensions.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use uuid::Uuid;

use crate::services::directory::UserProfile;

/// Claim types populated from the directory profile.
pub mod claim_types {
    pub const DISPLAY_NAME: &str = "graph_name";
    pub const EMAIL: &str = "graph_email";
    pub const TIME_ZONE: &str = "graph_timezone";
    pub const DATE_FORMAT: &str = "graph_dateformat";
    pub const TIME_FORMAT: &str = "graph_timeformat";
    pub const PRINCIPAL_NAME: &str = "graph_upn";
    pub const PHOTO: &str = "graph_photo";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub kind: String,
    pub value: String,
}

/// An identity plus its claim set.
///
/// `PartialEq` is deliberate: "enrichment left the identity unchanged" is a
/// contract callers (and tests) rely on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    authenticated: bool,
    subject: Option<Uuid>,
    claims: Vec<Claim>,
}

impl Identity {
    /// An unauthenticated identity. Enrichment passes these through untouched.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(subject: Uuid) -> Self {
        Self {
            authenticated: true,
            subject: Some(subject),
            claims: Vec::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn subject(&self) -> Option<Uuid> {
        self.subject
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn add_claim(&mut self, kind: impl Into<String>, value: impl Into<String>) {
        self.claims.push(Claim {
            kind: kind.into(),
            value: value.into(),
        });
    }

    pub fn find_claim(&self, kind: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.value.as_str())
    }

    pub fn has_claim(&self, kind: &str) -> bool {
        self.find_claim(kind).is_some()
    }

    /// Map each present profile field onto a distinct claim.
    ///
    /// The email claim prefers `mail` and falls back to the principal name,
    /// since directory accounts without a mailbox leave `mail` unset.
    pub fn add_profile_claims(&mut self, profile: &UserProfile) {
        if let Some(name) = &profile.display_name {
            self.add_claim(claim_types::DISPLAY_NAME, name);
        }

        if let Some(email) = profile.mail.as_ref().or(profile.user_principal_name.as_ref()) {
            self.add_claim(claim_types::EMAIL, email);
        }

        if let Some(mailbox) = &profile.mailbox_settings {
            if let Some(tz) = &mailbox.time_zone {
                self.add_claim(claim_types::TIME_ZONE, tz);
            }
            if let Some(df) = &mailbox.date_format {
                self.add_claim(claim_types::DATE_FORMAT, df);
            }
            if let Some(tf) = &mailbox.time_format {
                self.add_claim(claim_types::TIME_FORMAT, tf);
            }
        }

        if let Some(upn) = &profile.user_principal_name {
            self.add_claim(claim_types::PRINCIPAL_NAME, upn);
        }
    }

    /// Store the photo bytes as a base64 data-URI claim, ready for an
    /// `<img src=...>` consumer.
    pub fn add_photo_claim(&mut self, bytes: &[u8]) {
        let value = format!("data:image/jpeg;base64,{}", BASE64.encode(bytes));
        self.add_claim(claim_types::PHOTO, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::directory::MailboxSettings;

    fn full_profile() -> UserProfile {
        UserProfile {
            display_name: Some("Jane Doe".into()),
            mail: Some("jane@example.com".into()),
            mailbox_settings: Some(MailboxSettings {
                time_zone: Some("Pacific Standard Time".into()),
                date_format: Some("M/d/yyyy".into()),
                time_format: Some("h:mm tt".into()),
            }),
            user_principal_name: Some("jane@contoso.onmicrosoft.com".into()),
        }
    }

    #[test]
    fn profile_fields_become_distinct_claims() {
        let mut identity = Identity::authenticated(Uuid::new_v4());
        identity.add_profile_claims(&full_profile());

        assert_eq!(identity.find_claim(claim_types::DISPLAY_NAME), Some("Jane Doe"));
        assert_eq!(identity.find_claim(claim_types::EMAIL), Some("jane@example.com"));
        assert_eq!(
            identity.find_claim(claim_types::TIME_ZONE),
            Some("Pacific Standard Time")
        );
        assert_eq!(identity.find_claim(claim_types::DATE_FORMAT), Some("M/d/yyyy"));
        assert_eq!(identity.find_claim(claim_types::TIME_FORMAT), Some("h:mm tt"));
        assert_eq!(
            identity.find_claim(claim_types::PRINCIPAL_NAME),
            Some("jane@contoso.onmicrosoft.com")
        );
    }

    #[test]
    fn email_claim_falls_back_to_principal_name() {
        let profile = UserProfile {
            mail: None,
            ..full_profile()
        };

        let mut identity = Identity::authenticated(Uuid::new_v4());
        identity.add_profile_claims(&profile);

        assert_eq!(
            identity.find_claim(claim_types::EMAIL),
            Some("jane@contoso.onmicrosoft.com")
        );
    }

    #[test]
    fn absent_fields_add_no_claims() {
        let mut identity = Identity::authenticated(Uuid::new_v4());
        identity.add_profile_claims(&UserProfile::default());

        assert!(identity.claims().is_empty());
    }

    #[test]
    fn photo_claim_is_a_data_uri() {
        let mut identity = Identity::authenticated(Uuid::new_v4());
        identity.add_photo_claim(&[0xff, 0xd8, 0xff]);

        let value = identity.find_claim(claim_types::PHOTO).unwrap();
        assert!(value.starts_with("data:image/jpeg;base64,"));
        assert!(value.len() > "data:image/jpeg;base64,".len());
    }

    #[test]
    fn anonymous_identity_is_unauthenticated_and_empty() {
        let identity = Identity::anonymous();
        assert!(!identity.is_authenticated());
        assert!(identity.subject().is_none());
        assert!(identity.claims().is_empty());
    }
}
