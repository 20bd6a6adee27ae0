use serde::Serialize;
use uuid::Uuid;

use crate::identity::Identity;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub sub: Option<Uuid>,
    pub authenticated: bool,
    pub claims: Vec<ClaimDto>,
}

#[derive(Debug, Serialize)]
pub struct ClaimDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl From<&Identity> for MeResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            sub: identity.subject(),
            authenticated: identity.is_authenticated(),
            claims: identity
                .claims()
                .iter()
                .map(|c| ClaimDto {
                    kind: c.kind.clone(),
                    value: c.value.clone(),
                })
                .collect(),
        }
    }
}
