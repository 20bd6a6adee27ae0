/*
 * Responsibility
 * - Environment / settings loading (bearer verification keys, Graph options, Azure AD options)
 * - Validation of required values (startup fails on missing credentials)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use url::Url;

pub const DEFAULT_GRAPH_SCOPE: &str = "User.Read";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_AZURE_AUTHORITY: &str = "https://login.microsoftonline.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Directory (Graph) options handed to the client at construction time.
///
/// Defaults when unset:
/// - `scopes`: `User.Read`
/// - `base_url`: `https://graph.microsoft.com/v1.0`
#[derive(Clone, Debug)]
pub struct GraphOptions {
    pub base_url: Url,
    pub scopes: Vec<String>,
}

/// Provider-specific authentication block, bound from `AZURE_*` settings.
#[derive(Clone, Debug)]
pub struct AzureAdOptions {
    pub authority: Url,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub auth_issuer: String,
    pub auth_audience: String,
    pub access_token_leeway_seconds: u64,
    pub access_jwt_public_key_pem: String,

    pub graph: GraphOptions,
    pub azure: AzureAdOptions,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let auth_issuer =
            std::env::var("AUTH_ISSUER").map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?;

        let auth_audience =
            std::env::var("AUTH_AUDIENCE").map_err(|_| ConfigError::Missing("AUTH_AUDIENCE"))?;

        let access_token_leeway_seconds = std::env::var("ACCESS_TOKEN_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let access_jwt_public_key_pem = std::env::var("ACCESS_JWT_PUBLIC_KEY_PEM")
            .map_err(|_| ConfigError::Missing("ACCESS_JWT_PUBLIC_KEY_PEM"))?
            .replace("\\n", "\n");

        let scopes = match parse_scopes(std::env::var("GRAPH_SCOPES").ok().as_deref()) {
            Some(scopes) => scopes,
            None => {
                tracing::warn!(
                    "no permission scopes found in GRAPH_SCOPES; using default {}",
                    DEFAULT_GRAPH_SCOPE
                );
                vec![DEFAULT_GRAPH_SCOPE.to_string()]
            }
        };
        for scope in &scopes {
            tracing::debug!(%scope, "requesting permission scope");
        }

        let base_url = std::env::var("GRAPH_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GRAPH_BASE_URL.to_string());
        let base_url = Url::parse(&base_url).map_err(|_| ConfigError::Invalid("GRAPH_BASE_URL"))?;

        let authority = std::env::var("AZURE_AUTHORITY")
            .unwrap_or_else(|_| DEFAULT_AZURE_AUTHORITY.to_string());
        let authority =
            Url::parse(&authority).map_err(|_| ConfigError::Invalid("AZURE_AUTHORITY"))?;

        let azure = AzureAdOptions {
            authority,
            tenant_id: std::env::var("AZURE_TENANT_ID")
                .map_err(|_| ConfigError::Missing("AZURE_TENANT_ID"))?,
            client_id: std::env::var("AZURE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("AZURE_CLIENT_ID"))?,
            client_secret: std::env::var("AZURE_CLIENT_SECRET")
                .map_err(|_| ConfigError::Missing("AZURE_CLIENT_SECRET"))?,
        };

        Ok(Self {
            addr,
            app_env,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            access_jwt_public_key_pem,
            graph: GraphOptions { base_url, scopes },
            azure,
        })
    }
}

/// Split a `;`-delimited scope list, dropping empty entries.
///
/// Returns `None` when the raw value is absent or contains no usable scope,
/// so the caller can fall back to the documented default.
pub fn parse_scopes(raw: Option<&str>) -> Option<Vec<String>> {
    let scopes: Vec<String> = raw?
        .split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if scopes.is_empty() { None } else { Some(scopes) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delimited_scope_list() {
        let scopes = parse_scopes(Some("User.Read;Mail.Read")).unwrap();
        assert_eq!(scopes, vec!["User.Read".to_string(), "Mail.Read".to_string()]);
    }

    #[test]
    fn trims_whitespace_and_drops_empty_entries() {
        let scopes = parse_scopes(Some(" User.Read ; ;Mail.Read;")).unwrap();
        assert_eq!(scopes, vec!["User.Read".to_string(), "Mail.Read".to_string()]);
    }

    #[test]
    fn absent_or_blank_value_yields_none() {
        assert!(parse_scopes(None).is_none());
        assert!(parse_scopes(Some("")).is_none());
        assert!(parse_scopes(Some(" ; ; ")).is_none());
    }
}
