//! Upstream credential acquisition, memoized for the process lifetime.
//!
//! The secret record is a local JSON file holding the application key pair and,
//! optionally, a pre-issued bearer token. Without one, the key pair is exchanged
//! once for an app-only bearer token via the OAuth2 client-credentials grant.
use crate::twitter::error::SearchError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tlplayer_http::{Auth, HttpClient, RequestOpts};
use tokio::sync::OnceCell;

pub const TOKEN_PATH: &str = "oauth2/token";

#[derive(Clone, Deserialize)]
pub struct SecretRecord {
    pub api_key: String,
    pub api_key_secret: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_token_secret: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("api_key", &"<redacted>")
            .field("has_access_token", &self.access_token.is_some())
            .field("has_bearer_token", &self.bearer_token.is_some())
            .finish()
    }
}

/// Bearer credential presented to the search endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    bearer: String,
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: token.into(),
        }
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

enum CredentialSource {
    SecretFile { path: PathBuf, http: HttpClient },
    Fixed,
}

/// Lazily obtains the credential on first demand and caches it.
///
/// Concurrent first callers share a single fetch. A failed fetch is not cached:
/// it propagates to every caller waiting on it and a later call starts over.
pub struct CredentialProvider {
    source: CredentialSource,
    cell: OnceCell<Credential>,
}

impl CredentialProvider {
    /// Read `path` on first use; `http` must be anchored at the API host that
    /// serves the token endpoint.
    pub fn from_secret_file(path: impl Into<PathBuf>, http: HttpClient) -> Self {
        Self {
            source: CredentialSource::SecretFile {
                path: path.into(),
                http,
            },
            cell: OnceCell::new(),
        }
    }

    /// Use an already issued credential.
    pub fn fixed(credential: Credential) -> Self {
        Self {
            source: CredentialSource::Fixed,
            cell: OnceCell::new_with(Some(credential)),
        }
    }

    pub async fn get(&self) -> Result<&Credential, SearchError> {
        self.cell.get_or_try_init(|| self.fetch()).await
    }

    async fn fetch(&self) -> Result<Credential, SearchError> {
        match &self.source {
            CredentialSource::SecretFile { path, http } => {
                let record = read_secret_record(path).await?;
                match record.bearer_token.as_deref().map(str::trim) {
                    Some(token) if !token.is_empty() => {
                        tracing::info!(path=%path.display(), "credential.loaded.bearer");
                        Ok(Credential::bearer(token))
                    }
                    _ => exchange_client_credentials(http, &record).await,
                }
            }
            // `fixed` always seeds the cell, so this is only reachable if that changes.
            CredentialSource::Fixed => Err(SearchError::Configuration(
                "no credential source configured".into(),
            )),
        }
    }
}

async fn read_secret_record(path: &Path) -> Result<SecretRecord, SearchError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        SearchError::Configuration(format!(
            "cannot read secret record {}: {e}",
            path.display()
        ))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        SearchError::Configuration(format!(
            "malformed secret record {}: {e}",
            path.display()
        ))
    })
}

async fn exchange_client_credentials(
    http: &HttpClient,
    record: &SecretRecord,
) -> Result<Credential, SearchError> {
    tracing::info!(host=%http.base(), "credential.exchange.start");
    let resp: TokenResponse = http
        .post_form(
            TOKEN_PATH,
            &[("grant_type", "client_credentials")],
            RequestOpts {
                auth: Some(Auth::Basic {
                    user: &record.api_key,
                    password: &record.api_key_secret,
                }),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "credential.exchange.failed");
            SearchError::Configuration(format!("token exchange failed: {e}"))
        })?;

    if !resp.token_type.eq_ignore_ascii_case("bearer") {
        return Err(SearchError::Configuration(format!(
            "token exchange returned unsupported token_type `{}`",
            resp.token_type
        )));
    }
    tracing::info!("credential.exchange.ok");
    Ok(Credential::bearer(resp.access_token))
}
