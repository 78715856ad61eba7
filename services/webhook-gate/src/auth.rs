// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Header-based webhook authentication.
//!
//! Two modes are reachable from configuration:
//! - `None`: every request passes, no credential lookup happens
//! - `HeaderAuth`: the stored credential names a header whose value must
//!   equal the stored API key
//!
//! Failures are checked in a fixed order (credential load, credential shape,
//! header presence, header value) and each one is reported distinctly.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};

/// Credential type identifier the gate resolves header-auth secrets under.
pub const CREDENTIAL_TYPE: &str = "wahaTriggerApiKey";

/// Authentication mode selected for the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthConfig {
    #[default]
    None,
    HeaderAuth,
}

impl AuthConfig {
    /// Parse the mode selector (`none` or `headerAuth`, case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(Self::None),
            "headerauth" | "header_auth" | "header" => Some(Self::HeaderAuth),
            _ => None,
        }
    }
}

/// Credential as returned by the store, before shape validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    #[serde(default)]
    pub header_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl StoredCredential {
    pub fn new(header_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            header_name: Some(header_name.into()),
            api_key: Some(api_key.into()),
        }
    }

    /// Check that both fields are present and usable.
    pub fn validate(self) -> Result<HeaderCredential, AuthFailure> {
        let header_name = self
            .header_name
            .filter(|name| !name.is_empty())
            .ok_or(AuthFailure::CredentialsInvalid)?;
        let api_key = self
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or(AuthFailure::CredentialsInvalid)?;

        let header_name = HeaderName::from_bytes(header_name.to_ascii_lowercase().as_bytes())
            .map_err(|_| {
                warn!("Stored authentication header name is not a valid HTTP header name");
                AuthFailure::CredentialsInvalid
            })?;

        Ok(HeaderCredential {
            header_name,
            api_key,
        })
    }
}

/// A validated header credential.
#[derive(Clone)]
pub struct HeaderCredential {
    header_name: HeaderName,
    api_key: String,
}

impl HeaderCredential {
    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    /// Constant-time, case-sensitive comparison against the expected key.
    fn matches(&self, provided: &[u8]) -> bool {
        let expected = self.api_key.as_bytes();
        expected.len() == provided.len() && bool::from(expected.ct_eq(provided))
    }
}

impl std::fmt::Debug for HeaderCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderCredential")
            .field("header_name", &self.header_name)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Authentication failure surfaced to the caller as status plus message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Failed to load webhook authentication credentials.")]
    CredentialsUnavailable,

    #[error("Webhook authentication data is missing or invalid.")]
    CredentialsInvalid,

    #[error("Missing authentication header.")]
    MissingHeader,

    #[error("Invalid authentication header value.")]
    InvalidHeaderValue,

    /// Generic challenge, also used for requests refused as bots.
    #[error("Authorization data is wrong!")]
    Challenge,
}

impl AuthFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::CredentialsUnavailable | Self::CredentialsInvalid => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::MissingHeader | Self::InvalidHeaderValue | Self::Challenge => {
                StatusCode::FORBIDDEN
            }
        }
    }
}

/// Errors from a credential store.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("No credential of type {0} is configured")]
    NotFound(String),

    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Host collaborator resolving stored credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self, credential_type: &str) -> Result<StoredCredential, CredentialError>;
}

/// Credential store holding a single credential in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    credential: Option<StoredCredential>,
}

impl StaticCredentialStore {
    pub fn new(credential: StoredCredential) -> Self {
        Self {
            credential: Some(credential),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn load(&self, credential_type: &str) -> Result<StoredCredential, CredentialError> {
        if credential_type != CREDENTIAL_TYPE {
            return Err(CredentialError::NotFound(credential_type.to_string()));
        }
        self.credential
            .clone()
            .ok_or_else(|| CredentialError::NotFound(credential_type.to_string()))
    }
}

/// Credential store reading the process environment at lookup time.
///
/// - `WEBHOOK_AUTH_HEADER_NAME`: header to check (default: Authorization)
/// - `WEBHOOK_AUTH_API_KEY`: expected header value
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialStore;

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn load(&self, credential_type: &str) -> Result<StoredCredential, CredentialError> {
        if credential_type != CREDENTIAL_TYPE {
            return Err(CredentialError::NotFound(credential_type.to_string()));
        }
        Ok(StoredCredential {
            header_name: Some(
                std::env::var("WEBHOOK_AUTH_HEADER_NAME")
                    .unwrap_or_else(|_| "Authorization".to_string()),
            ),
            api_key: std::env::var("WEBHOOK_AUTH_API_KEY").ok(),
        })
    }
}

/// Authenticate a request's headers against the configured mode.
pub async fn authenticate(
    config: AuthConfig,
    headers: &HeaderMap,
    store: &dyn CredentialStore,
) -> Result<(), AuthFailure> {
    match config {
        AuthConfig::None => Ok(()),
        AuthConfig::HeaderAuth => {
            let stored = store.load(CREDENTIAL_TYPE).await.map_err(|e| {
                warn!(error = %e, "Failed to load webhook credentials");
                AuthFailure::CredentialsUnavailable
            })?;

            let credential = stored.validate()?;

            let mut values = headers.get_all(credential.header_name()).iter();
            let provided = values.next().ok_or_else(|| {
                debug!(header = %credential.header_name(), "Authentication header missing");
                AuthFailure::MissingHeader
            })?;

            // A repeated header never equals a single key.
            if values.next().is_some() {
                debug!(header = %credential.header_name(), "Authentication header repeated");
                return Err(AuthFailure::InvalidHeaderValue);
            }

            if !credential.matches(provided.as_bytes()) {
                debug!(header = %credential.header_name(), "Authentication header value mismatch");
                return Err(AuthFailure::InvalidHeaderValue);
            }

            debug!(header = %credential.header_name(), "Header authentication passed");
            Ok(())
        }
    }
}
