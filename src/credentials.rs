//! Service-account credentials and bearer-token acquisition.
//!
//! The service-account key is parsed and signed entirely in memory: the
//! inline key material is never staged on disk.

use crate::error::AuthError;
use crate::options::Settings;
use crate::retry::RetryPolicy;
use crate::utils::truncate_message;
use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Where the service-account key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    File(PathBuf),
    /// JSON key material, raw or base64 encoded.
    Inline(String),
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Secret::File(path) => f.debug_tuple("File").field(path).finish(),
            Secret::Inline(_) => f.write_str("Inline(<redacted>)"),
        }
    }
}

impl Secret {
    pub fn load(&self) -> Result<ServiceAccountKey, AuthError> {
        match self {
            Secret::File(path) => ServiceAccountKey::from_file(path),
            Secret::Inline(material) => {
                let material = material.trim();
                if material.starts_with('{') {
                    ServiceAccountKey::from_json(material)
                } else {
                    let decoded = base64::engine::general_purpose::STANDARD
                        .decode(material)
                        .map_err(|e| {
                            AuthError::InvalidSecret(format!(
                                "inline key is neither JSON nor base64: {e}"
                            ))
                        })?;
                    let json = String::from_utf8(decoded).map_err(|_| {
                        AuthError::InvalidSecret("decoded inline key is not UTF-8".to_string())
                    })?;
                    ServiceAccountKey::from_json(&json)
                }
            }
        }
    }
}

/// The fields of a service-account JSON key needed to mint tokens.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| AuthError::InvalidSecret(e.to_string()))?;
        if key.client_email.trim().is_empty() {
            return Err(AuthError::InvalidSecret("client_email is empty".to_string()));
        }
        if key.private_key.trim().is_empty() {
            return Err(AuthError::InvalidSecret("private_key is empty".to_string()));
        }
        Ok(key)
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let json = std::fs::read_to_string(path).map_err(|source| AuthError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// A bearer token and the moment it stops being accepted.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        !self.token.is_empty()
            && Utc::now() + TimeDelta::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

/// Exchanges a service-account key for bearer tokens and caches the result.
pub struct CredentialProvider {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    scope: String,
    client: reqwest::Client,
    retry: RetryPolicy,
    cached: RwLock<Option<Credential>>,
}

impl fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl CredentialProvider {
    /// Fails right away when the private key is not a usable RSA PEM key.
    pub fn new(
        key: ServiceAccountKey,
        settings: &Settings,
        client: reqwest::Client,
    ) -> Result<Self, AuthError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            key,
            signing_key,
            scope: settings.scope(),
            client,
            retry: settings.auth_retry,
            cached: RwLock::new(None),
        })
    }

    pub fn from_secret(
        secret: &Secret,
        settings: &Settings,
        client: reqwest::Client,
    ) -> Result<Self, AuthError> {
        Self::new(secret.load()?, settings, client)
    }

    /// Seeds the cache, e.g. with a token obtained earlier.
    pub fn with_cached(mut self, credential: Credential) -> Self {
        self.cached = RwLock::new(Some(credential));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the cached credential while it is valid, otherwise refreshes it.
    pub async fn acquire(&self) -> Result<Credential, AuthError> {
        if let Some(credential) = self.cached.read().await.as_ref().filter(|c| c.is_valid()) {
            tracing::debug!(expires_at = %credential.expires_at(), "Reusing cached access token");
            return Ok(credential.clone());
        }

        let mut cached = self.cached.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(credential) = cached.as_ref().filter(|c| c.is_valid()) {
            return Ok(credential.clone());
        }

        let credential = self
            .retry
            .run("Authentication", || self.request_token())
            .await?;
        tracing::info!(
            client_email = %self.key.client_email,
            expires_at = %credential.expires_at(),
            "Obtained access token"
        );
        *cached = Some(credential.clone());
        Ok(credential)
    }

    fn sign_assertion(&self) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        Ok(jsonwebtoken::encode(&header, &claims, &self.signing_key)?)
    }

    async fn request_token(&self) -> Result<Credential, AuthError> {
        let assertion = self.sign_assertion()?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status,
                body: truncate_message(&body, 200),
            });
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = TimeDelta::try_seconds(token.expires_in)
            .filter(|lifetime| *lifetime > TimeDelta::zero())
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!("expires_in out of range: {}", token.expires_in))
            })?;

        let credential = Credential::new(token.access_token, expires_at);
        if !credential.is_valid() {
            return Err(AuthError::InvalidResponse(
                "access token is empty or expires immediately".to_string(),
            ));
        }
        Ok(credential)
    }
}
