//! Bearer token lifecycle management
//!
//! The gateway issues OAuth bearer tokens with a reported lifetime (typically
//! 3600 s). [`TokenManager`] owns the single cached token slot: every
//! authenticated call reads it, and a token that is absent or within the
//! 30-second guard band of expiry triggers one issuance request, serialized
//! across concurrent callers so they all ride the same refresh.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::error::Error;
use crate::util::unix_time;

/// Tokens this close to expiry (seconds) are treated as already expired, so a
/// token cannot lapse between validation and use.
pub const TOKEN_EXPIRY_GUARD_SECS: u64 = 30;

/// A cached bearer credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Opaque gateway-issued token
    pub access_token: String,
    /// Unix time the token was issued
    pub issued_at: u64,
    /// Unix time the token lapses (`issued_at` + gateway-reported lifetime)
    pub expires_at: u64,
}

impl Token {
    /// Seconds until this token expires, saturating at zero
    pub fn seconds_until_expiry(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    /// Whether the token is still outside the expiry guard band
    pub fn is_usable(&self, now: u64) -> bool {
        self.seconds_until_expiry(now) > TOKEN_EXPIRY_GUARD_SECS
    }
}

/// Single-slot persistence for the cached token
///
/// Implementations back the slot with whatever store the embedding
/// application uses; [`InMemoryTokenStore`] ships for processes that do not
/// need the token to survive restarts.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read the cached token, if any
    async fn load(&self) -> Result<Option<Token>, Error>;
    /// Replace the cached token
    async fn save(&self, token: &Token) -> Result<(), Error>;
    /// Drop the cached token
    async fn clear(&self) -> Result<(), Error>;
}

/// Process-local token store
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    slot: RwLock<Option<Token>>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> Result<Option<Token>, Error> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, token: &Token) -> Result<(), Error> {
        *self.slot.write().await = Some(token.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        *self.slot.write().await = None;
        Ok(())
    }
}

/// Body of the gateway's token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    // the gateway reports the lifetime as a quoted number
    #[serde(deserialize_with = "parse_u64_from_string")]
    expires_in: u64,
}

fn parse_u64_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(u64),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => s.parse().map_err(serde::de::Error::custom),
        StringOrInt::Int(n) => Ok(n),
    }
}

/// Owns the token cache slot and the issuance flow
pub struct TokenManager {
    http: reqwest::Client,
    base_url: Url,
    consumer_key: String,
    consumer_secret: String,
    store: Arc<dyn TokenStore>,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    /// Create a manager talking to `base_url` with the given app credentials
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        consumer_key: String,
        consumer_secret: String,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            http,
            base_url,
            consumer_key,
            consumer_secret,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Return a bearer token that is valid for at least the guard band.
    ///
    /// Refreshes lazily: a cached usable token is returned as-is; otherwise
    /// one issuance request runs while concurrent callers wait on the lock
    /// and pick up the freshly stored token. On issuance failure the cached
    /// slot is left untouched and the error propagates, so the next call
    /// retries.
    pub async fn access_token(&self) -> Result<String, Error> {
        if let Some(token) = self.store.load().await? {
            if token.is_usable(unix_time()) {
                return Ok(token.access_token);
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // another caller may have refreshed while we waited on the lock
        if let Some(token) = self.store.load().await? {
            if token.is_usable(unix_time()) {
                return Ok(token.access_token);
            }
        }

        let token = self.issue_token().await?;
        self.store.save(&token).await?;

        Ok(token.access_token)
    }

    async fn issue_token(&self) -> Result<Token, Error> {
        let url = self
            .base_url
            .join("/oauth/v1/generate")
            .map_err(|e| Error::TokenIssuance(format!("invalid token URL: {}", e)))?;

        tracing::debug!("GET {} (token issuance)", url);

        let response = self
            .http
            .get(url)
            .query(&[("grant_type", "client_credentials")])
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .send()
            .await
            .map_err(|e| Error::TokenIssuance(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::TokenIssuance(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!("Token issuance failed with status {}: {}", status, body);
            return Err(Error::TokenIssuance(format!(
                "gateway returned {}: {}",
                status, body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::TokenIssuance(format!("malformed token response: {}", e)))?;

        let now = unix_time();
        Ok(Token {
            access_token: parsed.access_token,
            issued_at: now,
            expires_at: now + parsed.expires_in,
        })
    }
}
