//! OAuth client-credentials token source
//!
//! Tokens are fetched lazily and cached until shortly before they expire.

use super::models::{error_detail, TokenResponse};
use crate::config::SecretString;
use crate::domain::{IotApiError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use tokio::sync::Mutex;

/// Audience requested for IoT API tokens
pub const TOKEN_AUDIENCE: &str = "https://api2.arduino.cc/iot";

/// Lifetime assumed when the token endpoint does not report one
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 300;

/// Tokens are refreshed this long before their reported expiry
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Issues and caches bearer tokens for the IoT API
pub struct TokenSource {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    organization_id: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(
        client: Client,
        base_url: &str,
        client_id: String,
        client_secret: SecretString,
        organization_id: Option<String>,
    ) -> Self {
        Self {
            client,
            token_url: format!("{base_url}/iot/v1/clients/token"),
            client_id,
            client_secret,
            organization_id,
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid token, requesting a new one when needed
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next call fetches a fresh one
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn request_token(&self) -> Result<CachedToken> {
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_ref()),
            ("audience", TOKEN_AUDIENCE),
        ];
        if let Some(org) = self.organization_id.as_deref() {
            form.push(("organization_id", org));
        }

        tracing::debug!(url = %self.token_url, "Requesting access token");

        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| IotApiError::ConnectionFailed(format!("token request: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(IotApiError::AuthenticationFailed("wrong credentials".to_string()).into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IotApiError::AuthenticationFailed(format!(
                "cannot retrieve a valid token: status {}: {}",
                status.as_u16(),
                error_detail(&body)
            ))
            .into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IotApiError::InvalidResponse(format!("token response: {e}")))?;

        let lifetime = token
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .saturating_sub(EXPIRY_MARGIN_SECS)
            .max(0);

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }
}
