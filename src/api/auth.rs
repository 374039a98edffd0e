use std::time::SystemTime;

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use super::constants::{self, timeouts, DEFAULT_TOKEN_LIFETIME_SECS};
use super::error::{OptionSetError, Result};
use super::models::{Credentials, TokenInfo};

/// Token endpoint answer; `expires_in` shows up as a number or a numeric string
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<Value>,
}

impl TokenResponse {
    fn expires_in(&self) -> u64 {
        match &self.expires_in {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
            _ => DEFAULT_TOKEN_LIFETIME_SECS,
        }
    }
}

/// OAuth2 client-credentials token cache for one environment.
///
/// The check-and-refresh sequence runs under a single async mutex so that
/// concurrent callers never race to refresh.
pub struct TokenCache {
    credentials: Credentials,
    token_url: String,
    http_client: reqwest::Client,
    token: Mutex<Option<TokenInfo>>,
}

impl TokenCache {
    pub fn new(credentials: Credentials, http_client: reqwest::Client) -> Self {
        Self::with_authority(credentials, constants::DEFAULT_AUTHORITY_HOST, http_client)
    }

    /// Use a non-default identity provider host (sovereign clouds, test servers)
    pub fn with_authority(
        credentials: Credentials,
        authority_host: &str,
        http_client: reqwest::Client,
    ) -> Self {
        let token_url = constants::token_endpoint(authority_host, &credentials.tenant_id);
        Self {
            credentials,
            token_url,
            http_client,
            token: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return a bearer token, reusing the cached one unless `force_new` is set
    /// or it is about to expire.
    pub async fn get_token(&self, force_new: bool) -> Result<String> {
        let mut guard = self.token.lock().await;
        let now = SystemTime::now();

        if !force_new {
            if let Some(token) = guard.as_ref().filter(|t| t.is_usable_at(now)) {
                debug!(
                    "Reusing cached token (expires in {}s)",
                    token.remaining_at(now).as_secs()
                );
                return Ok(token.access_token.clone());
            }
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    /// Drop the cached token; the next `get_token` goes to the identity provider
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
        debug!("Token cache invalidated");
    }

    /// Currently cached token, if any
    pub async fn cached(&self) -> Option<TokenInfo> {
        self.token.lock().await.clone()
    }

    async fn request_token(&self) -> Result<TokenInfo> {
        info!(
            "Requesting client-credentials token for {}",
            self.credentials.base_url
        );

        let scope = constants::default_scope(&self.credentials.base_url);
        let response = self
            .http_client
            .post(&self.token_url)
            .timeout(timeouts::TOKEN)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OptionSetError::auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        debug!("Token request status: {}", status);

        let text = response
            .text()
            .await
            .map_err(|e| OptionSetError::auth(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            return Err(OptionSetError::auth(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        let body: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| OptionSetError::auth(format!("malformed token response: {}", e)))?;

        let access_token = body
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OptionSetError::auth("no access token in response"))?;

        let expires_in = body.expires_in();
        let token = TokenInfo::issued_at(access_token, SystemTime::now(), expires_in)
            .ok_or_else(|| OptionSetError::auth(format!("expires_in out of range: {}", expires_in)))?;
        debug!("Obtained new bearer token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_in_variants() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":1800}"#).unwrap();
        assert_eq!(parsed.expires_in(), 1800);

        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":"3599"}"#).unwrap();
        assert_eq!(parsed.expires_in(), 3599);

        let parsed: TokenResponse = serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();
        assert_eq!(parsed.expires_in(), DEFAULT_TOKEN_LIFETIME_SECS);
    }
}
