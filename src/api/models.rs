use std::fmt;
use std::time::{Duration, SystemTime};

use super::constants::TOKEN_SAFETY_MARGIN_SECS;

/// Client-credentials for one Dataverse environment
#[derive(Clone)]
pub struct Credentials {
    /// Environment URL, e.g. `https://org.crm4.dynamics.com` (no trailing slash)
    pub base_url: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(
        base_url: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

// Keep the secret out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Cached token information for an environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl TokenInfo {
    /// Token obtained at `now` that the provider says lives for `expires_in` seconds.
    ///
    /// `None` when the expiry does not fit in a `SystemTime`.
    pub fn issued_at(
        access_token: impl Into<String>,
        now: SystemTime,
        expires_in: u64,
    ) -> Option<Self> {
        let expires_at = now.checked_add(Duration::from_secs(expires_in))?;
        Some(Self {
            access_token: access_token.into(),
            expires_at,
        })
    }

    /// Whether the token can still be presented at `now`, keeping the 60s safety margin
    pub fn is_usable_at(&self, now: SystemTime) -> bool {
        now + Duration::from_secs(TOKEN_SAFETY_MARGIN_SECS) < self.expires_at
    }

    pub fn is_usable(&self) -> bool {
        self.is_usable_at(SystemTime::now())
    }

    /// Remaining lifetime before the safety margin kicks in
    pub fn remaining_at(&self, now: SystemTime) -> Duration {
        self.expires_at
            .duration_since(now + Duration::from_secs(TOKEN_SAFETY_MARGIN_SECS))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usable_outside_margin() {
        let now = SystemTime::now();
        let token = TokenInfo {
            access_token: "abc".to_string(),
            expires_at: now + Duration::from_secs(120),
        };
        assert!(token.is_usable_at(now));
        assert_eq!(token.remaining_at(now), Duration::from_secs(60));
    }

    #[test]
    fn test_token_stale_inside_margin() {
        let now = SystemTime::now();
        let token = TokenInfo {
            access_token: "abc".to_string(),
            expires_at: now + Duration::from_secs(30),
        };
        assert!(!token.is_usable_at(now));
        assert_eq!(token.remaining_at(now), Duration::ZERO);

        // exactly on the margin is already stale
        let edge = TokenInfo::issued_at("abc", now, TOKEN_SAFETY_MARGIN_SECS).unwrap();
        assert!(!edge.is_usable_at(now));
    }

    #[test]
    fn test_issued_at_rejects_unrepresentable_expiry() {
        let now = SystemTime::now();
        assert!(TokenInfo::issued_at("abc", now, u64::MAX).is_none());
        assert!(TokenInfo::issued_at("abc", now, 3600).is_some());
    }

    #[test]
    fn test_credentials_trim_and_redact() {
        let creds = Credentials::new("https://org.crm.dynamics.com/", "t", "c", "s3cret");
        assert_eq!(creds.base_url, "https://org.crm.dynamics.com");
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }
}
