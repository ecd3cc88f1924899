//! Bearer token values.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// A short-lived OAuth bearer token with optional validity window.
///
/// The token value is zeroized on drop and redacted from debug output.
/// The connector places no structural requirement on the value; it is
/// forwarded verbatim as `Authorization: Bearer <value>` and inside the
/// metadata exchange.
///
/// # Example
///
/// ```
/// use alloydb_connector::AccessToken;
///
/// let token = AccessToken::new("ya29.secret");
/// assert_eq!(token.secret(), "ya29.secret");
///
/// let debug = format!("{:?}", token);
/// assert!(!debug.contains("secret"));
/// ```
#[derive(Clone)]
pub struct AccessToken {
    value: Zeroizing<String>,
    not_before: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a token with no validity metadata.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Zeroizing::new(value.into()),
            not_before: None,
            expires_at: None,
        }
    }

    /// Set the expiration time (builder pattern).
    pub fn with_expires_at(mut self, time: DateTime<Utc>) -> Self {
        self.expires_at = Some(time);
        self
    }

    /// Set the not-before time (builder pattern).
    pub fn with_not_before(mut self, time: DateTime<Utc>) -> Self {
        self.not_before = Some(time);
        self
    }

    /// The raw token value.
    pub fn secret(&self) -> &str {
        &self.value
    }

    /// Token expiration time, if known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Earliest time the token is valid, if known.
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    /// Check if the token has expired.
    ///
    /// Returns `false` when no expiration is set.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp < Utc::now())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("not_before", &self.not_before)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_secret_returns_value() {
        let token = AccessToken::new("tok");
        assert_eq!(token.secret(), "tok");
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = AccessToken::new("super-secret-token");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_is_expired_future() {
        let token = AccessToken::new("t").with_expires_at(Utc::now() + Duration::hours(1));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_is_expired_past() {
        let token = AccessToken::new("t").with_expires_at(Utc::now() - Duration::hours(1));
        assert!(token.is_expired());
    }

    #[test]
    fn test_is_expired_none() {
        let token = AccessToken::new("t");
        assert!(!token.is_expired());
    }

    #[test]
    fn test_builder_chain() {
        let now = Utc::now();
        let token = AccessToken::new("t")
            .with_not_before(now)
            .with_expires_at(now + Duration::hours(1));
        assert_eq!(token.not_before(), Some(now));
        assert_eq!(token.expires_at(), Some(now + Duration::hours(1)));
    }
}
