//! Session configuration

use std::time::Duration;

/// Lifetime of a session that is not marked permanent.
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Store TTLs are whole seconds, so shorter lifetimes are rounded up to this.
const MIN_SESSION_LIFETIME: Duration = Duration::from_secs(1);

/// Configuration for the session middleware
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Name of the session cookie (default: "session")
    pub cookie_name: String,

    /// Cookie path (default: "/")
    pub cookie_path: String,

    /// Cookie domain (default: None - current domain only)
    pub cookie_domain: Option<String>,

    /// Secure flag for cookie (default: false)
    pub cookie_secure: bool,

    /// SameSite attribute for cookie
    pub cookie_same_site: SameSite,

    /// Lifetime applied to sessions marked permanent (default: 31 days).
    /// Other sessions always live for one day.
    pub permanent_lifetime: Duration,

    /// Session key prefix in store (default: "session:")
    pub prefix: String,
}

/// SameSite cookie attribute
#[derive(Clone, Debug, PartialEq)]
pub enum SameSite {
    /// Strict - cookie only sent for same-site requests
    Strict,
    /// Lax - cookie sent for same-site requests and top-level navigations
    Lax,
    /// None - cookie sent for all requests (requires Secure)
    None,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            cookie_path: "/".to_string(),
            cookie_domain: None,
            cookie_secure: false,
            cookie_same_site: SameSite::Lax,
            permanent_lifetime: Duration::from_secs(31 * 24 * 60 * 60),
            prefix: "session:".to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cookie name (default: "session")
    pub fn with_cookie_name<S: Into<String>>(mut self, name: S) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the cookie path (default: "/")
    pub fn with_cookie_path<S: Into<String>>(mut self, path: S) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Set the cookie domain
    pub fn with_cookie_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    /// Set the Secure flag (default: false)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set the SameSite attribute (default: Lax)
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    /// Set the lifetime of permanent sessions (at least one second)
    pub fn with_permanent_lifetime(mut self, lifetime: Duration) -> Self {
        self.permanent_lifetime = lifetime;
        self
    }

    /// Set the session key prefix in store (default: "session:")
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Lifetime for a session, depending on its permanent flag
    pub fn session_lifetime(&self, permanent: bool) -> Duration {
        if permanent {
            self.permanent_lifetime.max(MIN_SESSION_LIFETIME)
        } else {
            DEFAULT_SESSION_LIFETIME
        }
    }

    /// Store key for a session id
    pub fn store_key(&self, sid: &str) -> String {
        format!("{}{}", self.prefix, sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.store_key("abcd"), "session:abcd");
        assert_eq!(config.session_lifetime(false), Duration::from_secs(86400));
        assert_eq!(config.session_lifetime(true), Duration::from_secs(31 * 86400));
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new()
            .with_cookie_name("sid")
            .with_cookie_domain("example.com")
            .with_secure(true)
            .with_prefix("s:")
            .with_permanent_lifetime(Duration::from_secs(3600));
        assert_eq!(config.cookie_name, "sid");
        assert_eq!(config.cookie_domain.as_deref(), Some("example.com"));
        assert!(config.cookie_secure);
        assert_eq!(config.store_key("x"), "s:x");
        assert_eq!(config.session_lifetime(true), Duration::from_secs(3600));
    }

    #[test]
    fn test_sub_second_lifetime_rounds_up() {
        let config = SessionConfig::new().with_permanent_lifetime(Duration::from_millis(300));
        assert_eq!(config.session_lifetime(true).as_secs(), 1);

        let config = SessionConfig::new().with_permanent_lifetime(Duration::ZERO);
        assert_eq!(config.session_lifetime(true).as_secs(), 1);
    }
}
