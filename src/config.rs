//! Store configuration and per-session cookie options

use salvo_core::http::cookie::time::{Duration, OffsetDateTime};
use salvo_core::http::cookie::{self, Cookie};

use crate::cookie_codec::{KeyPair, DEFAULT_COOKIE_MAX_AGE};

/// Table used when none (or an empty name) is configured
pub const DEFAULT_TABLE_NAME: &str = "sessions";

/// Default session lifetime in seconds, 30 days
pub const DEFAULT_MAX_AGE: i64 = 2_592_000;

/// SameSite cookie attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    /// Strict - cookie only sent for same-site requests
    Strict,
    /// Lax - cookie sent for same-site requests and top-level navigations
    Lax,
    /// None - cookie sent for all requests (requires Secure)
    None,
}

impl From<SameSite> for cookie::SameSite {
    fn from(same_site: SameSite) -> Self {
        match same_site {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

/// Cookie attributes carried by every session.
///
/// The store keeps one set of defaults and each new session receives its own
/// copy, so changing a session's options never leaks into another request.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// Cookie path (default: "/")
    pub path: String,

    /// Cookie domain (default: None - current domain only)
    pub domain: Option<String>,

    /// Lifetime in seconds, also used as the row TTL.
    ///
    /// Zero means a browser-session cookie and a row without TTL. A negative
    /// value deletes the cookie on the next save.
    pub max_age: i64,

    /// Secure flag for cookie (default: false)
    pub secure: bool,

    /// HttpOnly flag for cookie (default: false)
    pub http_only: bool,

    /// SameSite attribute, omitted when None
    pub same_site: Option<SameSite>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            max_age: DEFAULT_MAX_AGE,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }
}

impl Options {
    /// Build the response cookie for a session carrying these options
    pub fn cookie(&self, name: &str, value: &str) -> Cookie<'static> {
        let mut builder = Cookie::build((name.to_owned(), value.to_owned()))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site.into());
        }

        if self.max_age > 0 {
            let max_age = Duration::seconds(self.max_age);
            builder = builder.max_age(max_age);
            if let Some(expires) = OffsetDateTime::now_utc().checked_add(max_age) {
                builder = builder.expires(expires);
            }
        } else if self.max_age < 0 {
            builder = builder
                .max_age(Duration::seconds(self.max_age))
                .expires(OffsetDateTime::UNIX_EPOCH);
        }

        builder.build()
    }
}

/// Configuration for a [`CassandraStore`](crate::CassandraStore)
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Name of the session table (default: "sessions")
    pub table_name: String,

    /// Cookie key pairs, newest first.
    /// The first pair that can encode is used for new cookies.
    /// All pairs are tried when decoding (for key rotation).
    pub key_pairs: Vec<KeyPair>,

    /// Options copied into every new session
    pub options: Options,

    /// How long a signed cookie value stays valid, in seconds
    pub cookie_max_age: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            key_pairs: Vec::new(),
            options: Options::default(),
            cookie_max_age: DEFAULT_COOKIE_MAX_AGE,
        }
    }
}

impl StoreConfig {
    /// Create a configuration signing with a single key pair
    pub fn new(key_pair: KeyPair) -> Self {
        Self {
            key_pairs: vec![key_pair],
            ..Default::default()
        }
    }

    /// Create a configuration with multiple key pairs for rotation
    pub fn with_key_pairs<I>(key_pairs: I) -> Self
    where
        I: IntoIterator<Item = KeyPair>,
    {
        Self {
            key_pairs: key_pairs.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Set the table name; an empty name falls back to "sessions"
    pub fn with_table_name<S: Into<String>>(mut self, table_name: S) -> Self {
        let table_name = table_name.into();
        self.table_name = if table_name.is_empty() {
            DEFAULT_TABLE_NAME.to_string()
        } else {
            table_name
        };
        self
    }

    /// Replace the default session options
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Set the cookie path (default: "/")
    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.options.path = path.into();
        self
    }

    /// Set the cookie domain
    pub fn with_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.options.domain = Some(domain.into());
        self
    }

    /// Set the Secure flag (default: false)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.options.secure = secure;
        self
    }

    /// Set the HttpOnly flag (default: false)
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.options.http_only = http_only;
        self
    }

    /// Set the SameSite attribute (default: not sent)
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.options.same_site = Some(same_site);
        self
    }

    /// Set the session lifetime in seconds.
    ///
    /// This is the default cookie max-age, the row TTL, and the freshness
    /// window of signed cookie values all at once.
    pub fn with_max_age(mut self, secs: i64) -> Self {
        self.options.max_age = secs;
        self.cookie_max_age = secs.max(0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.table_name, "sessions");
        assert_eq!(config.options.path, "/");
        assert_eq!(config.options.max_age, 2_592_000);
        assert_eq!(config.cookie_max_age, 86400 * 30);
        assert!(config.key_pairs.is_empty());
    }

    #[test]
    fn test_empty_table_name_falls_back() {
        assert_eq!(StoreConfig::default().with_table_name("").table_name, "sessions");
        assert_eq!(
            StoreConfig::default().with_table_name("web_sessions").table_name,
            "web_sessions"
        );
    }

    #[test]
    fn test_max_age_updates_freshness_window() {
        let config = StoreConfig::new(KeyPair::new("k")).with_max_age(3600);
        assert_eq!(config.options.max_age, 3600);
        assert_eq!(config.cookie_max_age, 3600);

        let config = config.with_max_age(-1);
        assert_eq!(config.options.max_age, -1);
        assert_eq!(config.cookie_max_age, 0);
    }

    #[test]
    fn test_positive_max_age_cookie() {
        let options = Options {
            max_age: 3600,
            domain: Some("example.com".into()),
            secure: true,
            http_only: true,
            same_site: Some(SameSite::Lax),
            ..Default::default()
        };
        let cookie = options.cookie("app", "value");

        assert_eq!(cookie.name(), "app");
        assert_eq!(cookie.value(), "value");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(cookie::SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(3600)));
        assert!(cookie.expires_datetime().unwrap() > OffsetDateTime::now_utc());
    }

    #[test]
    fn test_negative_max_age_cookie_is_expired() {
        let options = Options {
            max_age: -1,
            ..Default::default()
        };
        let cookie = options.cookie("app", "");

        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().unwrap().is_negative());
        assert!(cookie.expires_datetime().unwrap() < OffsetDateTime::now_utc());
    }

    #[test]
    fn test_zero_max_age_is_browser_session() {
        let options = Options {
            max_age: 0,
            ..Default::default()
        };
        let cookie = options.cookie("app", "v");
        assert!(cookie.max_age().is_none());
        assert!(cookie.expires().is_none());
    }
}
