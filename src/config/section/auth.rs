//! `[auth]` section configuration.
//!
//! Authentication is enabled by the presence of `.auth` in the wiki root;
//! this section only shapes the session cookie.
//!
//! ```toml
//! [auth]
//! cookie = "quire"       # Cookie name
//! max_age = 31536000     # Cookie lifetime in seconds (one year)
//! secure = true          # Send the cookie over HTTPS only
//! ```
//!
//! Set `secure = false` when serving plain HTTP outside localhost.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie: String,
    pub max_age: u64,
    pub secure: bool,
}

impl AuthConfig {
    /// Whether `name` is a valid cookie name (an RFC 6265 token).
    pub fn is_valid_cookie_name(name: &str) -> bool {
        !name.is_empty()
            && name.bytes().all(|b| {
                b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
            })
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie: "quire".to_string(),
            max_age: 31_536_000,
            secure: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_auth_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.auth.cookie, "quire");
        assert_eq!(config.auth.max_age, 31_536_000);
        assert!(config.auth.secure);
    }

    #[test]
    fn test_cookie_name_validation() {
        assert!(AuthConfig::is_valid_cookie_name("quire"));
        assert!(AuthConfig::is_valid_cookie_name("wiki_session-1"));
        assert!(!AuthConfig::is_valid_cookie_name(""));
        assert!(!AuthConfig::is_valid_cookie_name("has space"));
        assert!(!AuthConfig::is_valid_cookie_name("a=b"));
        assert!(!AuthConfig::is_valid_cookie_name("a;b"));
    }
}
