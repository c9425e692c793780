//! Shared-secret session cookies.
//!
//! The secret lives in `<root>/.auth`. Visiting `/.auth/<token>` stores the
//! token in a long-lived cookie; every later request must present it.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::config::AuthConfig;

/// Bytes that may not appear raw in a cookie value.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

/// `Set-Cookie` value storing `token`.
pub fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly",
        config.cookie,
        utf8_percent_encode(token, COOKIE_VALUE),
        config.max_age
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Decoded value of cookie `name` in a `Cookie` request header.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            let value = value.trim_matches('"');
            percent_decode_str(value).decode_utf8_lossy().into_owned()
        })
}

/// Whether the presented cookie matches the secret.
pub fn is_authorized(secret: &str, presented: Option<&str>) -> bool {
    presented.is_some_and(|value| constant_time_eq(value.as_bytes(), secret.as_bytes()))
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
