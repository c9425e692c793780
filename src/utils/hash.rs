//! Content fingerprints for HTTP validators.
//!
//! Uses `rustc_hash::FxHasher`: fast and deterministic, which is all a cache
//! validator needs. Not suitable for anything security-sensitive.

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

/// Weak entity tag for a response body (`W/"<16 hex digits>"`).
pub fn weak_etag<T: AsRef<[u8]> + ?Sized>(body: &T) -> String {
    format!("W/\"{:016x}\"", compute(body))
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Comparison is weak (the `W/` prefix is ignored on both sides), and `*`
/// matches anything.
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    let opaque = |tag: &str| {
        let tag = tag.trim();
        tag.strip_prefix("W/").unwrap_or(tag).to_string()
    };
    let wanted = opaque(etag);
    if_none_match
        .split(',')
        .any(|candidate| candidate.trim() == "*" || opaque(candidate) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_is_deterministic() {
        assert_eq!(compute("page"), compute(b"page".as_slice()));
        assert_ne!(compute("page"), compute("other"));
    }

    #[test]
    fn test_weak_etag_format() {
        let tag = weak_etag("body");
        assert!(tag.starts_with("W/\""));
        assert!(tag.ends_with('"'));
        assert_eq!(tag.len(), 2 + 1 + 16 + 1);
    }

    #[test]
    fn test_etag_matches() {
        let tag = weak_etag("body");
        assert!(etag_matches(&tag, &tag));
        assert!(etag_matches(tag.trim_start_matches("W/"), &tag));
        assert!(etag_matches(&format!("\"nope\", {tag}"), &tag));
        assert!(etag_matches("*", &tag));
        assert!(!etag_matches("\"nope\"", &tag));
    }
}
