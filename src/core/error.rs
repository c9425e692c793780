//! Request-level error taxonomy.
//!
//! Core operations return typed errors; they become a status code and a
//! plain-text message only at the HTTP boundary via [`WikiError::status`]
//! and [`WikiError::public_message`].

use thiserror::Error;

use crate::lock::LockError;
use crate::page::ResolveError;
use crate::pipeline::ParseError;
use crate::{debug, log};

/// Largest accepted lock token, in bytes.
pub const MAX_LOCK_TOKEN: usize = 1024;

/// A request the server refuses to act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRequest {
    #[error("lock token must not be empty")]
    EmptyLockToken,

    #[error("lock token exceeds {} bytes", MAX_LOCK_TOKEN)]
    LockTokenTooLarge,

    #[error("method not allowed")]
    MethodNotAllowed { allow: &'static str },
}

/// Failure while turning a resolved page into HTML.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid page url: {0}")]
    Url(#[from] url::ParseError),

    #[error("`{name}` is not valid UTF-8")]
    Encoding { name: String },
}

/// Everything that can end a request early.
#[derive(Debug, Error)]
pub enum WikiError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("authentication required")]
    AuthRequired,

    #[error(transparent)]
    Malformed(#[from] MalformedRequest),
}

impl WikiError {
    pub const fn method_not_allowed(allow: &'static str) -> Self {
        Self::Malformed(MalformedRequest::MethodNotAllowed { allow })
    }

    /// HTTP status code for this error.
    pub const fn status(&self) -> u16 {
        match self {
            Self::Resolve(ResolveError::Traversal { .. } | ResolveError::NotFound { .. }) => 404,
            Self::Resolve(ResolveError::Io { .. }) => 500,
            Self::Lock(LockError::Conflict { .. }) => 409,
            Self::Lock(LockError::Deadline { .. }) => 500,
            Self::Render(_) => 500,
            Self::AuthRequired => 403,
            Self::Malformed(MalformedRequest::MethodNotAllowed { .. }) => 405,
            Self::Malformed(_) => 400,
        }
    }

    /// Value of the `Allow` header, for 405 responses.
    pub const fn allow(&self) -> Option<&'static str> {
        match self {
            Self::Malformed(MalformedRequest::MethodNotAllowed { allow }) => Some(*allow),
            _ => None,
        }
    }

    /// Text shown to the client.
    ///
    /// Traversal attempts look exactly like a missing page from outside.
    pub fn public_message(&self) -> String {
        match self {
            Self::Resolve(ResolveError::Traversal { .. } | ResolveError::NotFound { .. }) => {
                "not found".to_string()
            }
            Self::Resolve(ResolveError::Io { .. }) => "failed to read page".to_string(),
            Self::AuthRequired => "no".to_string(),
            other => other.to_string(),
        }
    }

    /// Record the error under the module that cares about it.
    pub fn log(&self, path: &str) {
        match self {
            Self::Resolve(e @ ResolveError::Traversal { .. }) => {
                log!("security"; "blocked {path}: {e}");
            }
            Self::Resolve(e @ ResolveError::Io { .. }) => {
                log!("error"; "{path}: {}", error_chain(e));
            }
            Self::Render(e) => log!("render"; "{path}: {e}"),
            Self::AuthRequired => debug!("auth"; "rejected {path}"),
            Self::Lock(e @ LockError::Deadline { .. }) => log!("error"; "{path}: {e}"),
            Self::Lock(e) => debug!("lock"; "{e}"),
            other => debug!("serve"; "{path}: {other}"),
        }
    }
}

/// `error: cause: cause` for errors with a source chain.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::page::PageName;

    fn traversal() -> WikiError {
        ResolveError::Traversal {
            name: "../etc/passwd".into(),
        }
        .into()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(traversal().status(), 404);
        assert_eq!(
            WikiError::from(ResolveError::NotFound { name: "x".into() }).status(),
            404
        );
        assert_eq!(
            WikiError::from(LockError::Conflict {
                page: PageName::new("p")
            })
            .status(),
            409
        );
        assert_eq!(
            WikiError::from(LockError::Deadline {
                page: PageName::new("p")
            })
            .status(),
            500
        );
        assert_eq!(WikiError::AuthRequired.status(), 403);
        assert_eq!(WikiError::from(MalformedRequest::EmptyLockToken).status(), 400);
        assert_eq!(WikiError::from(MalformedRequest::LockTokenTooLarge).status(), 400);
        assert_eq!(WikiError::method_not_allowed("POST").status(), 405);
    }

    #[test]
    fn test_allow_only_on_405() {
        assert_eq!(WikiError::method_not_allowed("POST").allow(), Some("POST"));
        assert_eq!(WikiError::AuthRequired.allow(), None);
    }

    #[test]
    fn test_traversal_is_indistinguishable_to_clients() {
        let missing = WikiError::from(ResolveError::NotFound {
            name: "etc/passwd".into(),
        });
        assert_eq!(traversal().public_message(), missing.public_message());
        assert!(!traversal().public_message().contains("passwd"));
    }

    #[test]
    fn test_io_message_hides_details() {
        let err = WikiError::from(ResolveError::Io {
            name: "secret/page".into(),
            source: io::Error::other("disk on fire"),
        });
        assert_eq!(err.status(), 500);
        assert!(!err.public_message().contains("disk"));
    }

    #[test]
    fn test_error_chain() {
        let err = ResolveError::Io {
            name: "p".into(),
            source: io::Error::other("denied"),
        };
        assert_eq!(error_chain(&err), "failed to read `p`: denied");
    }
}
