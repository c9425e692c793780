//! Transport-independent request and route parsing.

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::page::PageName;

/// HTTP method, as far as routing cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method {
            "GET" => Self::Get,
            "POST" => Self::Post,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound request, detached from the HTTP library.
#[derive(Debug, Clone)]
pub struct WikiRequest {
    pub method: Method,
    /// Request target as sent (percent-encoded, query included).
    pub url: String,
    /// Raw `Cookie` header.
    pub cookie: Option<String>,
    pub if_none_match: Option<String>,
    pub body: Vec<u8>,
}

impl WikiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            cookie: None,
            if_none_match: None,
            body: Vec::new(),
        }
    }

    /// Path part of the target, still percent-encoded.
    pub fn raw_path(&self) -> &str {
        let end = self.url.find(['?', '#']).unwrap_or(self.url.len());
        &self.url[..end]
    }

    /// Decoded path. Invalid UTF-8 is replaced, which can only fail to resolve.
    pub fn path(&self) -> String {
        percent_decode_str(self.raw_path())
            .decode_utf8_lossy()
            .into_owned()
    }
}

#[cfg(test)]
impl WikiRequest {
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_if_none_match(mut self, etag: impl Into<String>) -> Self {
        self.if_none_match = Some(etag.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// What a decoded request path asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/.auth/<token>`
    Auth { token: String },
    /// `<page>/.lock`
    Lock(PageName),
    /// `<page>/.unlock`
    Unlock(PageName),
    /// A page or static asset.
    Content,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        if let Some(token) = path.strip_prefix("/.auth/") {
            return Self::Auth {
                token: token.to_string(),
            };
        }
        if let Some(page) = path.strip_suffix("/.lock") {
            return Self::Lock(PageName::new(page));
        }
        if let Some(page) = path.strip_suffix("/.unlock") {
            return Self::Unlock(PageName::new(page));
        }
        Self::Content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method() {
        assert_eq!(Method::parse("GET"), Method::Get);
        assert_eq!(Method::parse("DELETE").as_str(), "DELETE");
    }

    #[test]
    fn test_path_strips_query_and_decodes() {
        let req = WikiRequest::new(Method::Get, "/my%20page?x=1#top");
        assert_eq!(req.raw_path(), "/my%20page");
        assert_eq!(req.path(), "/my page");
    }

    #[test]
    fn test_routes() {
        assert_eq!(
            Route::parse("/.auth/tok en"),
            Route::Auth {
                token: "tok en".into()
            }
        );
        assert_eq!(Route::parse("/notes/todo/.lock"), Route::Lock("notes/todo".into()));
        assert_eq!(Route::parse("/.lock"), Route::Lock(PageName::root()));
        assert_eq!(Route::parse("/todo/.unlock"), Route::Unlock("todo".into()));
        assert_eq!(Route::parse("/notes/"), Route::Content);
        assert_eq!(Route::parse("/.auth"), Route::Content);
    }
}
