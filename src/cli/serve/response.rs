//! Responses and the tiny_http boundary.

use anyhow::Result;
use tiny_http::{Header, Request, Response, StatusCode};

use crate::core::WikiError;
use crate::log;
use crate::utils::hash::{etag_matches, weak_etag};
use crate::utils::mime::types::{HTML, PLAIN};

/// Redirect caching for slash normalization.
pub const CACHE_REDIRECT: &str = "max-age=604800";
/// Static assets: short freshness, long background revalidation.
pub const CACHE_ASSET: &str = "max-age=300, stale-while-revalidate=28800";
/// Rendered pages change whenever their source does.
pub const CACHE_PAGE: &str = "max-age=10";

/// A complete response, built by the handler and sent by [`send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl WikiResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("Content-Type", PLAIN)
            .with_body(body.into().into_bytes())
    }

    pub fn html(body: String) -> Self {
        Self::new(200)
            .with_header("Content-Type", HTML)
            .with_body(body.into_bytes())
    }

    /// `303 See Other` to `location`.
    pub fn see_other(location: impl Into<String>) -> Self {
        Self::new(303).with_header("Location", location)
    }

    pub fn error(error: &WikiError) -> Self {
        let response = Self::text(error.status(), error.public_message());
        match error.allow() {
            Some(allow) => response.with_header("Allow", allow),
            None => response,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// First value of header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Tag a 200 body with a weak ETag, answering `304` when the client
    /// already has it.
    pub fn with_etag(mut self, if_none_match: Option<&str>) -> Self {
        if self.status != 200 {
            return self;
        }
        let etag = weak_etag(&self.body);
        if if_none_match.is_some_and(|header| etag_matches(header, &etag)) {
            self.status = 304;
            self.body.clear();
            self.headers.retain(|(name, _)| *name != "Content-Type");
        }
        self.with_header("ETag", etag)
    }
}

/// Write `response` to the client.
pub fn send(request: Request, response: WikiResponse) -> Result<()> {
    let mut out = Response::from_data(response.body).with_status_code(StatusCode(response.status));
    for (name, value) in response.headers {
        match make_header(name, &value) {
            Some(header) => out.add_header(header),
            None => log!("error"; "dropping invalid {} header", name),
        }
    }
    request.respond(out)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send(request, WikiResponse::text(503, "503 Service Unavailable"))
}

fn make_header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}
