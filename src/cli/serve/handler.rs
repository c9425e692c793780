//! Request orchestration.
//!
//! Routing order for every request:
//!
//! 1. `/.auth/<token>` stores the session cookie
//! 2. if `.auth` exists, the cookie must match it
//! 3. `<page>/.lock` and `<page>/.unlock`
//! 4. only `GET` and `POST` past this point
//! 5. dotfiles are never served
//! 6. trailing slash must agree with file vs directory
//! 7. static asset, or rendered page

use std::io;
use std::sync::Arc;

use tokio::runtime::Handle;

use super::auth::{cookie_value, is_authorized, session_cookie};
use super::page::render_page;
use super::request::{Method, Route, WikiRequest};
use super::response::{CACHE_ASSET, CACHE_PAGE, CACHE_REDIRECT, WikiResponse};
use crate::config::WikiConfig;
use crate::core::{MAX_LOCK_TOKEN, MalformedRequest, WikiError};
use crate::lock::{Acquired, LockManager, LockToken};
use crate::page::{EntryKind, PageName, PathResolver, ResolveError};
use crate::pipeline::minify::minify_asset;
use crate::utils::mime;
use crate::{debug, log};

/// File holding the shared secret.
const AUTH_FILE: &str = ".auth";

/// Everything a request needs: configuration, the sandbox and the lock table.
pub struct Wiki {
    config: Arc<WikiConfig>,
    resolver: PathResolver,
    locks: LockManager,
}

impl Wiki {
    /// Lock expiry timers run on `runtime`.
    pub fn new(config: Arc<WikiConfig>, runtime: Handle) -> io::Result<Self> {
        let resolver = PathResolver::new(&config.root)?;
        let locks = LockManager::new(runtime, config.lock.ttl());
        Ok(Self {
            config,
            resolver,
            locks,
        })
    }

    /// Answer one request. Never fails: errors become responses.
    pub fn handle(&self, request: &WikiRequest) -> WikiResponse {
        let path = request.path();
        let response = self.route(request, &path).unwrap_or_else(|e| {
            e.log(&path);
            WikiResponse::error(&e)
        });
        response.with_header("Vary", "Cookie")
    }

    fn route(&self, request: &WikiRequest, path: &str) -> Result<WikiResponse, WikiError> {
        let route = Route::parse(path);
        if let Route::Auth { token } = &route {
            return self.authenticate(request, token);
        }

        self.check_auth(request)?;

        match route {
            Route::Lock(page) => return self.lock(request, &page),
            Route::Unlock(page) => return self.unlock(request, &page),
            Route::Auth { .. } | Route::Content => {}
        }

        if !matches!(request.method, Method::Get | Method::Post) {
            return Err(WikiError::method_not_allowed("GET, POST"));
        }
        if PageName::new(path).is_hidden() {
            return Err(ResolveError::NotFound {
                name: path.to_string(),
            }
            .into());
        }
        if let Some(redirect) = self.normalize_slash(request.raw_path(), path)? {
            return Ok(redirect);
        }

        let if_none_match = request.if_none_match.as_deref();
        match mime::extension(path) {
            Some(ext) if ext != "md" && ext != "html" => {
                Ok(self.asset(path, ext)?.with_etag(if_none_match))
            }
            _ => Ok(self.page(path)?.with_etag(if_none_match)),
        }
    }

    fn authenticate(&self, request: &WikiRequest, token: &str) -> Result<WikiResponse, WikiError> {
        if request.method != Method::Get {
            return Err(WikiError::method_not_allowed("GET"));
        }
        log!("auth"; "session cookie issued");
        Ok(WikiResponse::see_other("/")
            .with_header("Set-Cookie", session_cookie(&self.config.auth, token)))
    }

    /// Without `.auth` the wiki is open.
    fn check_auth(&self, request: &WikiRequest) -> Result<(), WikiError> {
        let secret = match self.resolver.resolve(AUTH_FILE) {
            Ok(file) => file.contents,
            Err(ResolveError::NotFound { .. }) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let secret = String::from_utf8_lossy(&secret);
        let presented = request
            .cookie
            .as_deref()
            .and_then(|header| cookie_value(header, &self.config.auth.cookie));

        if is_authorized(secret.trim(), presented.as_deref()) {
            Ok(())
        } else {
            Err(WikiError::AuthRequired)
        }
    }

    fn lock(&self, request: &WikiRequest, page: &PageName) -> Result<WikiResponse, WikiError> {
        let token = self.lock_request(request, page)?;
        let key = page.without_trailing_slash();
        match self.locks.acquire_or_extend(&key, &token)? {
            Acquired::Created => log!("lock"; "locked /{} ({} active)", key, self.locks.len()),
            Acquired::Extended => debug!("lock"; "extended /{}", key),
        }
        Ok(WikiResponse::ok())
    }

    fn unlock(&self, request: &WikiRequest, page: &PageName) -> Result<WikiResponse, WikiError> {
        let token = self.lock_request(request, page)?;
        let key = page.without_trailing_slash();
        self.locks.release(&key, &token)?;
        log!("lock"; "unlocked /{}", key);
        Ok(WikiResponse::ok())
    }

    /// Validate method, page and body shared by `.lock` and `.unlock`.
    fn lock_request(&self, request: &WikiRequest, page: &PageName) -> Result<LockToken, WikiError> {
        if request.method != Method::Post {
            return Err(WikiError::method_not_allowed("POST"));
        }
        self.require_page(page)?;
        if request.body.len() > MAX_LOCK_TOKEN {
            return Err(MalformedRequest::LockTokenTooLarge.into());
        }
        LockToken::new(request.body.as_slice()).ok_or_else(|| MalformedRequest::EmptyLockToken.into())
    }

    /// A page exists as a file or as a directory index.
    fn require_page(&self, page: &PageName) -> Result<(), WikiError> {
        match self.resolver.resolve_with_fallback(page) {
            Ok(_) => Ok(()),
            Err(e) if e.is_traversal() => Err(e.into()),
            Err(_) => self
                .resolver
                .resolve_index(page)
                .map(|_| ())
                .map_err(Into::into),
        }
    }

    /// Redirect when the trailing slash disagrees with what is on disk.
    fn normalize_slash(&self, raw_path: &str, path: &str) -> Result<Option<WikiResponse>, WikiError> {
        let kind = match self.resolver.kind(path) {
            Ok(kind) => kind,
            Err(e) if e.is_traversal() => return Err(e.into()),
            Err(_) => return Ok(None),
        };

        // `//host/x` in a Location is another origin.
        let local = format!("/{}", raw_path.trim_start_matches(['/', '\\']));
        let location = match kind {
            EntryKind::Directory if !path.ends_with('/') => format!("{local}/"),
            EntryKind::File if path.ends_with('/') => local.trim_end_matches('/').to_string(),
            _ => return Ok(None),
        };
        Ok(Some(
            WikiResponse::see_other(location).with_header("Cache-Control", CACHE_REDIRECT),
        ))
    }

    fn asset(&self, path: &str, ext: &str) -> Result<WikiResponse, WikiError> {
        let file = self.resolver.resolve(path)?;

        let minified = if self.config.render.minify {
            std::str::from_utf8(&file.contents)
                .ok()
                .and_then(|source| minify_asset(&ext.to_ascii_lowercase(), source))
        } else {
            None
        };
        let body = minified.map_or(file.contents, String::into_bytes);

        Ok(WikiResponse::ok()
            .with_header("Content-Type", mime::from_extension(Some(ext)))
            .with_header("Cache-Control", CACHE_ASSET)
            .with_body(body))
    }

    fn page(&self, path: &str) -> Result<WikiResponse, WikiError> {
        let name = PageName::new(path);
        let file = self.resolver.resolve_with_fallback(&name)?;
        let html = render_page(&self.config, &self.resolver, &name, file)?;
        Ok(WikiResponse::html(html).with_header("Cache-Control", CACHE_PAGE))
    }
}

#[cfg(test)]
mod tests;
