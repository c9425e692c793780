//! Wiki HTTP server.
//!
//! tiny_http accepts connections; each request runs on a rayon worker,
//! is converted into a [`WikiRequest`] and answered by [`Wiki::handle`].
//! Lock expiry timers live on a small tokio runtime owned by [`serve`].

mod auth;
mod handler;
mod lifecycle;
mod page;
mod request;
mod response;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Request, Server};

use crate::config::WikiConfig;
use handler::Wiki;
use request::{Method, WikiRequest};
use crate::core::{MAX_LOCK_TOKEN, is_shutdown, register_server};
use crate::{debug, log};

/// Serve the wiki until Ctrl+C.
pub fn serve(config: Arc<WikiConfig>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("quire-locks")
        .enable_time()
        .build()
        .context("failed to start lock timer runtime")?;

    let wiki = Wiki::new(Arc::clone(&config), runtime.handle().clone())
        .with_context(|| format!("cannot open wiki root {}", config.root.display()))?;
    let wiki = Arc::new(wiki);

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    register_server(Arc::clone(&server));

    log!("serve"; "http://{}", addr);
    debug!("serve"; "root {}", config.root.display());

    run_request_loop(&server, &wiki, config.serve.workers)?;
    drop(wiki);
    runtime.shutdown_background();
    Ok(())
}

fn run_request_loop(server: &Server, wiki: &Arc<Wiki>, workers: usize) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("quire-http-{i}"))
        .build()
        .context("failed to create thread pool")?;

    for request in server.incoming_requests() {
        let wiki = Arc::clone(wiki);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &wiki) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(mut request: Request, wiki: &Wiki) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    let wiki_request = read_request(&mut request)?;
    let response = wiki.handle(&wiki_request);
    debug!(
        "serve";
        "{} {} -> {}",
        wiki_request.method,
        wiki_request.url,
        response.status
    );
    response::send(request, response)
}

/// Copy what routing needs out of a tiny_http request.
///
/// At most one byte more than the largest lock token is read, which is
/// enough to tell an oversized token apart.
fn read_request(request: &mut Request) -> Result<WikiRequest> {
    let header = |name: &str, separator: &str| {
        let values: Vec<&str> = request
            .headers()
            .iter()
            .filter(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .collect();
        (!values.is_empty()).then(|| values.join(separator))
    };

    let mut wiki_request = WikiRequest::new(Method::parse(request.method().as_str()), request.url());
    wiki_request.cookie = header("Cookie", "; ");
    wiki_request.if_none_match = header("If-None-Match", ", ");

    if wiki_request.method == Method::Post {
        Read::take(request.as_reader(), MAX_LOCK_TOKEN as u64 + 1)
            .read_to_end(&mut wiki_request.body)
            .context("failed to read request body")?;
    }
    Ok(wiki_request)
}
