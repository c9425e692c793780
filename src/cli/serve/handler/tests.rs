use std::fs;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::sleep;

use super::*;
use crate::utils::mime::types::{CSS, HTML};

fn setup(files: &[(&str, &str)]) -> (TempDir, Wiki) {
    setup_with(files, |_| {})
}

fn setup_with(files: &[(&str, &str)], configure: impl FnOnce(&mut WikiConfig)) -> (TempDir, Wiki) {
    let temp = TempDir::new().unwrap();
    for (name, content) in files {
        let path = temp.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    let mut config = WikiConfig {
        root: temp.path().canonicalize().unwrap(),
        ..WikiConfig::default()
    };
    config.render.minify = false;
    configure(&mut config);

    let wiki = Wiki::new(Arc::new(config), Handle::current()).unwrap();
    (temp, wiki)
}

fn get(wiki: &Wiki, url: &str) -> WikiResponse {
    wiki.handle(&WikiRequest::new(Method::Get, url))
}

fn post(wiki: &Wiki, url: &str, body: &str) -> WikiResponse {
    wiki.handle(&WikiRequest::new(Method::Post, url).with_body(body))
}

fn body(response: &WikiResponse) -> &str {
    std::str::from_utf8(&response.body).unwrap()
}

#[tokio::test]
async fn test_page() {
    let (_temp, wiki) = setup(&[("notes/todo.md", "# Todo\n\n[home](/)")]);
    let response = get(&wiki, "/notes/todo");

    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some(HTML));
    assert_eq!(response.header("Cache-Control"), Some(CACHE_PAGE));
    assert_eq!(response.header("Vary"), Some("Cookie"));
    assert!(response.header("ETag").is_some());
    assert!(body(&response).contains("<h1>Todo</h1>"));
    assert!(body(&response).contains("<title>wiki: notes/todo</title>"));
}

#[tokio::test]
async fn test_directory_index() {
    let (_temp, wiki) = setup(&[("index.md", "root"), ("notes/index.html", "<p>notes</p>")]);
    assert!(body(&get(&wiki, "/")).contains("<p>root</p>"));
    assert!(body(&get(&wiki, "/notes/")).contains("<p>notes</p>"));
}

#[tokio::test]
async fn test_query_string_is_ignored() {
    let (_temp, wiki) = setup(&[("my page.md", "spaced")]);
    let response = get(&wiki, "/my%20page?edit=1");
    assert_eq!(response.status, 200);
    assert!(body(&response).contains("spaced"));
}

#[tokio::test]
async fn test_etag_not_modified() {
    let (_temp, wiki) = setup(&[("index.md", "home")]);
    let first = get(&wiki, "/");
    let etag = first.header("ETag").unwrap();

    let second = wiki.handle(&WikiRequest::new(Method::Get, "/").with_if_none_match(etag));
    assert_eq!(second.status, 304);
    assert!(second.body.is_empty());
}

#[tokio::test]
async fn test_missing_page() {
    let (_temp, wiki) = setup(&[]);
    let response = get(&wiki, "/missing");
    assert_eq!(response.status, 404);
    assert_eq!(body(&response), "not found");
    assert_eq!(response.header("ETag"), None);
}

#[tokio::test]
async fn test_traversal_looks_like_not_found() {
    let (_temp, wiki) = setup(&[("index.md", "")]);
    for url in ["/../etc/passwd", "/notes/%2e%2e/%2e%2e/etc/passwd", "/..%2fsecret"] {
        let response = get(&wiki, url);
        assert_eq!(response.status, 404, "{url}");
        assert_eq!(body(&response), "not found", "{url}");
    }
}

#[tokio::test]
async fn test_hidden_files_are_not_served() {
    let (_temp, wiki) = setup(&[(".header", "<nav></nav>"), (".auth", "s"), ("notes/.draft.md", "")]);
    let cookie = "quire=s";
    for url in ["/.header", "/.auth", "/notes/.draft"] {
        let response = wiki.handle(&WikiRequest::new(Method::Get, url).with_cookie(cookie));
        assert_eq!(response.status, 404, "{url}");
    }
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (_temp, wiki) = setup(&[("index.md", "")]);
    let response = wiki.handle(&WikiRequest::new(Method::parse("PUT"), "/"));
    assert_eq!(response.status, 405);
    assert_eq!(response.header("Allow"), Some("GET, POST"));

    assert_eq!(post(&wiki, "/", "").status, 200);
}

#[tokio::test]
async fn test_directory_without_slash_redirects() {
    let (_temp, wiki) = setup(&[("notes/index.md", "")]);
    let response = get(&wiki, "/notes");
    assert_eq!(response.status, 303);
    assert_eq!(response.header("Location"), Some("/notes/"));
    assert_eq!(response.header("Cache-Control"), Some(CACHE_REDIRECT));
}

#[tokio::test]
async fn test_file_with_slash_redirects() {
    let (_temp, wiki) = setup(&[("style.css", "a{}")]);
    let response = get(&wiki, "/style.css/");
    assert_eq!(response.status, 303);
    assert_eq!(response.header("Location"), Some("/style.css"));
}

#[tokio::test]
async fn test_redirect_stays_on_site() {
    let (_temp, wiki) = setup(&[("evil.com", "x"), ("notes/index.md", "")]);

    let response = get(&wiki, "//evil.com/");
    assert_eq!(response.status, 303);
    assert_eq!(response.header("Location"), Some("/evil.com"));

    let response = get(&wiki, "///notes");
    assert_eq!(response.header("Location"), Some("/notes/"));
}

#[tokio::test]
async fn test_static_asset() {
    let (_temp, wiki) = setup(&[("style.css", "body {\n  color: red;\n}\n"), ("logo.png", "png")]);

    let response = get(&wiki, "/style.css");
    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some(CSS));
    assert_eq!(response.header("Cache-Control"), Some(CACHE_ASSET));
    assert_eq!(body(&response), "body {\n  color: red;\n}\n");

    let response = get(&wiki, "/logo.png");
    assert_eq!(response.header("Content-Type"), Some("image/png"));
    assert_eq!(response.body, b"png");
}

#[tokio::test]
async fn test_static_asset_minified() {
    let (_temp, wiki) = setup_with(&[("style.css", "body {\n  color: red;\n}\n")], |config| {
        config.render.minify = true;
    });
    let response = get(&wiki, "/style.css");
    assert!(!body(&response).contains('\n'));
    assert!(body(&response).contains("color:red"));
}

#[tokio::test]
async fn test_unminifiable_asset_served_raw() {
    let source = "function ( {";
    let (_temp, wiki) = setup_with(&[("broken.js", source)], |config| {
        config.render.minify = true;
    });
    let response = get(&wiki, "/broken.js");
    assert_eq!(response.status, 200);
    assert_eq!(body(&response), source);
}

#[tokio::test]
async fn test_auth_route_sets_cookie() {
    let (_temp, wiki) = setup(&[]);
    let response = get(&wiki, "/.auth/s3cret");
    assert_eq!(response.status, 303);
    assert_eq!(response.header("Location"), Some("/"));
    let cookie = response.header("Set-Cookie").unwrap();
    assert!(cookie.starts_with("quire=s3cret;"));
    assert!(cookie.contains("HttpOnly"));

    let response = post(&wiki, "/.auth/s3cret", "");
    assert_eq!(response.status, 405);
    assert_eq!(response.header("Allow"), Some("GET"));
}

#[tokio::test]
async fn test_auth_required() {
    let (_temp, wiki) = setup(&[(".auth", "s3cret\n"), ("index.md", "home")]);

    let response = get(&wiki, "/");
    assert_eq!(response.status, 403);
    assert_eq!(body(&response), "no");
    assert_eq!(response.header("Vary"), Some("Cookie"));

    let wrong = wiki.handle(&WikiRequest::new(Method::Get, "/").with_cookie("quire=guess"));
    assert_eq!(wrong.status, 403);

    let right = wiki.handle(&WikiRequest::new(Method::Get, "/").with_cookie("theme=x; quire=s3cret"));
    assert_eq!(right.status, 200);
}

#[tokio::test]
async fn test_auth_cookie_round_trip() {
    let (_temp, wiki) = setup(&[(".auth", "two words"), ("index.md", "home")]);

    let login = get(&wiki, "/.auth/two%20words");
    let set_cookie = login.header("Set-Cookie").unwrap();
    let pair = set_cookie.split(';').next().unwrap();

    let response = wiki.handle(&WikiRequest::new(Method::Get, "/").with_cookie(pair));
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_lock_requires_auth() {
    let (_temp, wiki) = setup(&[(".auth", "s3cret"), ("page.md", "")]);
    assert_eq!(post(&wiki, "/page/.lock", "A").status, 403);
}

#[tokio::test]
async fn test_lock_lifecycle() {
    let (_temp, wiki) = setup(&[("page.md", "")]);

    assert_eq!(post(&wiki, "/page/.lock", "A").status, 200);
    assert_eq!(post(&wiki, "/page/.lock", "A").status, 200);

    let conflict = post(&wiki, "/page/.lock", "B");
    assert_eq!(conflict.status, 409);
    assert_eq!(wiki.locks.holder(&PageName::new("page")).unwrap().as_bytes(), b"A");

    assert_eq!(post(&wiki, "/page/.unlock", "B").status, 409);
    assert_eq!(post(&wiki, "/page/.unlock", "A").status, 200);
    assert_eq!(post(&wiki, "/page/.lock", "B").status, 200);
}

#[tokio::test]
async fn test_lock_bad_requests() {
    let (_temp, wiki) = setup(&[("page.md", "")]);

    assert_eq!(post(&wiki, "/page/.lock", "").status, 400);
    assert_eq!(post(&wiki, "/page/.lock", &"x".repeat(MAX_LOCK_TOKEN + 1)).status, 400);
    assert_eq!(post(&wiki, "/page/.lock", &"x".repeat(MAX_LOCK_TOKEN)).status, 200);
    assert_eq!(post(&wiki, "/missing/.lock", "A").status, 404);
    assert_eq!(post(&wiki, "/../page/.lock", "A").status, 404);

    let response = get(&wiki, "/page/.lock");
    assert_eq!(response.status, 405);
    assert_eq!(response.header("Allow"), Some("POST"));

    let response = get(&wiki, "/page/.unlock");
    assert_eq!(response.header("Allow"), Some("POST"));
}

#[tokio::test]
async fn test_lock_directory_page() {
    let (_temp, wiki) = setup(&[("notes/index.md", "")]);
    assert_eq!(post(&wiki, "/notes/.lock", "A").status, 200);
    assert!(wiki.locks.is_locked(&PageName::new("notes")));
    assert_eq!(post(&wiki, "/.lock", "A").status, 404);
}

#[tokio::test(start_paused = true)]
async fn test_lock_expires() {
    let (_temp, wiki) = setup(&[("page.md", "")]);

    assert_eq!(post(&wiki, "/page/.lock", "A").status, 200);
    sleep(Duration::from_secs(30)).await;
    assert_eq!(post(&wiki, "/page/.lock", "B").status, 409);

    sleep(Duration::from_secs(31)).await;
    assert_eq!(post(&wiki, "/page/.lock", "B").status, 200);
}
