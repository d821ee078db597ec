//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, header policy,
//! dispatch to the static responder and access logging.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::http::{self, build_headers};
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
///
/// Generic over the request body, which is never read.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    // The query is kept so a trailing-slash redirect can carry it
    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| path.clone(), ToString::to_string);
    let access_entry = state
        .access_log
        .then(|| start_access_entry(&req, peer_addr));
    let headers = build_headers(&path, &state.responder.config().headers);

    let response = match method {
        Method::GET | Method::HEAD => {
            let is_head = method == Method::HEAD;
            let outcome = state.responder.handle(&target).await;
            match (outcome.body, outcome.location) {
                (Some(body), _) => {
                    http::build_file_response(body, &outcome.content_type, is_head, &headers)
                }
                (None, Some(location)) => http::build_redirect_response(&location, &headers),
                (None, None) => http::build_error_response(outcome.status, is_head, &headers),
            }
        }
        Method::OPTIONS => http::build_options_response(&headers),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            http::build_405_response(&headers)
        }
    };

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.content_type = response
            .headers()
            .get(hyper::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.access_log_format);
    }

    Ok(response)
}

/// Capture the request side of an access log line
fn start_access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Responder, ResponderConfig};
    use crate::logger::AccessLogFormat;
    use http_body_util::{BodyExt, Empty};
    use hyper::StatusCode;

    fn state_for(root: std::path::PathBuf) -> Arc<AppState> {
        Arc::new(AppState {
            responder: Responder::new(ResponderConfig::new(root)),
            access_log: false,
            access_log_format: AccessLogFormat::Common,
        })
    }

    fn request(method: Method, uri: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Empty::new())
            .unwrap()
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    fn scratch_root(name: &str) -> std::path::PathBuf {
        let root = std::env::temp_dir().join(format!("devserve-router-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("index.html"), "<html></html>").unwrap();
        root.canonicalize().unwrap()
    }

    #[tokio::test]
    async fn test_get_and_head() {
        let root = scratch_root("get-head");
        let state = state_for(root.clone());

        let response = handle_request(request(Method::GET, "/index.html?x=1"), Arc::clone(&state), peer())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/html");
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "<html></html>");

        let response = handle_request(request(Method::HEAD, "/"), state, peer())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-length"], "13");
        assert!(response.into_body().collect().await.unwrap().to_bytes().is_empty());

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_options_and_disallowed_methods() {
        let root = scratch_root("methods");
        let state = state_for(root.clone());

        let response = handle_request(request(Method::OPTIONS, "/index.html"), Arc::clone(&state), peer())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key("access-control-allow-methods"));

        let response = handle_request(request(Method::POST, "/index.html"), state, peer())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key("cache-control"));

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_error_statuses_carry_policy_headers() {
        let root = scratch_root("errors");
        let state = state_for(root.clone());

        for (uri, status) in [
            ("/missing.png", StatusCode::NOT_FOUND),
            ("/../etc/passwd", StatusCode::FORBIDDEN),
        ] {
            let response = handle_request(request(Method::GET, uri), Arc::clone(&state), peer())
                .await
                .unwrap();
            assert_eq!(response.status(), status, "{uri}");
            assert_eq!(
                response.headers()["cache-control"],
                "no-cache, no-store, must-revalidate"
            );
        }

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_read_failure_becomes_500_with_policy_headers() {
        let config = ResponderConfig::new(std::env::temp_dir());
        let outcome = crate::handler::RequestOutcome::failure(&crate::ServeError::Io {
            path: std::path::PathBuf::from("/srv/www/lib/three.min.js"),
            source: std::io::Error::other("device gone"),
        });
        let headers = build_headers("/lib/three.min.js", &config.headers);

        let response = http::build_error_response(outcome.status, false, &headers);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(
            response.headers()["cache-control"],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "500 Internal Server Error");
    }

    #[tokio::test]
    async fn test_directory_redirect_keeps_query() {
        let root = scratch_root("redirect");
        std::fs::create_dir_all(root.join("models")).unwrap();
        std::fs::write(root.join("models/index.html"), "<p>models</p>").unwrap();
        let state = state_for(root.clone());

        let response = handle_request(request(Method::GET, "/models?v=1"), Arc::clone(&state), peer())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()["location"], "/models/?v=1");

        let response = handle_request(request(Method::GET, "/models/"), state, peer())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_access_entry() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/js/main.js?v=3")
            .header("user-agent", "curl/8.0")
            .body(Empty::<Bytes>::new())
            .unwrap();
        let entry = start_access_entry(&req, peer());
        assert_eq!(entry.remote_addr, "127.0.0.1");
        assert_eq!(entry.path, "/js/main.js");
        assert_eq!(entry.query.as_deref(), Some("v=3"));
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
        assert!(entry.referer.is_none());
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(hyper::Version::HTTP_10), "1.0");
        assert_eq!(version_label(hyper::Version::HTTP_11), "1.1");
    }
}
