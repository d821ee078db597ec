//! HTTP response building module
//!
//! Builders for the statuses the server emits. Each takes the policy headers
//! composed for the current request and attaches them to the response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

/// Methods advertised in `Allow`
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

fn apply_headers(mut builder: Builder, headers: &[(&str, &str)]) -> Builder {
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder
}

/// Build 200 response carrying file bytes
///
/// `Content-Length` is always the full size; HEAD gets an empty body.
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    is_head: bool,
    headers: &[(&str, &str)],
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length);

    apply_headers(builder, headers)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a plain-text error response (403, 404, 500)
pub fn build_error_response(
    status: StatusCode,
    is_head: bool,
    headers: &[(&str, &str)],
) -> Response<Full<Bytes>> {
    let text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let content_length = text.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(text)
    };

    let builder = Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Content-Length", content_length);

    apply_headers(builder, headers)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback_response(status)
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(headers: &[(&str, &str)]) -> Response<Full<Bytes>> {
    let builder = Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain")
        .header("Allow", ALLOWED_METHODS);

    apply_headers(builder, headers)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            fallback_response(StatusCode::METHOD_NOT_ALLOWED)
        })
}

/// Build 301 response pointing a directory request at its slash form
pub fn build_redirect_response(location: &str, headers: &[(&str, &str)]) -> Response<Full<Bytes>> {
    let builder = Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header("Location", location)
        .header("Content-Length", 0);

    apply_headers(builder, headers)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            fallback_response(StatusCode::MOVED_PERMANENTLY)
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(headers: &[(&str, &str)]) -> Response<Full<Bytes>> {
    let builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", ALLOWED_METHODS);

    apply_headers(builder, headers)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            fallback_response(StatusCode::NO_CONTENT)
        })
}

fn fallback_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
