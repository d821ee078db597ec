//! Static file serving module
//!
//! Resolves request paths under the document root, picks a Content-Type and
//! loads the file. Every failure becomes a status code on the outcome; nothing
//! here can take the server down.

use hyper::body::Bytes;
use hyper::StatusCode;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::ServeError;
use crate::http::mime::{self, MimeOptions};
use crate::http::HeaderPolicy;
use crate::logger;

/// Immutable configuration the responder is built from
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// Canonical, absolute document root
    pub document_root: PathBuf,
    pub directory_index: bool,
    pub index_file: String,
    pub mime: MimeOptions,
    pub headers: HeaderPolicy,
}

impl ResponderConfig {
    /// Config with the default index handling, profile and no extra headers
    pub fn new(document_root: impl Into<PathBuf>) -> Self {
        let profile = crate::http::HeaderProfile::default();
        Self {
            document_root: document_root.into(),
            directory_index: true,
            index_file: "index.html".to_string(),
            mime: profile.mime_options(),
            headers: HeaderPolicy::from_profile(
                profile,
                crate::http::HeaderCategories::for_profile(profile),
            ),
        }
    }
}

/// Result of handling one request
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// File that was (or would have been) served
    pub resolved_path: Option<PathBuf>,
    pub content_type: String,
    pub status: StatusCode,
    /// File bytes; `None` for every non-200 outcome
    pub body: Option<Bytes>,
    /// Redirect target for a directory requested without its trailing slash
    pub location: Option<String>,
}

impl RequestOutcome {
    pub fn failure(error: &ServeError) -> Self {
        let resolved_path = match error {
            ServeError::NotFound(path) | ServeError::Io { path, .. } => Some(path.clone()),
            _ => None,
        };
        Self {
            resolved_path,
            content_type: "text/plain".to_string(),
            status: error.status(),
            body: None,
            location: None,
        }
    }

    fn redirect(resolved_path: PathBuf, location: String) -> Self {
        Self {
            resolved_path: Some(resolved_path),
            content_type: "text/plain".to_string(),
            status: StatusCode::MOVED_PERMANENTLY,
            body: None,
            location: Some(location),
        }
    }

    /// Size of the file body in bytes (0 when there is none)
    pub fn content_length(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

/// Percent-decode and normalize a request path into relative segments
///
/// `.` and empty segments are dropped and `..` pops the previous segment.
/// Popping past the root, or a segment carrying a backslash or NUL, is a
/// traversal attempt.
pub fn normalize_request_path(request_path: &str) -> Result<Vec<String>, ServeError> {
    let raw = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| ServeError::NotFound(PathBuf::from(raw)))?;

    let mut segments: Vec<String> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ServeError::PathTraversal(request_path.to_string()));
                }
            }
            s if s.contains(['\\', '\0']) => {
                return Err(ServeError::PathTraversal(request_path.to_string()));
            }
            s => segments.push(s.to_string()),
        }
    }
    Ok(segments)
}

/// Map a request path onto a file system path inside `document_root`
///
/// Purely lexical; symlinks are checked later against the canonical root.
pub fn resolve_path(request_path: &str, document_root: &Path) -> Result<PathBuf, ServeError> {
    let segments = normalize_request_path(request_path)?;
    let mut path = document_root.to_path_buf();
    path.extend(segments);
    Ok(path)
}

/// Stateless static file responder
#[derive(Debug, Clone)]
pub struct Responder {
    config: ResponderConfig,
}

impl Responder {
    /// Build a responder with a canonical document root
    ///
    /// Symlink containment compares canonical file paths against the root.
    pub fn new(mut config: ResponderConfig) -> Self {
        if let Ok(root) = std::fs::canonicalize(&config.document_root) {
            config.document_root = root;
        }
        Self { config }
    }

    pub const fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Handle one GET/HEAD request path
    ///
    /// 404 is logged at info, 403 at warning and 500 at error level.
    pub async fn handle(&self, request_path: &str) -> RequestOutcome {
        match self.load(request_path).await {
            Ok(outcome) => outcome,
            Err(error) => {
                match &error {
                    ServeError::NotFound(_) => {
                        logger::log_info(&format!("404 {request_path}: {error}"));
                    }
                    ServeError::PathTraversal(_) => {
                        logger::log_warning(&format!("403 {error}"));
                    }
                    _ => logger::log_error(&format!("500 {request_path}: {error}")),
                }
                RequestOutcome::failure(&error)
            }
        }
    }

    async fn load(&self, request_path: &str) -> Result<RequestOutcome, ServeError> {
        let root = &self.config.document_root;
        let mut path = resolve_path(request_path, root)?;

        let mut metadata = stat(&path).await?;
        if metadata.is_dir() {
            if let Some(location) = slash_redirect(request_path) {
                return Ok(RequestOutcome::redirect(path, location));
            }
            if !self.config.directory_index {
                return Err(ServeError::NotFound(path));
            }
            path.push(&self.config.index_file);
            metadata = stat(&path).await?;
        }
        if !metadata.is_file() {
            return Err(ServeError::NotFound(path));
        }

        // Symlinks may point anywhere; the target must stay under the root
        let canonical = fs::canonicalize(&path)
            .await
            .map_err(|_| ServeError::NotFound(path.clone()))?;
        if !canonical.starts_with(root) {
            return Err(ServeError::PathTraversal(format!(
                "{request_path} -> {}",
                canonical.display()
            )));
        }

        let data = fs::read(&canonical).await.map_err(|source| ServeError::Io {
            path: path.clone(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = mime::resolve_mime_type(&file_name, self.config.mime);

        Ok(RequestOutcome {
            resolved_path: Some(path),
            content_type,
            status: StatusCode::OK,
            body: Some(Bytes::from(data)),
            location: None,
        })
    }
}

/// `/dir?q` becomes `/dir/?q`; `None` when the path already ends in a slash
fn slash_redirect(request_path: &str) -> Option<String> {
    let split = request_path.find(['?', '#']).unwrap_or(request_path.len());
    let (path, rest) = request_path.split_at(split);
    (!path.ends_with('/')).then(|| format!("{path}/{rest}"))
}

/// Missing or unreadable entries are reported as not found
async fn stat(path: &Path) -> Result<std::fs::Metadata, ServeError> {
    fs::metadata(path)
        .await
        .map_err(|_| ServeError::NotFound(path.to_path_buf()))
}
