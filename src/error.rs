//! Error taxonomy
//!
//! Startup failures are fatal and end the process with exit code 1.
//! Per-request failures map to an HTTP status and never leave the connection task.

use hyper::StatusCode;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The configured port is already bound by another process
    #[error("port {port} is already in use; close the other server or pick another port")]
    PortInUse { port: u16 },

    /// Any other failure while creating the listening socket
    #[error("failed to start listener on {addr}: {source}")]
    Listener {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// Runtime, signal handler or log file setup failed
    #[error("startup failed: {0}")]
    Startup(String),

    /// Request path would resolve outside the document root
    #[error("path traversal attempt blocked: {0}")]
    PathTraversal(String),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Read failure on a file that was stat'd successfully
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ServeError {
    /// Classify a bind error, singling out address-in-use
    pub fn from_bind(addr: SocketAddr, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::AddrInUse {
            Self::PortInUse { port: addr.port() }
        } else {
            Self::Listener { addr, source }
        }
    }

    /// HTTP status for request-scoped errors
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::PathTraversal(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_classification() {
        let addr: SocketAddr = "127.0.0.1:8054".parse().unwrap();
        let err = ServeError::from_bind(
            addr,
            std::io::Error::from(std::io::ErrorKind::AddrInUse),
        );
        assert!(matches!(err, ServeError::PortInUse { port: 8054 }));
        assert!(err.to_string().contains("8054"));

        let err = ServeError::from_bind(
            addr,
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, ServeError::Listener { .. }));
    }

    #[test]
    fn test_request_error_status() {
        assert_eq!(
            ServeError::PathTraversal("/../etc/passwd".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServeError::NotFound(PathBuf::from("missing.png")).status(),
            StatusCode::NOT_FOUND
        );
        let io = ServeError::Io {
            path: PathBuf::from("a.js"),
            source: std::io::Error::other("disk gone"),
        };
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
