//! Static file server for local development of a WebGL demo page
//!
//! Serves files from a document root over plain HTTP/1.1 with no-cache, CORS
//! and optional security headers, and WebGL-friendly MIME types.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod startup;

pub use error::ServeError;
