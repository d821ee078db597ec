// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

use crate::http::HeaderProfile;
use crate::logger::{AccessLogFormat, LogLevel};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub headers: HeadersConfig,
    #[serde(default)]
    pub mime: MimeConfig,
    pub startup: StartupConfig,
    pub logging: LoggingConfig,
}

/// Listener and document root configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind host; empty means all interfaces
    pub host: String,
    pub port: u16,
    /// Defaults to the process working directory
    #[serde(default)]
    pub document_root: Option<PathBuf>,
    /// Serve `index_file` for directory requests
    pub directory_index: bool,
    pub index_file: String,
    /// Also set `SO_REUSEPORT` (unix only); `SO_REUSEADDR` is always set
    pub reuse_port: bool,
    #[serde(default)]
    pub workers: Option<usize>,
    pub keep_alive: bool,
    /// Upper bound on a single connection's lifetime
    pub connection_timeout_secs: u64,
    /// How long shutdown waits for in-flight connections
    pub shutdown_grace_secs: u64,
}

/// Response header policy configuration
///
/// The profile picks the defaults; the optional switches override single categories.
#[derive(Debug, Deserialize, Clone)]
pub struct HeadersConfig {
    pub profile: HeaderProfile,
    #[serde(default)]
    pub cache_suppression: Option<bool>,
    #[serde(default)]
    pub cors: Option<bool>,
    #[serde(default)]
    pub security: Option<bool>,
    /// Additional headers, optionally limited to matching request paths
    #[serde(default)]
    pub extra: Vec<ExtraHeader>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ExtraHeader {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub path_suffix: Option<String>,
    #[serde(default)]
    pub path_prefix: Option<String>,
}

/// MIME resolution overrides on top of the header profile
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MimeConfig {
    #[serde(default)]
    pub system_fallback: Option<bool>,
    #[serde(default)]
    pub javascript_charset: Option<bool>,
}

/// Startup readiness check
#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    /// Paths relative to the document root; empty disables the check
    #[serde(default)]
    pub required_assets: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub access_log: bool,
    /// `common`, `combined`, `json` or a `$variable` pattern
    pub access_log_format: AccessLogFormat,
    /// Access and info lines go to stdout when unset
    #[serde(default)]
    pub access_log_file: Option<PathBuf>,
    /// Warnings and errors go to stderr when unset
    #[serde(default)]
    pub error_log_file: Option<PathBuf>,
}

/// Assets the WebGL demo page needs before it can render
pub const DEFAULT_REQUIRED_ASSETS: &[&str] = &[
    "index.html",
    "js/main.js",
    "js/components.js",
    "js/managers.js",
    "js/utils.js",
    "lib/three.min.js",
    "lib/OrbitControls.js",
    "assets/aws-logo.png",
];
