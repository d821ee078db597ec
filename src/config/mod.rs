// Configuration module entry point
// Loads configuration, validates it and derives the immutable responder config

mod state;
mod types;

use hyper::header::{HeaderName, HeaderValue};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use crate::error::ServeError;
use crate::handler::ResponderConfig;
use crate::http::{HeaderCategories, HeaderPolicy, MimeOptions, PathPredicate};

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, ExtraHeader, HeadersConfig, LoggingConfig, MimeConfig, ServerConfig, StartupConfig,
    DEFAULT_REQUIRED_ASSETS,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "devserve";

/// Prefix for environment overrides, e.g. `DEVSERVE_SERVER__PORT=8080`
const ENV_PREFIX: &str = "DEVSERVE";

fn builder_with_defaults(
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("server.host", "localhost")?
        .set_default("server.port", 8054)?
        .set_default("server.directory_index", true)?
        .set_default("server.index_file", "index.html")?
        .set_default("server.reuse_port", false)?
        .set_default("server.keep_alive", true)?
        .set_default("server.connection_timeout_secs", 60)?
        .set_default("server.shutdown_grace_secs", 5)?
        .set_default("headers.profile", "webgl")?
        .set_default("startup.required_assets", DEFAULT_REQUIRED_ASSETS.to_vec())?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "common")
}

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; `DEVSERVE_*` environment variables override it.
    pub fn load_from(config_path: &str) -> Result<Self, ServeError> {
        let settings = builder_with_defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load configuration from TOML text layered over the defaults
    pub fn from_toml_str(toml: &str) -> Result<Self, ServeError> {
        let settings = builder_with_defaults()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Reject values that would only fail later, at bind or request time
    pub fn validate(&self) -> Result<(), ServeError> {
        if self.server.port == 0 {
            return Err(ServeError::Config(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.server.workers == Some(0) {
            return Err(ServeError::Config(
                "server.workers must be at least 1".to_string(),
            ));
        }

        let index = &self.server.index_file;
        if index.is_empty() || index.contains(['/', '\\']) || index == ".." {
            return Err(ServeError::Config(format!(
                "server.index_file must be a plain file name, got '{index}'"
            )));
        }

        let root = self.document_root()?;
        if !root.is_dir() {
            return Err(ServeError::Config(format!(
                "document root '{}' is not a directory",
                root.display()
            )));
        }

        for extra in &self.headers.extra {
            HeaderName::from_bytes(extra.name.as_bytes()).map_err(|e| {
                ServeError::Config(format!("invalid header name '{}': {e}", extra.name))
            })?;
            HeaderValue::from_str(&extra.value).map_err(|e| {
                ServeError::Config(format!("invalid value for header '{}': {e}", extra.name))
            })?;
        }

        Ok(())
    }

    /// Configured document root, or the working directory
    pub fn document_root(&self) -> Result<PathBuf, ServeError> {
        match &self.server.document_root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().map_err(|e| {
                ServeError::Config(format!("cannot determine working directory: {e}"))
            }),
        }
    }

    /// Resolve the bind address; an empty host binds all interfaces
    ///
    /// Host names are resolved once at startup, preferring IPv4.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServeError> {
        let host = match self.server.host.trim() {
            "" => "0.0.0.0",
            h => h,
        };
        let addrs: Vec<SocketAddr> = (host, self.server.port)
            .to_socket_addrs()
            .map_err(|e| ServeError::Config(format!("cannot resolve host '{host}': {e}")))?
            .collect();

        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| ServeError::Config(format!("host '{host}' resolved to no address")))
    }

    /// Header policy from the profile, the category switches and extra headers
    pub fn header_policy(&self) -> HeaderPolicy {
        let headers = &self.headers;
        let defaults = HeaderCategories::for_profile(headers.profile);
        let categories = HeaderCategories {
            cache_suppression: headers.cache_suppression.unwrap_or(defaults.cache_suppression),
            cors: headers.cors.unwrap_or(defaults.cors),
            security: headers.security.unwrap_or(defaults.security),
        };

        headers.extra.iter().fold(
            HeaderPolicy::from_profile(headers.profile, categories),
            |policy, extra| match (&extra.path_suffix, &extra.path_prefix) {
                (Some(suffix), _) => policy.with_conditional(
                    PathPredicate::Suffix(suffix.clone()),
                    &extra.name,
                    &extra.value,
                ),
                (None, Some(prefix)) => policy.with_conditional(
                    PathPredicate::Prefix(prefix.clone()),
                    &extra.name,
                    &extra.value,
                ),
                (None, None) => policy.with_fixed(&extra.name, &extra.value),
            },
        )
    }

    pub fn mime_options(&self) -> MimeOptions {
        let defaults = self.headers.profile.mime_options();
        MimeOptions {
            system_fallback: self.mime.system_fallback.unwrap_or(defaults.system_fallback),
            javascript_charset: self
                .mime
                .javascript_charset
                .unwrap_or(defaults.javascript_charset),
        }
    }

    /// Derive the immutable responder configuration
    pub fn responder_config(&self) -> Result<ResponderConfig, ServeError> {
        let root = self.document_root()?;
        let document_root = root.canonicalize().map_err(|e| {
            ServeError::Config(format!("document root '{}': {e}", root.display()))
        })?;

        Ok(ResponderConfig {
            document_root,
            directory_index: self.server.directory_index,
            index_file: self.server.index_file.clone(),
            mime: self.mime_options(),
            headers: self.header_policy(),
        })
    }
}
