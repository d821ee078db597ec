// Application state module
// Immutable per-process state shared by every connection

use super::types::Config;
use crate::error::ServeError;
use crate::handler::Responder;
use crate::logger::AccessLogFormat;

/// Application state
pub struct AppState {
    pub responder: Responder,
    /// Emit one access-log line per request
    pub access_log: bool,
    pub access_log_format: AccessLogFormat,
}

impl AppState {
    /// Build the state from a validated configuration
    pub fn new(config: &Config) -> Result<Self, ServeError> {
        Ok(Self {
            responder: Responder::new(config.responder_config()?),
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
        })
    }
}
