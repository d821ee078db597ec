//! Logger module
//!
//! Provides logging utilities for the dev server including:
//! - Server lifecycle logging (banner, shutdown)
//! - Access logging with multiple formats
//! - Leveled error, warning, info and debug lines
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{AccessLogEntry, AccessLogFormat};

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::config::Config;

/// Log level, ordered from least to most verbose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    const fn tag(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: LogLevel) -> bool {
    let max = writer::get().map_or(LogLevel::Info, writer::LogWriter::level);
    level <= max
}

fn stamp(level: LogLevel, message: &str) -> String {
    format!(
        "{} - {} - {message}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level.tag()
    )
}

/// Write a leveled line; errors and warnings go to the error target
fn write_line(level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    let line = stamp(level, message);
    match (writer::get(), level) {
        (Some(w), LogLevel::Error | LogLevel::Warn) => w.write_error(&line),
        (Some(w), _) => w.write_access(&line),
        (None, LogLevel::Error | LogLevel::Warn) => eprintln!("{line}"),
        (None, _) => println!("{line}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_error(message: &str) {
    write_line(LogLevel::Error, message);
}

pub fn log_warning(message: &str) {
    write_line(LogLevel::Warn, message);
}

pub fn log_info(message: &str) {
    write_line(LogLevel::Info, message);
}

pub fn log_debug(message: &str) {
    write_line(LogLevel::Debug, message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, document_root: &std::path::Path) {
    let rule = "=".repeat(60);
    log_info(&rule);
    log_info("WebGL development server");
    log_info(&rule);
    log_info(&format!("Server URL: http://{addr}/"));
    log_info(&format!("Document root: {}", document_root.display()));
    log_info(&format!("Header profile: {}", config.headers.profile.name()));
    log_info(&format!(
        "Directory index: {}",
        if config.server.directory_index {
            config.server.index_file.as_str()
        } else {
            "disabled"
        }
    ));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {}", path.display()));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {}", path.display()));
    }
    log_info(&format!(
        "SO_REUSEADDR on, SO_REUSEPORT {}",
        if config.server.reuse_port { "on" } else { "off" }
    ));
    log_info("Press Ctrl+C to stop the server");
    log_info(&rule);
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    log_debug(&format!("Connection closed with error: {err}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &AccessLogFormat) {
    write_access(&entry.render(format));
}

pub fn log_shutdown_started(in_flight: usize) {
    log_info(&format!(
        "Shutdown signal received, draining {in_flight} connection(s)"
    ));
}

pub fn log_shutdown_complete() {
    log_info("Server stopped, listening socket released");
}
