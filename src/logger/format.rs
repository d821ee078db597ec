//! Access log line rendering
//!
//! `common` and `combined` follow the Apache/Nginx layouts, `json` emits one
//! object per line, and anything else is a pattern with `$variable` tokens.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Access log layout, parsed once from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AccessLogFormat {
    #[default]
    Common,
    Combined,
    Json,
    Pattern(String),
}

impl From<String> for AccessLogFormat {
    fn from(name: String) -> Self {
        match name.as_str() {
            "common" => Self::Common,
            "combined" => Self::Combined,
            "json" => Self::Json,
            _ => Self::Pattern(name),
        }
    }
}

impl From<&str> for AccessLogFormat {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

/// One served request
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub time: DateTime<Local>,
    pub method: String,
    /// Path without the query string
    pub path: String,
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    /// Content-Type of the response, if it had one
    pub content_type: Option<String>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

fn serialize_rfc3339<S>(time: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&time.to_rfc3339())
}

impl AccessLogEntry {
    /// Entry stamped with the current time; response fields are filled in later
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 0,
            body_bytes: 0,
            content_type: None,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    pub fn render(&self, format: &AccessLogFormat) -> String {
        match format {
            AccessLogFormat::Common => self.common(),
            AccessLogFormat::Combined => format!(
                "{} \"{}\" \"{}\"",
                self.common(),
                dash(self.referer.as_deref()),
                dash(self.user_agent.as_deref()),
            ),
            AccessLogFormat::Json => serde_json::to_string(self)
                .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
            AccessLogFormat::Pattern(pattern) => self.expand(pattern),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.request_uri(), self.http_version)
    }

    fn common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// Value of a pattern variable, `None` for unknown names
    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "remote_addr" => self.remote_addr.clone(),
            "time_local" => self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request" => self.request_line(),
            "request_method" => self.method.clone(),
            "request_uri" => self.request_uri(),
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "content_type" => dash(self.content_type.as_deref()).to_string(),
            "http_referer" => dash(self.referer.as_deref()).to_string(),
            "http_user_agent" => dash(self.user_agent.as_deref()).to_string(),
            "request_time" => {
                #[allow(clippy::cast_precision_loss)]
                let secs = self.request_time_us as f64 / 1_000_000.0;
                format!("{secs:.3}")
            }
            _ => return None,
        };
        Some(value)
    }

    /// Replace `$name` tokens; unknown tokens are copied through unchanged
    fn expand(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 32);
        let mut rest = pattern;

        while let Some(at) = rest.find('$') {
            out.push_str(&rest[..at]);
            let after = &rest[at + 1..];
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..len];
            match self.variable(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[len..];
        }
        out.push_str(rest);
        out
    }
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "127.0.0.1".to_string(),
            "GET".to_string(),
            "/js/main.js".to_string(),
        );
        entry.query = Some("v=2".to_string());
        entry.status = 200;
        entry.body_bytes = 4096;
        entry.content_type = Some("application/javascript".to_string());
        entry.referer = Some("http://localhost:8054/".to_string());
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.request_time_us = 12_000;
        entry
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!(AccessLogFormat::from("common"), AccessLogFormat::Common);
        assert_eq!(AccessLogFormat::from("combined"), AccessLogFormat::Combined);
        assert_eq!(AccessLogFormat::from("json"), AccessLogFormat::Json);
        assert_eq!(
            AccessLogFormat::from("$status"),
            AccessLogFormat::Pattern("$status".to_string())
        );
    }

    #[test]
    fn test_common_and_combined() {
        let entry = sample_entry();
        let common = entry.render(&AccessLogFormat::Common);
        assert!(common.starts_with("127.0.0.1 - - ["));
        assert!(common.ends_with("\"GET /js/main.js?v=2 HTTP/1.1\" 200 4096"));

        let combined = entry.render(&AccessLogFormat::Combined);
        assert!(combined.starts_with(&common));
        assert!(combined.ends_with("\"http://localhost:8054/\" \"Mozilla/5.0\""));
    }

    #[test]
    fn test_json() {
        let line = sample_entry().render(&AccessLogFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["remote_addr"], "127.0.0.1");
        assert_eq!(value["status"], 200);
        assert_eq!(value["body_bytes"], 4096);
        assert_eq!(value["query"], "v=2");
        assert_eq!(value["content_type"], "application/javascript");
        assert!(value["time"].is_string());
    }

    #[test]
    fn test_pattern() {
        let entry = sample_entry();
        let format = AccessLogFormat::from("$request_method $request_uri -> $status ($request_time s)");
        assert_eq!(entry.render(&format), "GET /js/main.js?v=2 -> 200 (0.012 s)");

        let format = AccessLogFormat::from("$request [$content_type]");
        assert_eq!(
            entry.render(&format),
            "GET /js/main.js?v=2 HTTP/1.1 [application/javascript]"
        );

        let format = AccessLogFormat::from("$nope $ $status");
        assert_eq!(entry.render(&format), "$nope $ 200");
    }
}
