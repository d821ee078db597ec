//! MIME type detection module
//!
//! Two tiers: a fixed override table checked in order, then a generic
//! extension lookup. Generic lookups misclassify `.js` and miss shader
//! sources, so the overrides always win.

use std::path::Path;

/// Fallback when nothing else matches
pub const OCTET_STREAM: &str = "application/octet-stream";

const JAVASCRIPT: &str = "application/javascript";
const JAVASCRIPT_UTF_8: &str = "application/javascript; charset=utf-8";

/// Suffix to Content-Type override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeRule {
    /// Lowercase suffix including the dot, e.g. `.js`
    pub suffix: &'static str,
    pub content_type: &'static str,
}

impl MimeRule {
    const fn new(suffix: &'static str, content_type: &'static str) -> Self {
        Self {
            suffix,
            content_type,
        }
    }
}

/// Override table, first match wins
pub static MIME_RULES: &[MimeRule] = &[
    MimeRule::new(".html", "text/html"),
    MimeRule::new(".css", "text/css"),
    MimeRule::new(".js", JAVASCRIPT),
    MimeRule::new(".mjs", JAVASCRIPT),
    MimeRule::new(".json", "application/json"),
    MimeRule::new(".wasm", "application/wasm"),
    MimeRule::new(".glsl", "text/plain"),
    MimeRule::new(".vert", "text/plain"),
    MimeRule::new(".frag", "text/plain"),
    MimeRule::new(".png", "image/png"),
    MimeRule::new(".jpg", "image/jpeg"),
    MimeRule::new(".jpeg", "image/jpeg"),
    MimeRule::new(".woff", "font/woff2"),
    MimeRule::new(".woff2", "font/woff2"),
    MimeRule::new(".ttf", "font/ttf"),
];

/// MIME resolution switches derived from the header profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeOptions {
    /// Consult `mime_guess` when no override matches
    pub system_fallback: bool,
    /// Advertise `charset=utf-8` on JavaScript
    pub javascript_charset: bool,
}

impl Default for MimeOptions {
    fn default() -> Self {
        Self {
            system_fallback: true,
            javascript_charset: false,
        }
    }
}

/// Look up the override table only
pub fn lookup_override(path: &str) -> Option<&'static MimeRule> {
    let lower = path.to_ascii_lowercase();
    MIME_RULES.iter().find(|rule| lower.ends_with(rule.suffix))
}

/// Resolve the Content-Type for a file path
///
/// # Examples
/// ```
/// use devserve::http::mime::{resolve_mime_type, MimeOptions};
/// let opts = MimeOptions::default();
/// assert_eq!(resolve_mime_type("shaders/sky.FRAG", opts), "text/plain");
/// assert_eq!(resolve_mime_type("bundle.bin.unknownext", opts), "application/octet-stream");
/// ```
pub fn resolve_mime_type(path: &str, options: MimeOptions) -> String {
    if let Some(rule) = lookup_override(path) {
        if options.javascript_charset && rule.content_type == JAVASCRIPT {
            return JAVASCRIPT_UTF_8.to_string();
        }
        return rule.content_type.to_string();
    }

    if options.system_fallback {
        let lower = path.to_ascii_lowercase();
        if let Some(guess) = mime_guess::from_path(Path::new(&lower)).first_raw() {
            return guess.to_string();
        }
    }

    OCTET_STREAM.to_string()
}
