//! Response header policy
//!
//! Every response carries the policy's fixed headers. Conditional headers are
//! added only when their predicate matches the request path.

use serde::{Deserialize, Serialize};

use super::mime::MimeOptions;

/// Named header/MIME presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderProfile {
    /// No-cache and CORS, override table only
    Basic,
    /// No-cache, CORS with allow-headers, generic MIME fallback
    #[default]
    Webgl,
    /// Webgl plus security headers and `charset=utf-8` on JavaScript
    Hardened,
}

impl HeaderProfile {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Webgl => "webgl",
            Self::Hardened => "hardened",
        }
    }

    pub const fn mime_options(self) -> MimeOptions {
        match self {
            Self::Basic => MimeOptions {
                system_fallback: false,
                javascript_charset: false,
            },
            Self::Webgl => MimeOptions {
                system_fallback: true,
                javascript_charset: false,
            },
            Self::Hardened => MimeOptions {
                system_fallback: true,
                javascript_charset: true,
            },
        }
    }

    const fn cors_methods(self) -> &'static str {
        match self {
            Self::Basic | Self::Webgl => "GET, POST, OPTIONS",
            Self::Hardened => "GET, HEAD, OPTIONS",
        }
    }

    const fn cors_allow_headers(self) -> Option<&'static str> {
        match self {
            Self::Basic => None,
            Self::Webgl | Self::Hardened => Some("Content-Type"),
        }
    }
}

/// Which header categories are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderCategories {
    pub cache_suppression: bool,
    pub cors: bool,
    pub security: bool,
}

impl HeaderCategories {
    pub const fn for_profile(profile: HeaderProfile) -> Self {
        Self {
            cache_suppression: true,
            cors: true,
            security: matches!(profile, HeaderProfile::Hardened),
        }
    }
}

/// Request path predicate for conditional headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPredicate {
    /// Case-insensitive suffix match, e.g. `.wasm`
    Suffix(String),
    Prefix(String),
}

impl PathPredicate {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Suffix(suffix) => path
                .to_ascii_lowercase()
                .ends_with(&suffix.to_ascii_lowercase()),
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalHeader {
    pub predicate: PathPredicate,
    pub name: String,
    pub value: String,
}

/// Immutable response header policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderPolicy {
    pub fixed: Vec<(String, String)>,
    pub conditional: Vec<ConditionalHeader>,
}

impl HeaderPolicy {
    /// Build the fixed header list for a profile and category selection
    pub fn from_profile(profile: HeaderProfile, categories: HeaderCategories) -> Self {
        let mut fixed: Vec<(String, String)> = Vec::new();
        let mut push = |name: &str, value: &str| fixed.push((name.to_string(), value.to_string()));

        if categories.cache_suppression {
            push("Cache-Control", "no-cache, no-store, must-revalidate");
            push("Pragma", "no-cache");
            push("Expires", "0");
        }

        if categories.cors {
            push("Access-Control-Allow-Origin", "*");
            push("Access-Control-Allow-Methods", profile.cors_methods());
            if let Some(allowed) = profile.cors_allow_headers() {
                push("Access-Control-Allow-Headers", allowed);
            }
        }

        if categories.security {
            push("X-Content-Type-Options", "nosniff");
            push("X-Frame-Options", "DENY");
            push("Cross-Origin-Opener-Policy", "same-origin");
            push("Cross-Origin-Embedder-Policy", "require-corp");
        }

        Self {
            fixed,
            conditional: Vec::new(),
        }
    }

    /// Append an always-emitted header
    #[must_use]
    pub fn with_fixed(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fixed.push((name.into(), value.into()));
        self
    }

    /// Append a header emitted only when `predicate` matches
    #[must_use]
    pub fn with_conditional(
        mut self,
        predicate: PathPredicate,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.conditional.push(ConditionalHeader {
            predicate,
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Compose the policy headers for one response
///
/// Fixed headers come first in declaration order, then matching conditional ones.
pub fn build_headers<'a>(request_path: &str, policy: &'a HeaderPolicy) -> Vec<(&'a str, &'a str)> {
    policy
        .fixed
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .chain(
            policy
                .conditional
                .iter()
                .filter(|header| header.predicate.matches(request_path))
                .map(|header| (header.name.as_str(), header.value.as_str())),
        )
        .collect()
}
