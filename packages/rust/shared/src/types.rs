//! Core domain types: providers, the submission payload, and outcomes.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{IndexNowError, Result};

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// An IndexNow-compatible search engine endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    /// Display name used in logs and reports.
    pub name: Cow<'static, str>,
    /// Absolute URL accepting the JSON submission.
    pub endpoint: Cow<'static, str>,
}

impl Provider {
    pub fn new(name: impl Into<Cow<'static, str>>, endpoint: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }

    const fn builtin(name: &'static str, endpoint: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            endpoint: Cow::Borrowed(endpoint),
        }
    }
}

/// Built-in providers, in dispatch order.
pub const PROVIDERS: &[Provider] = &[
    Provider::builtin("IndexNow", "https://api.indexnow.org/indexnow"),
    Provider::builtin("Microsoft Bing", "https://www.bing.com/indexnow"),
    Provider::builtin("Naver", "https://searchadvisor.naver.com/indexnow"),
    Provider::builtin("Seznam.cz", "https://search.seznam.cz/indexnow"),
    Provider::builtin("Yandex", "https://yandex.com/indexnow"),
    Provider::builtin("Yep", "https://indexnow.yep.com/indexnow"),
];

/// Look up a built-in provider by name (case-insensitive).
pub fn find_provider(name: &str) -> Option<&'static Provider> {
    PROVIDERS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// Resolve a list of provider names into built-in providers.
///
/// An empty list selects every provider. The result always follows the
/// order of [`PROVIDERS`], regardless of the order names were given in.
pub fn select_providers(names: &[String]) -> Result<Vec<Provider>> {
    if names.is_empty() {
        return Ok(PROVIDERS.to_vec());
    }

    for name in names {
        if find_provider(name).is_none() {
            let known: Vec<&str> = PROVIDERS.iter().map(|p| p.name.as_ref()).collect();
            return Err(IndexNowError::config(format!(
                "unknown provider '{name}', expected one of: {}",
                known.join(", ")
            )));
        }
    }

    Ok(PROVIDERS
        .iter()
        .filter(|p| names.iter().any(|n| p.name.eq_ignore_ascii_case(n.trim())))
        .cloned()
        .collect())
}

// ---------------------------------------------------------------------------
// IndexNowRequest
// ---------------------------------------------------------------------------

/// JSON body POSTed to every provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexNowRequest {
    /// Site host, including an explicit port if the sitemap URL had one.
    pub host: String,
    /// The verification key published at `/<key>.txt`.
    pub key: String,
    /// Page URLs to re-crawl, in discovery order.
    pub url_list: Vec<String>,
}

impl IndexNowRequest {
    pub fn new(host: impl Into<String>, key: impl Into<String>, url_list: Vec<String>) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            url_list,
        }
    }
}

/// The `host` value for a site URL: host name plus any explicit port.
pub fn site_host(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| IndexNowError::config(format!("URL has no host: {url}")))?;

    match url.port() {
        Some(port) => Ok(format!("{host}:{port}")),
        None => Ok(host.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Submission outcome
// ---------------------------------------------------------------------------

/// What a provider's HTTP status code means under the IndexNow protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// 200: URLs submitted successfully.
    Accepted,
    /// 202: URLs received, key validation pending.
    Pending,
    /// 400: the request body was malformed.
    BadRequest,
    /// 403: key not valid (file missing, or key not in the file).
    Forbidden,
    /// 422: URLs don't belong to the host, or key doesn't match the schema.
    Unprocessable,
    /// 429: too many requests (potential spam).
    TooManyRequests,
}

impl SubmissionOutcome {
    /// Classify a status code. Codes outside the protocol return `None`.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200 => Some(Self::Accepted),
            202 => Some(Self::Pending),
            400 => Some(Self::BadRequest),
            403 => Some(Self::Forbidden),
            422 => Some(Self::Unprocessable),
            429 => Some(Self::TooManyRequests),
            _ => None,
        }
    }

    /// Whether the provider took the submission.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Accepted | Self::Pending)
    }

    /// Human-readable explanation of the outcome.
    pub fn message(self) -> &'static str {
        match self {
            Self::Accepted => "URL(s) submitted successfully",
            Self::Pending => "URL(s) received, key validation pending",
            Self::BadRequest => "invalid request format",
            Self::Forbidden => "key not valid (key file not found, or key not in the file)",
            Self::Unprocessable => {
                "URL(s) don't belong to the host, or the key doesn't match the protocol schema"
            }
            Self::TooManyRequests => "too many requests (potential spam)",
        }
    }
}

impl std::fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// What to do when a provider cannot be reached at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Abort the remaining submissions on the first transport error.
    #[default]
    FailFast,
    /// Record the error for that provider and keep going.
    Continue,
}

/// Result of submitting to one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Provider display name.
    pub provider: String,
    /// Endpoint the request was sent to.
    pub endpoint: String,
    /// HTTP status, or the transport error message.
    pub result: std::result::Result<u16, String>,
}

impl SubmissionReport {
    /// The classified outcome, if the provider answered with a known status.
    pub fn outcome(&self) -> Option<SubmissionOutcome> {
        self.result
            .as_ref()
            .ok()
            .and_then(|status| SubmissionOutcome::from_status(*status))
    }
}
