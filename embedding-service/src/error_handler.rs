//! Unified error handling for `embedding-service`.
//!
//! This module exposes a single top-level error type [`EmbeddingServiceError`]
//! for the whole library, and groups domain-specific errors in nested enums
//! ([`ConfigError`], [`HealthError`], [`HttpError`]). Small helpers for
//! reading/validating configuration values are provided as well.
//!
//! All messages include the prefix `[Embedding Service]` to simplify attribution in logs.

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, EmbeddingServiceError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `embedding-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmbeddingServiceError {
    /// Configuration/validation errors (startup/initialization).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Health-check/connectivity errors raised while preparing a provider.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Upstream returned a non-successful HTTP status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[Embedding Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Response payload could not be decoded as expected.
    #[error("[Embedding Service] decode error: {0}")]
    Decode(String),

    /// The provider returned a different number of vectors than inputs sent.
    #[error("[Embedding Service] sent {sent} inputs but received {received} vectors")]
    LengthMismatch { sent: usize, received: usize },

    /// No access token could be obtained for the provider.
    #[error("[Embedding Service] authentication failed: {0}")]
    Auth(String),
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors that realistically happen at config load/validation time.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required value is missing or empty.
    #[error("[Embedding Service] missing required setting: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (timeouts, ports).
    #[error("[Embedding Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `EMBEDDING_PROVIDER`.
    #[error("[Embedding Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[Embedding Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// Model name was empty.
    #[error("[Embedding Service] model name must not be empty")]
    EmptyModel,

    /// The config was handed to a client for a different provider.
    #[error("[Embedding Service] invalid provider: expected {expected}")]
    InvalidProvider { expected: &'static str },
}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors from provider readiness checks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    /// The endpoint is empty or does not start with http/https.
    #[error("[Embedding Service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Probe reached the provider, but the provider reported a problem.
    #[error("[Embedding Service] provider not ready: {0}")]
    NotReady(String),

    /// Probe returned a non-successful HTTP status.
    #[error(transparent)]
    HttpStatus(HttpError),
}

/// Non-successful HTTP response with a short body snippet.
#[derive(Debug, Error)]
#[error("[Embedding Service] HTTP {status} from {url}: {snippet}")]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    pub snippet: String,
}

/// Trims a response body to a short single-line snippet for logs and errors.
pub fn make_snippet(body: &str) -> String {
    body.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(240)
        .collect()
}

/* ------------------------------------------------------------------------- */
/* Lookup helpers                                                            */
/* ------------------------------------------------------------------------- */

/// Fetches an optional value, treating blank strings as unset.
pub fn opt_var<F>(get: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an optional `u64` (`Ok(None)` if unset/empty).
pub fn opt_u64<F>(get: &F, name: &'static str) -> std::result::Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match opt_var(get, name) {
        Some(v) => v.parse::<u64>().map(Some).map_err(|_| ConfigError::InvalidNumber {
            var: name,
            reason: "expected u64",
        }),
        None => Ok(None),
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(
    var: &'static str,
    value: &str,
) -> std::result::Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        })
    }
}
