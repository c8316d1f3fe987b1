//! Error types for every stage of a notification run.
//!
//! Each pipeline stage has its own error enum so callers can tell fatal
//! failures (authentication, an empty sitemap) apart from the per-URL
//! failures that only affect a single task.

use reqwest::StatusCode;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for whole-run operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for a run. Any of these aborts the run with exit code 1.
#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    /// The sitemap yielded no URLs at all.
    #[error("no URLs found in the sitemap: {sitemap_url}")]
    NoUrls { sitemap_url: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// An invalid header value was supplied (e.g. user agent, basic auth).
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Failures while turning a service-account secret into a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither a key file nor inline key material was supplied.
    #[error("no service-account secret supplied (use --key-file or --key-json)")]
    MissingSecret,

    #[error("failed to read service-account key {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The secret is not a usable service-account key.
    #[error("invalid service-account key: {0}")]
    InvalidSecret(String),

    /// The private key could not be loaded or the assertion could not be signed.
    #[error("failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("identity provider unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The identity provider answered with a non-2xx status.
    #[error("identity provider rejected the token request ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    /// The identity provider answered 2xx but the token cannot be used.
    #[error("unusable token response: {0}")]
    InvalidResponse(String),
}

/// Failures while reading a sitemap.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// Network failure or non-2xx status while fetching a sitemap document.
    #[error("failed to fetch sitemap: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The XML reader rejected the document.
    #[error("failed to parse sitemap XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document is not well-formed XML in a way the reader does not report itself.
    #[error("malformed sitemap XML: {0}")]
    Malformed(String),
}

impl SitemapError {
    /// True for errors caused by the document contents rather than the transport.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, SitemapError::Xml(_) | SitemapError::Malformed(_))
    }
}

/// Failure of a single notification. Never aborts sibling tasks.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The indexing endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The worker task itself did not finish (panicked or was cancelled).
    #[error("worker task failed: {0}")]
    Task(String),
}

/// Coarse classification of a failed notification, for logs and the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Network,
    Http,
    Task,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            FailureCategory::Network => "network",
            FailureCategory::Http => "http",
            FailureCategory::Task => "task",
        };
        f.write_str(label)
    }
}

impl NotificationError {
    pub fn category(&self) -> FailureCategory {
        match self {
            NotificationError::Network(_) => FailureCategory::Network,
            NotificationError::Status { .. } => FailureCategory::Http,
            NotificationError::Task(_) => FailureCategory::Task,
        }
    }
}
