use std::time::Duration;

use thiserror::Error;

/// Coarse classification used by the retry executor and by callers that need
/// to decide whether a failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeouts, connection resets, 5xx responses
    TransientNetwork,
    /// Upstream asked us to slow down (HTTP 429)
    RateLimit,
    /// Invalid identifier, 404, nothing to resolve
    PermanentNotFound,
    /// Browser launch/navigation/close failures
    SessionResource,
    /// Cache file could not be read or written
    Persistence,
    /// Malformed input or configuration
    Invalid,
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited by upstream (HTTP {0})")]
    RateLimited(u16),

    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Login wall still present after clearing cookies")]
    LoginWall,

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid channel identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to resolve channel {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: Box<MonitorError>,
    },

    #[error("Failed to fetch feed {target}: {source}")]
    FeedFetch {
        target: String,
        #[source]
        source: Box<MonitorError>,
    },

    #[error("Failed to scrape {target}: {source}")]
    Scrape {
        target: String,
        #[source]
        source: Box<MonitorError>,
    },
}

impl MonitorError {
    pub fn resolve(target: impl Into<String>, source: MonitorError) -> Self {
        Self::Resolve {
            target: target.into(),
            source: Box::new(source),
        }
    }

    pub fn feed_fetch(target: impl Into<String>, source: MonitorError) -> Self {
        Self::FeedFetch {
            target: target.into(),
            source: Box::new(source),
        }
    }

    pub fn scrape(target: impl Into<String>, source: MonitorError) -> Self {
        Self::Scrape {
            target: target.into(),
            source: Box::new(source),
        }
    }

    /// Map an HTTP status onto the failure taxonomy.
    pub fn from_status(status: u16, target: &str) -> Self {
        match status {
            429 => Self::RateLimited(status),
            404 | 410 => Self::NotFound(target.to_string()),
            _ => Self::Status(status),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(e) => match e.status().map(|s| s.as_u16()) {
                Some(429) => ErrorKind::RateLimit,
                Some(404) | Some(410) => ErrorKind::PermanentNotFound,
                Some(s) if (400..500).contains(&s) => ErrorKind::Invalid,
                _ => ErrorKind::TransientNetwork,
            },
            Self::Timeout(_) => ErrorKind::TransientNetwork,
            Self::RateLimited(_) => ErrorKind::RateLimit,
            Self::Status(s) if *s >= 500 => ErrorKind::TransientNetwork,
            Self::Status(_) => ErrorKind::Invalid,
            Self::NotFound(_) | Self::InvalidIdentifier(_) => ErrorKind::PermanentNotFound,
            Self::Session(_) | Self::LoginWall => ErrorKind::SessionResource,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Persistence,
            Self::FeedParse(_)
            | Self::InvalidUrl(_)
            | Self::Config(_)
            | Self::InvalidInput(_) => ErrorKind::Invalid,
            Self::Resolve { source, .. }
            | Self::FeedFetch { source, .. }
            | Self::Scrape { source, .. } => source.kind(),
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransientNetwork | ErrorKind::RateLimit | ErrorKind::SessionResource
        )
    }

    pub fn is_rate_limit(&self) -> bool {
        self.kind() == ErrorKind::RateLimit
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Http(e) => e.is_timeout(),
            Self::Resolve { source, .. }
            | Self::FeedFetch { source, .. }
            | Self::Scrape { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
