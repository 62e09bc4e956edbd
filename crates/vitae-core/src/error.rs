//! Error type for a single remote fetch

use std::fmt;

/// Failure of one request against a remote API.
///
/// Adapters return this; the orchestrators decide whether it is fatal
/// (almost never) or just means "this source contributed nothing".
#[derive(Debug)]
pub enum FetchError {
    /// HTTP or transport error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Body arrived but could not be decoded into the expected shape
    Decode(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Decode(e.to_string());
        }
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            _ => None,
        }
    }

    /// Rate limits, server errors and transport failures are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, None | Some(429) | Some(500..=599)),
            Self::Decode(_) => false,
        }
    }

    /// 404 from a lookup endpoint: the record simply does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
