//! Unified error types for crypto-charts
//!
//! Every fallible operation returns [`ChartsResult`]. The page pipeline
//! converts these into user-visible messages, so `Display` is what the
//! dashboard shows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all crypto-charts operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ChartsError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, msg)
    }

    pub fn listing_fetch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ListingFetch, msg)
    }

    /// Non-success HTTP response. The raw body is kept as details.
    pub fn api_request(status: u16, body: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiRequest, format!("API request failed with status {}", status))
            .with_details(body)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Network, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Parse, msg)
    }

    pub fn series_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SeriesMismatch, msg)
    }

    pub fn unordered_series(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnorderedSeries, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    /// Re-tag a data error raised while listing instruments.
    ///
    /// Listing failures halt the dashboard, so they get their own code
    /// regardless of what went wrong underneath.
    pub fn into_listing_error(self) -> Self {
        if self.code == ErrorCode::ListingFetch || self.code == ErrorCode::Configuration {
            return self;
        }
        let mut err = Self::listing_fetch(format!("Error fetching instrument list: {}", self.message));
        err.details = self.details;
        err
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.code, ErrorCode::Configuration | ErrorCode::ListingFetch)
    }
}

impl fmt::Display for ChartsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ChartsError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Startup
    Configuration,

    // Fetch errors
    ListingFetch,
    ApiRequest,
    Network,
    Timeout,

    // Payload errors
    Parse,
    Json,
    SeriesMismatch,
    UnorderedSeries,

    // Internal
    InvalidInput,
    Internal,
}

/// Result type alias for crypto-charts operations
pub type ChartsResult<T> = Result<T, ChartsError>;

// Conversions from common error types

impl From<serde_json::Error> for ChartsError {
    fn from(e: serde_json::Error) -> Self {
        ChartsError::new(ErrorCode::Json, e.to_string())
    }
}

impl From<std::io::Error> for ChartsError {
    fn from(e: std::io::Error) -> Self {
        ChartsError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<url::ParseError> for ChartsError {
    fn from(e: url::ParseError) -> Self {
        ChartsError::new(ErrorCode::Configuration, format!("Invalid URL: {}", e))
    }
}

impl From<reqwest::Error> for ChartsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChartsError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            ChartsError::new(ErrorCode::Network, "Connection failed")
        } else if e.is_decode() {
            ChartsError::new(ErrorCode::Parse, format!("Failed to decode response: {}", e))
        } else {
            ChartsError::new(ErrorCode::Network, e.to_string())
        }
    }
}
