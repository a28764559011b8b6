// src/error.rs

//! Unified error handling for the catalog watcher.
//!
//! Each pipeline stage has its own error type so the change detector can
//! decide per stage whether to abort the cycle, downgrade, or log and go on.
//! `AppError` wraps all of them for the CLI and configuration layers.

use std::fmt;

use thiserror::Error;

/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure retrieving a page through the fetch gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// A single attempt failed (transport error, non-2xx status, empty body)
    #[error("attempt failed: {reason}")]
    Transient { reason: String },

    /// Every configured attempt failed; `last` is the final attempt's failure
    #[error("all {attempts} fetch attempts for {url} failed, last error: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },

    /// Target or proxy URL could not be built
    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FetchError {
    pub fn transient(reason: impl fmt::Display) -> Self {
        Self::Transient {
            reason: reason.to_string(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Catalog markup was not recognised.
///
/// Never escapes the extractor as a failure: callers downgrade it to an empty
/// entry list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("page does not contain the listing marker '{marker}'")]
    MissingMarker { marker: String },
}

/// Failure writing the known-state record.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Another process owns the state file
    #[error("state lock {} is held by another mintwatch process", path.display())]
    Locked { path: std::path::PathBuf },
}

/// Failure handing a message to the messaging channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("delivery attempt failed: {reason}")]
    Transient { reason: String },

    #[error("message not delivered after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("messaging channel is not configured: {0}")]
    NotConfigured(String),
}

impl DeliveryError {
    pub fn transient(reason: impl fmt::Display) -> Self {
        Self::Transient {
            reason: reason.to_string(),
        }
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Page retrieval failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Known state could not be saved
    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),

    /// Notification could not be delivered
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
