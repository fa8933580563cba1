//! xhs-harvest: a paced comment and search harvester for Xiaohongshu
//!
//! This crate walks cursor-paginated comment threads and keyword search
//! results on a rate-limited, signed API, flattens nested reply threads
//! under a shared budget, and merges note metadata with every collected
//! comment into flat export rows.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod signer;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for xhs-harvest operations
#[derive(Debug, Error)]
pub enum XhsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl XhsError {
    /// Returns true if the error must abort the whole job instead of ending
    /// one page sequence early
    pub fn is_hard(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_hard(),
            _ => true,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Unrecognized share link shape: {0}")]
    InvalidShape(String),

    #[error("No note identifier in URL: {0}")]
    MissingIdentifier(String),
}

/// Errors raised by one signed call to the platform
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Cookie string has no a1 session key")]
    MissingSessionKey,

    #[error("Request signer unavailable: {0}")]
    SignerUnavailable(String),

    #[error("Transport error for {uri}: {message}")]
    Transport { uri: String, message: String },

    #[error("Malformed response from {uri}: {reason}")]
    MalformedResponse { uri: String, reason: String },

    #[error("Platform rejected {uri} with code {code}: {message}")]
    Platform {
        uri: String,
        code: i64,
        message: String,
    },
}

impl GatewayError {
    /// Session and signer failures cannot be recovered by moving to another
    /// page, so they are never soft-failed.
    pub fn is_hard(&self) -> bool {
        matches!(self, Self::MissingSessionKey | Self::SignerUnavailable(_))
    }
}

/// Result type alias for xhs-harvest operations
pub type Result<T> = std::result::Result<T, XhsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Session};
pub use model::{CommentRecord, NoteDetail, NoteSummary};
pub use output::{merge, MergedRow};
pub use state::Budget;
pub use url::{canonicalize, is_alternate_form, to_canonical_form, CanonicalUrl};
