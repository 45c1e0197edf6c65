//! Error types for the Daraja client

use thiserror::Error;

use crate::api::error::DarajaApiError;

/// Daraja client error
#[derive(Debug, Error)]
pub enum Error {
    /// A required credential or URL is missing from the configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Amount is zero, negative or not a finite number
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    /// Phone number has fewer than 9 significant digits
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    /// Callback URL is malformed or points at the gateway itself
    #[error("Invalid callback URL: {0}")]
    InvalidCallbackUrl(String),

    /// Symbolic identifier name has no gateway code
    #[error("Unknown identifier type: {0}")]
    UnknownIdentifierType(String),

    /// Caller-supplied value failed validation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Public key material could not be read or parsed
    #[error("Key load error: {0}")]
    KeyLoad(String),

    /// RSA encryption of the initiator secret failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// A fresh bearer token could not be obtained
    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),

    /// HTTP transport error (includes timeouts)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned a non-2xx status with an unrecognized body
    #[error("Gateway returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Gateway returned a structured error response
    #[error("Gateway error: {0}")]
    Api(#[from] DarajaApiError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Anyhow error
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
