//! Error types for the Tyr client.
//!
//! # Design
//! Only local failures are errors: bad configuration, misuse of a scoped
//! operation, transport failures and (de)serialization problems. A 4xx/5xx
//! answer from Tyr is not an error here; it comes back as a normal value and
//! the status is available through `TyrClient::last_response`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TyrError>;

/// Errors returned by `TyrClient` and its transports.
#[derive(Debug, Error)]
pub enum TyrError {
    /// The base URL is empty, unparseable, or not an http(s) base.
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// An environment variable holds a value of the wrong shape.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A scoped operation was called without an `end_point_id` configured.
    #[error("end_point_id must be defined")]
    MissingEndPointId,

    /// A required argument is empty or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The application name contains characters Tyr rejects.
    #[error("application name is not valid: {0:?}")]
    InvalidApplicationName(String),

    /// The request never produced a response (DNS, connect, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A response body decoded to JSON but not into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}
