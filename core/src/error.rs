//! Error types for the Intercom API client.
//!
//! # Design
//! `InvalidArgument` is raised before any request leaves the client.
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server rejected the request". Other
//! non-2xx responses land in `Api` with the server's `error.list` entries and
//! the raw body. `Deserialization` is reserved for 2xx bodies that do not
//! match the expected shape.

use serde::{Deserialize, Serialize};

/// A single entry of the server's `error.list` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// The `error.list` body returned with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorList {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

/// Errors returned by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required argument was missing or malformed. No request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The transport could not complete the round-trip.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server returned 404.
    #[error("resource not found{}", summary(.0))]
    NotFound(Vec<ErrorDetail>),

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}{}", summary(.errors))]
    Api {
        status: u16,
        errors: Vec<ErrorDetail>,
        body: String,
    },

    /// A success response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The operation is not implemented by this client, e.g. pagination.
    #[error("{0} is not supported")]
    NotSupported(&'static str),

    /// Client configuration could not be assembled.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }

    /// Server-provided error entries, empty for client-side failures.
    pub fn details(&self) -> &[ErrorDetail] {
        match self {
            ApiError::NotFound(errors) | ApiError::Api { errors, .. } => errors,
            _ => &[],
        }
    }

    /// HTTP status for errors that came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound(_) => Some(404),
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn summary(errors: &[ErrorDetail]) -> String {
    match errors.first() {
        Some(ErrorDetail {
            code,
            message: Some(message),
            ..
        }) => format!(": {code}: {message}"),
        Some(detail) => format!(": {}", detail.code),
        None => String::new(),
    }
}
