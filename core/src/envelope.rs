//! Outcome of one request/response cycle.
//!
//! # Design
//! An `Envelope` exists only once the server has answered; transport failures
//! never produce one. It keeps the status code alongside exactly one of the
//! decoded payload or the error the response maps to.

use serde::de::DeserializeOwned;

use crate::error::{ApiError, ErrorList};
use crate::http::HttpResponse;

#[derive(Debug)]
pub struct Envelope<T> {
    status: u16,
    result: Result<T, ApiError>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode `response` into a payload (2xx) or an error (anything else).
    pub fn decode(response: &HttpResponse) -> Self {
        let result = if response.is_success() {
            serde_json::from_str(&response.body)
                .map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            Err(status_error(response))
        };
        Self {
            status: response.status,
            result,
        }
    }
}

impl<T> Envelope<T> {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn payload(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.result.as_ref().err()
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        self.result
    }
}

/// Map a non-2xx response to `NotFound` or `Api`, keeping any `error.list`.
fn status_error(response: &HttpResponse) -> ApiError {
    let errors = serde_json::from_str::<ErrorList>(&response.body)
        .map(|list| list.errors)
        .unwrap_or_default();
    if response.status == 404 {
        return ApiError::NotFound(errors);
    }
    ApiError::Api {
        status: response.status,
        errors,
        body: response.body.clone(),
    }
}
