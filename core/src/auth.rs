//! Credentials attached to every outbound request.
//!
//! The API accepts either HTTP basic auth built from an app id and api key,
//! or a personal access token sent as a bearer token.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::http::HttpRequest;

const AUTHORIZATION: &str = "authorization";

#[derive(Clone, PartialEq, Eq)]
pub enum Authentication {
    Basic { app_id: String, api_key: String },
    Token(String),
}

impl Authentication {
    pub fn basic(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Authentication::Basic {
            app_id: app_id.into(),
            api_key: api_key.into(),
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Authentication::Token(token.into())
    }

    /// Value of the `authorization` header for these credentials.
    pub fn header_value(&self) -> String {
        match self {
            Authentication::Basic { app_id, api_key } => {
                format!("Basic {}", STANDARD.encode(format!("{app_id}:{api_key}")))
            }
            Authentication::Token(token) => format!("Bearer {token}"),
        }
    }

    /// Set the `authorization` header on `request`, replacing any existing one.
    pub fn attach(&self, request: &mut HttpRequest) {
        request
            .headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION));
        request
            .headers
            .push((AUTHORIZATION.to_string(), self.header_value()));
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authentication::Basic { app_id, .. } => f
                .debug_struct("Basic")
                .field("app_id", app_id)
                .field("api_key", &"<redacted>")
                .finish(),
            Authentication::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}
