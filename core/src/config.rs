//! Client configuration: base URL and credentials.
//!
//! `ClientConfig::from_env` reads:
//! - `INTERCOM_API_URL` (optional) for the API host,
//! - `INTERCOM_TOKEN` for bearer auth, or
//! - `INTERCOM_APP_ID` + `INTERCOM_API_KEY` for basic auth.

use mockable::{DefaultEnv, Env};

use crate::auth::Authentication;
use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://api.intercom.io";

pub const ENV_API_URL: &str = "INTERCOM_API_URL";
pub const ENV_TOKEN: &str = "INTERCOM_TOKEN";
pub const ENV_APP_ID: &str = "INTERCOM_APP_ID";
pub const ENV_API_KEY: &str = "INTERCOM_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth: Authentication,
}

impl ClientConfig {
    /// Configuration against the default API host.
    pub fn new(auth: Authentication) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth,
        }
    }

    /// Override the API host. An empty value keeps the default host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_env_with(&DefaultEnv::new())
    }

    /// Build a configuration from an arbitrary environment source.
    pub fn from_env_with<E: Env>(env: &E) -> Result<Self, ApiError> {
        let non_empty = |name: &str| env.string(name).filter(|value| !value.trim().is_empty());

        let auth = match (non_empty(ENV_TOKEN), non_empty(ENV_APP_ID), non_empty(ENV_API_KEY)) {
            (Some(token), _, _) => Authentication::Token(token),
            (None, Some(app_id), Some(api_key)) => Authentication::Basic { app_id, api_key },
            (None, Some(_), None) => {
                return Err(ApiError::Configuration(format!(
                    "{ENV_APP_ID} is set but {ENV_API_KEY} is missing"
                )))
            }
            _ => {
                return Err(ApiError::Configuration(format!(
                    "set {ENV_TOKEN}, or {ENV_APP_ID} and {ENV_API_KEY}"
                )))
            }
        };

        let config = Self::new(auth);
        Ok(match non_empty(ENV_API_URL) {
            Some(url) => config.with_base_url(&url),
            None => config,
        })
    }
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mockable::MockEnv;

    use super::*;

    fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |key| vars.get(key).cloned());
        env
    }

    #[test]
    fn token_wins_over_basic_credentials() {
        let config = ClientConfig::from_env_with(&mock_env(&[
            (ENV_TOKEN, "tok"),
            (ENV_APP_ID, "app"),
            (ENV_API_KEY, "key"),
        ]))
        .unwrap();
        assert_eq!(config.auth, Authentication::token("tok"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn basic_credentials_from_app_id_and_key() {
        let config =
            ClientConfig::from_env_with(&mock_env(&[(ENV_APP_ID, "app"), (ENV_API_KEY, "key")])).unwrap();
        assert_eq!(config.auth, Authentication::basic("app", "key"));
    }

    #[test]
    fn app_id_without_key_is_rejected() {
        let err = ClientConfig::from_env_with(&mock_env(&[(ENV_APP_ID, "app")])).unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = ClientConfig::from_env_with(&mock_env(&[(ENV_TOKEN, "  ")])).unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn api_url_override_is_normalized() {
        let config = ClientConfig::from_env_with(&mock_env(&[
            (ENV_TOKEN, "tok"),
            (ENV_API_URL, "http://localhost:3000/"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
    }

    #[test]
    fn empty_base_url_falls_back_to_default() {
        let config = ClientConfig::new(Authentication::token("t")).with_base_url("");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
