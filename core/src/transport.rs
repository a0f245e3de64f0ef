//! Executors for plain-data requests.
//!
//! # Design
//! The client never performs I/O itself. A `Transport` (blocking) or
//! `AsyncTransport` turns an `HttpRequest` into an `HttpResponse`. Non-2xx
//! statuses are returned as data, not errors, so status interpretation stays
//! in `Envelope`. Only failures to complete the round-trip become
//! `ApiError::Transport`. Timeouts belong to the transport.
//!
//! `UreqTransport` (feature `blocking`) and `ReqwestTransport` (feature
//! `async-reqwest`) are the bundled adapters.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "blocking")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "async-reqwest")]
pub use self::nonblocking::ReqwestTransport;

#[cfg(feature = "blocking")]
mod blocking {
    use std::fmt;
    use std::time::Duration;

    use ureq::Agent;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a `ureq` agent.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl fmt::Debug for UreqTransport {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("UreqTransport").finish_non_exhaustive()
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::with_config(None)
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail any request that takes longer than `timeout` end to end.
        pub fn with_timeout(timeout: Duration) -> Self {
            Self::with_config(Some(timeout))
        }

        fn with_config(timeout: Option<Duration>) -> Self {
            // 4xx/5xx are data for the envelope, not transport errors.
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(timeout)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    fn decorate<B>(
        mut builder: ureq::RequestBuilder<B>,
        request: &HttpRequest,
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }
        builder
    }

    fn transport_error(error: ureq::Error) -> ApiError {
        ApiError::Transport(error.to_string())
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            let url = request.url.as_str();
            let body = request.body.as_deref();
            let result = match request.method {
                HttpMethod::Get => decorate(self.agent.get(url), request).call(),
                HttpMethod::Delete => decorate(self.agent.delete(url), request).call(),
                HttpMethod::Post => {
                    let builder = decorate(self.agent.post(url), request);
                    match body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
                HttpMethod::Put => {
                    let builder = decorate(self.agent.put(url), request);
                    match body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };
            let mut response = result.map_err(transport_error)?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(transport_error)?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(feature = "async-reqwest")]
mod nonblocking {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::{Client, Method};

    use super::AsyncTransport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Async transport backed by a `reqwest` client.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Wrap an existing client, keeping its pool and settings.
        pub fn from_client(client: Client) -> Self {
            Self { client }
        }

        /// # Errors
        ///
        /// Returns `ApiError::Transport` when the reqwest client cannot be built.
        pub fn with_timeout(timeout: Duration) -> Result<Self, ApiError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(transport_error)?;
            Ok(Self { client })
        }
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn transport_error(error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Transport(format!("timed out: {error}"))
        } else {
            ApiError::Transport(error.to_string())
        }
    }

    #[async_trait]
    impl AsyncTransport for ReqwestTransport {
        async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            let mut builder = self
                .client
                .request(method(request.method), request.url.as_str())
                .query(&request.query);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response.text().await.map_err(transport_error)?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
