//! Stateless request builder shared by every resource.
//!
//! # Design
//! `ResourceClient<R>` holds only a base URL and credentials. Each operation
//! validates its arguments, picks an identifier, and returns a `Call<T>`: the
//! finished `HttpRequest` paired with the type its response decodes into.
//! Nothing touches the network until the call is sent, so validation errors
//! surface before any transport is involved.
//!
//! A `Call` runs on a blocking `Transport` via `send` or on an
//! `AsyncTransport` via `send_async`. Both paths share the same request and
//! the same decoding; only the executor differs.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::Authentication;
use crate::config::{normalize_base_url, ClientConfig};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::resource::{missing_identifier, Identifier, Lookup, Parameters, Resource, Target};
use crate::transport::{AsyncTransport, Transport};
use crate::types::Pages;

/// A validated request waiting to be executed.
#[must_use = "a call does nothing until it is sent"]
pub struct Call<T> {
    request: HttpRequest,
    _response: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Call<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call").field("request", &self.request).finish()
    }
}

impl<T: DeserializeOwned> Call<T> {
    pub(crate) fn new(request: HttpRequest) -> Self {
        Self {
            request,
            _response: PhantomData,
        }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn into_request(self) -> HttpRequest {
        self.request
    }

    /// Decode a response obtained for this call's request.
    pub fn parse(&self, response: &HttpResponse) -> Envelope<T> {
        debug!(
            method = %self.request.method,
            url = %self.request.url,
            status = response.status,
            "received response"
        );
        Envelope::decode(response)
    }

    /// Execute on a blocking transport.
    pub fn send<X>(self, transport: &X) -> Result<T, ApiError>
    where
        X: Transport + ?Sized,
    {
        self.log_send();
        let response = transport.execute(&self.request)?;
        self.parse(&response).into_result()
    }

    /// Execute on an async transport.
    pub async fn send_async<X>(self, transport: &X) -> Result<T, ApiError>
    where
        X: AsyncTransport + ?Sized,
    {
        self.log_send();
        let response = transport.execute(&self.request).await?;
        self.parse(&response).into_result()
    }

    fn log_send(&self) {
        debug!(
            method = %self.request.method,
            url = %self.request.url,
            query = ?self.request.query,
            "sending request"
        );
    }
}

/// Client for one resource kind, e.g. `ResourceClient<User>`.
pub struct ResourceClient<R> {
    base_url: String,
    auth: Authentication,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            auth: self.auth.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R> fmt::Debug for ResourceClient<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}

impl<R: Resource> ResourceClient<R> {
    /// An empty `base_url` selects the default API host.
    pub fn new(base_url: &str, auth: Authentication) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            auth,
            _resource: PhantomData,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url, config.auth.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a record. Needs the external id or the natural key.
    pub fn create(&self, record: &R) -> Result<Call<R>, ApiError> {
        if record.external_id().is_none() && record.natural_key().is_none() {
            return Err(ApiError::invalid(format!(
                "provide '{}' or '{}' to create a record in {}",
                R::EXTERNAL_ID_KEY,
                R::NATURAL_KEY,
                R::ENDPOINT
            )));
        }
        self.post(record)
    }

    /// Upsert a record. Needs at least one identifying field.
    pub fn update(&self, record: &R) -> Result<Call<R>, ApiError> {
        if Identifier::resolve(record).is_none() {
            return Err(missing_identifier::<R>());
        }
        self.post(record)
    }

    pub fn view(&self, lookup: Lookup<'_, R>) -> Result<Call<R>, ApiError> {
        let target = lookup.target()?;
        Ok(Call::new(self.targeted(HttpMethod::Get, target)?))
    }

    /// List records, optionally filtered. Only the first page is fetched.
    pub fn list(&self, parameters: Option<&Parameters>) -> Call<R::List> {
        let mut request = self.request(HttpMethod::Get, self.endpoint_url());
        if let Some(parameters) = parameters {
            request = request.with_query(parameters.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Call::new(request)
    }

    pub fn delete(&self, lookup: Lookup<'_, R>) -> Result<Call<R>, ApiError> {
        let target = lookup.target()?;
        Ok(Call::new(self.targeted(HttpMethod::Delete, target)?))
    }

    /// Following pagination cursors is not implemented; this always returns
    /// `NotSupported` so a missing page is never mistaken for an empty one.
    pub fn next_page(&self, _pages: &Pages) -> Result<Call<R::List>, ApiError> {
        Err(ApiError::NotSupported("pagination"))
    }

    /// POST an arbitrary JSON body to the resource endpoint.
    pub(crate) fn post<B>(&self, body: &B) -> Result<Call<R>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let json = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let request = self
            .request(HttpMethod::Post, self.endpoint_url())
            .with_json_body(json);
        Ok(Call::new(request))
    }

    fn endpoint_url(&self) -> String {
        format!("{}/{}", self.base_url, R::ENDPOINT)
    }

    fn targeted(&self, method: HttpMethod, target: Target) -> Result<HttpRequest, ApiError> {
        match target {
            Target::Path(id) => Ok(self.request(method, member_url(&self.endpoint_url(), &id)?)),
            Target::Query(pairs) => Ok(self.request(method, self.endpoint_url()).with_query(pairs)),
        }
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        authorized(&self.auth, method, url)
    }
}

/// `<endpoint>/<id>` with the id escaped as exactly one path segment.
pub(crate) fn member_url(endpoint_url: &str, id: &str) -> Result<String, ApiError> {
    let invalid_base =
        || ApiError::Configuration(format!("{endpoint_url:?} cannot address single records"));
    let mut url = Url::parse(endpoint_url).map_err(|_| invalid_base())?;
    url.path_segments_mut().map_err(|()| invalid_base())?.push(id);
    Ok(url.into())
}

pub(crate) fn authorized(auth: &Authentication, method: HttpMethod, url: String) -> HttpRequest {
    let mut request = HttpRequest::new(method, url);
    auth.attach(&mut request);
    request
}
