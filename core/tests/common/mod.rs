//! Recording transport shared by the integration tests.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use intercom_core::{ApiError, AsyncTransport, HttpRequest, HttpResponse, Transport};

type Responder = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync>;

/// Records every request it receives and answers through `respond`.
pub struct Spy {
    requests: Mutex<Vec<HttpRequest>>,
    respond: Responder,
}

impl Spy {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    {
        Self {
            requests: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Always answer with `status` and `body`.
    pub fn replying(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_| Ok(HttpResponse::new(status, body.clone())))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }
}

impl Transport for Spy {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.record(request)
    }
}

#[async_trait]
impl AsyncTransport for Spy {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.record(request)
    }
}
