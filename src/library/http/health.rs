use super::{json_response, Responder};
use async_trait::async_trait;
use futures::Future;
use hyper::http::{request::Parts, Method, Response, StatusCode};
use hyper::Body;
use serde_json::json;
use std::convert::Infallible;
use std::net::IpAddr;

const HEALTH_PATH: &str = "/health";

/// Answers liveness probes on `GET /` and `GET /health`
pub struct HealthResponder {
    greeting: String,
    status: String,
}

impl HealthResponder {
    /// Creates a new instance which answers `GET /` with the `greeting` text and `GET /health` with `{ status }`
    pub fn new(greeting: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
            status: status.into(),
        }
    }
}

#[async_trait]
impl Responder for HealthResponder {
    async fn respond<F, Fut>(
        &self,
        parts: Parts,
        body: Body,
        client_ip: IpAddr,
        next: F,
    ) -> Result<Response<Body>, Infallible>
    where
        Fut: Future<Output = Result<Response<Body>, Infallible>> + Send,
        F: FnOnce(Parts, Body, IpAddr) -> Fut + Send,
    {
        if parts.method != Method::GET {
            return next(parts, body, client_ip).await;
        }

        match parts.uri.path() {
            "/" => Ok(Response::new(Body::from(self.greeting.clone()))),
            HEALTH_PATH => Ok(json_response(StatusCode::OK, &json!({ "status": self.status }))),
            _ => next(parts, body, client_ip).await,
        }
    }
}
