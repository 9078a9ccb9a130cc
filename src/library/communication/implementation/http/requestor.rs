use super::super::super::request::{Request, RequestError, Requestor};
use crate::library::http::uri_with_path;
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::CONTENT_TYPE;
use hyper::http::{Method, StatusCode};
use hyper::{body, Body, Client};

/// [`Requestor`] sending requests to a peer reachable over HTTP
#[derive(Clone)]
pub struct HttpRequestor {
    client: Client<HttpConnector>,
    base: String,
}

impl HttpRequestor {
    /// Creates a new instance which sends requests to the given base url (e.g. `http://localhost:3002`)
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base: base.into(),
        }
    }
}

#[async_trait]
impl Requestor for HttpRequestor {
    async fn request<R>(&self, request: &R) -> Result<R::Response, RequestError>
    where
        R: Request + Send + Sync,
        R::Response: Send + Sync,
    {
        let uri =
            uri_with_path(&self.base, R::PATH).map_err(|e| RequestError::Unreachable(e.into()))?;
        let payload =
            serde_json::to_vec(request).map_err(|e| RequestError::EncodingFailed(e.into()))?;

        let req = hyper::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .map_err(|e| RequestError::EncodingFailed(e.into()))?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| RequestError::Unreachable(e.into()))?;

        match response.status() {
            StatusCode::OK => {
                let bytes = body::to_bytes(response.into_body())
                    .await
                    .map_err(|e| RequestError::ReceptionFailed(e.into()))?;

                serde_json::from_slice(&bytes).map_err(|e| RequestError::ReceptionFailed(e.into()))
            }
            StatusCode::NOT_FOUND => Err(RequestError::NotFound),
            status => Err(RequestError::UnexpectedStatus(status.as_u16())),
        }
    }
}
