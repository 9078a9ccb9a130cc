use super::saga::{LookupSaga, SagaCoordinator, SagaOutcome};
use crate::domain::search::{SearchFailure, SearchRequest};
use crate::domain::SubjectDirectory;
use crate::library::communication::request::{Request, Requestor};
use crate::library::http::{json_response, message_response, read_json_body, Responder};
use async_trait::async_trait;
use futures::Future;
use hyper::http::{request::Parts, Method, Response, StatusCode};
use hyper::Body;
use std::convert::Infallible;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Answers searches posted to the path of the saga's [`SubjectKind`](crate::domain::SubjectKind)
pub struct SearchResponder<S, D, R> {
    coordinator: Arc<SagaCoordinator<S, D, R>>,
}

impl<S, D, R> SearchResponder<S, D, R> {
    /// Creates a new instance running searches on the given coordinator
    pub fn new(coordinator: Arc<SagaCoordinator<S, D, R>>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl<S, D, R> Responder for SearchResponder<S, D, R>
where
    S: LookupSaga,
    D: SubjectDirectory + Send + Sync,
    R: Requestor + Send + Sync,
    <S::Request as Request>::Response: Send + Sync,
{
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
        if parts.method != Method::POST || parts.uri.path() != S::KIND.search_path() {
            return next(parts, body, client_ip).await;
        }

        let search: SearchRequest = match read_json_body(body).await {
            Ok(search) => search,
            Err(error) => {
                debug!(%error, "Unable to read search");
                return Ok(message_response(
                    StatusCode::BAD_REQUEST,
                    &error.to_string(),
                ));
            }
        };

        let response = match self.coordinator.run(&search).await {
            SagaOutcome::Found(details) => json_response(StatusCode::OK, &details),
            SagaOutcome::NotFound(missing) => json_response(StatusCode::OK, &missing),
            SagaOutcome::Invalid(error) => {
                message_response(StatusCode::BAD_REQUEST, &error.to_string())
            }
            SagaOutcome::Failed(error) => json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &SearchFailure {
                    message: S::FAILURE_MESSAGE.into(),
                    error: error.to_string(),
                },
            ),
        };

        Ok(response)
    }
}
