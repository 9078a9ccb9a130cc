use super::super::super::request::{RequestRouter, ResponderError};
use crate::library::http::{json_response, message_response, Responder};
use async_trait::async_trait;
use futures::Future;
use hyper::header::CONTENT_TYPE;
use hyper::http::{request::Parts, HeaderValue, Method, Response, StatusCode};
use hyper::{body, Body};
use serde_json::json;
use std::convert::Infallible;
use std::net::IpAddr;
use tracing::warn;

/// [`Responder`] serving every request mounted in a [`RequestRouter`]
pub struct RequestRouterResponder {
    router: RequestRouter,
}

impl RequestRouterResponder {
    /// Creates a new instance serving the given router
    pub fn new(router: RequestRouter) -> Self {
        Self { router }
    }

    fn error_response(status: StatusCode, error: &ResponderError) -> Response<Body> {
        json_response(
            status,
            &json!({ "message": error.to_string(), "error": format!("{:?}", error) }),
        )
    }
}

#[async_trait]
impl Responder for RequestRouterResponder {
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
        if parts.method != Method::POST || !self.router.serves(parts.uri.path()) {
            return next(parts, body, client_ip).await;
        }

        let path = parts.uri.path();
        let payload = match body::to_bytes(body).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(path, error = %e, "Unable to read request body");
                return Ok(message_response(
                    StatusCode::BAD_REQUEST,
                    "Unable to read request body",
                ));
            }
        };

        let response = match self.router.dispatch(path, &payload).await {
            Some(Ok(Some(data))) => {
                let mut response = Response::new(Body::from(data));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
            Some(Ok(None)) | None => message_response(StatusCode::NOT_FOUND, "Not found"),
            Some(Err(e @ ResponderError::MalformedRequest(_))) => {
                Self::error_response(StatusCode::BAD_REQUEST, &e)
            }
            Some(Err(e)) => {
                warn!(path, error = %e, "Failed to process request");
                Self::error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
            }
        };

        Ok(response)
    }
}

#[cfg(test)]
mod does {
    use super::super::super::super::request::{
        OptionalRequestProcessor, Request, RequestError, Requestor,
    };
    use super::super::HttpRequestor;
    use super::*;
    use crate::library::BoxedError;
    use crate::make_responder_chain_service_fn;
    use hyper::Server;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use std::net::SocketAddr;

    #[derive(Debug, Serialize, Deserialize)]
    struct Greet {
        name: String,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Greeting {
        text: String,
    }

    impl Request for Greet {
        type Response = Greeting;
        const PATH: &'static str = "/rpc/greet";
    }

    struct Greeter;

    #[async_trait]
    impl OptionalRequestProcessor for Greeter {
        type Request = Greet;

        async fn maybe_process(&self, request: Greet) -> Result<Option<Greeting>, BoxedError> {
            if request.name == "nobody" {
                return Ok(None);
            }

            Ok(Some(Greeting {
                text: format!("Hello {}", request.name),
            }))
        }
    }

    fn serve() -> SocketAddr {
        let responder = RequestRouterResponder::new(RequestRouter::default().with_processor(Greeter));
        let make_svc = make_responder_chain_service_fn! { responder };

        let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
        let addr = server.local_addr();
        tokio::spawn(server);

        addr
    }

    #[tokio::test]
    async fn answer_requests_over_http() {
        let requestor = HttpRequestor::new(format!("http://{}", serve()));

        let response = requestor
            .request(&Greet {
                name: "Tesla".into(),
            })
            .await
            .unwrap();

        assert_eq!(
            response,
            Greeting {
                text: "Hello Tesla".into()
            }
        );
    }

    #[tokio::test]
    async fn report_declined_requests_as_not_found() {
        let requestor = HttpRequestor::new(format!("http://{}", serve()));

        let result = requestor
            .request(&Greet {
                name: "nobody".into(),
            })
            .await;

        assert!(matches!(result, Err(RequestError::NotFound)));
    }

    #[tokio::test]
    async fn report_unreachable_peers() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let requestor = HttpRequestor::new(format!("http://{}", addr));

        let result = requestor
            .request(&Greet {
                name: "Tesla".into(),
            })
            .await;

        assert!(matches!(result, Err(RequestError::Unreachable(_))));
    }
}
