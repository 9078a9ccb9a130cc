use super::Upstreams;
use crate::domain::search::{SearchFailure, SearchRequest};
use crate::domain::token::TokenAuthority;
use crate::domain::SubjectKind;
use crate::library::http::{
    bearer_token, forward_request, json_response, message_response, uri_with_path, Responder,
};
use async_trait::async_trait;
use futures::Future;
use hyper::client::HttpConnector;
use hyper::http::{request::Parts, Method, Request, Response, StatusCode};
use hyper::{body, Body, Client};
use std::convert::Infallible;
use std::net::IpAddr;
use tracing::{debug, info, warn};

const SEARCH_PATH: &str = "/search";
const PROXY_IDENTIFIER: &str = "gateway";

/// Authenticates searches and forwards them to the service responsible for their subject kind
pub struct SearchForwardingResponder {
    client: Client<HttpConnector>,
    authority: TokenAuthority,
    upstreams: Upstreams,
}

impl SearchForwardingResponder {
    /// Creates a new instance from raw parts
    pub fn new(authority: TokenAuthority, upstreams: Upstreams) -> Self {
        Self {
            client: Client::new(),
            authority,
            upstreams,
        }
    }

    fn upstream(&self, kind: SubjectKind) -> &str {
        match kind {
            SubjectKind::Client => &self.upstreams.client_service,
            SubjectKind::Companie => &self.upstreams.company_service,
        }
    }

    fn forwarding_failed(kind: SubjectKind, error: impl ToString) -> Response<Body> {
        json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &SearchFailure {
                message: format!("Error forwarding request to {} service", kind),
                error: error.to_string(),
            },
        )
    }
}

#[async_trait]
impl Responder for SearchForwardingResponder {
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
        if parts.method != Method::POST || parts.uri.path() != SEARCH_PATH {
            return next(parts, body, client_ip).await;
        }

        let token = match bearer_token(&parts) {
            Some(token) => token,
            None => {
                return Ok(message_response(
                    StatusCode::UNAUTHORIZED,
                    "Access denied. No token provided.",
                ))
            }
        };

        match self.authority.verify(token) {
            Ok(claims) => debug!(username = %claims.username, "Authenticated search"),
            Err(error) => {
                info!(?client_ip, %error, "Rejected search with invalid token");
                return Ok(message_response(
                    StatusCode::FORBIDDEN,
                    "Access denied. Invalid token.",
                ));
            }
        }

        let bytes = match body::to_bytes(body).await {
            Ok(bytes) => bytes,
            Err(error) => {
                return Ok(message_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Unable to read request body: {}", error),
                ))
            }
        };

        // Unparseable bodies are reported just like bodies with missing fields
        let search: SearchRequest = serde_json::from_slice(&bytes).unwrap_or_default();

        let kind = match search.route() {
            Ok((kind, name)) => {
                info!(%kind, subject = name, "Forwarding search");
                kind
            }
            Err(error) => return Ok(message_response(StatusCode::BAD_REQUEST, &error.to_string())),
        };

        let target = match uri_with_path(self.upstream(kind), kind.search_path()) {
            Ok(target) => target,
            Err(error) => return Ok(Self::forwarding_failed(kind, error)),
        };

        let req = Request::from_parts(parts, Body::from(bytes));

        match forward_request(&self.client, req, client_ip, PROXY_IDENTIFIER, target).await {
            Ok(response) => Ok(response),
            Err(error) => {
                warn!(%kind, %error, "Forwarding search failed");
                Ok(Self::forwarding_failed(kind, error))
            }
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use hyper::header::AUTHORIZATION;
    use hyper::service::{make_service_fn, service_fn};
    use hyper::Server;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::net::{Ipv4Addr, SocketAddr, TcpListener};
    use std::time::Duration;

    const SECRET: &str = "123";

    /// Upstream answering with the path and authorization it received
    fn echo_upstream() -> String {
        let make_svc = make_service_fn(|_| async {
            Ok::<_, Infallible>(service_fn(|req: Request<Body>| async move {
                let authorization = req
                    .headers()
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                let path = req.uri().path().to_owned();
                let search: Value =
                    serde_json::from_slice(&body::to_bytes(req.into_body()).await.unwrap())
                        .unwrap();

                Ok::<_, Infallible>(json_response(
                    StatusCode::ACCEPTED,
                    &json!({ "path": path, "authorization": authorization, "search": search }),
                ))
            }))
        });

        let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
        let addr = server.local_addr();
        tokio::spawn(server);

        format!("http://{}", addr)
    }

    fn closed_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    }

    fn responder(client_service: String, company_service: String) -> SearchForwardingResponder {
        SearchForwardingResponder::new(
            TokenAuthority::new(SECRET, Duration::from_secs(3600)),
            Upstreams {
                client_service,
                company_service,
            },
        )
    }

    fn token() -> String {
        TokenAuthority::new(SECRET, Duration::from_secs(3600))
            .issue("alice")
            .unwrap()
    }

    async fn search(
        responder: &SearchForwardingResponder,
        authorization: Option<&str>,
        payload: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::POST).uri(SEARCH_PATH);

        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        let (parts, body) = builder
            .body(Body::from(payload.to_owned()))
            .unwrap()
            .into_parts();

        let response = responder
            .respond(parts, body, Ipv4Addr::LOCALHOST.into(), |_, _, _| async {
                Ok(message_response(StatusCode::NOT_FOUND, "passed on"))
            })
            .await
            .unwrap();

        let status = response.status();
        let bytes = body::to_bytes(response.into_body()).await.unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn require_a_valid_token() {
        let responder = responder(closed_port(), closed_port());
        let payload = r#"{"type":"Client","name":"Elon Musk"}"#;

        let (status, body) = search(&responder, None, payload).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access denied. No token provided.");

        let (status, body) = search(&responder, Some("Bearer forged"), payload).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Access denied. Invalid token.");
    }

    #[tokio::test]
    async fn validate_searches_before_forwarding() {
        let responder = responder(closed_port(), closed_port());
        let authorization = format!("Bearer {}", token());

        let (status, body) = search(&responder, Some(&authorization), r#"{"name":"Tesla"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Type and name are required in POST body for /search."
        );

        let (status, body) = search(
            &responder,
            Some(&authorization),
            r#"{"type":"Person","name":"Tesla"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Invalid search type. Must be 'Client' or 'Companie'."
        );
    }

    #[tokio::test]
    async fn forward_by_kind_and_relay_the_answer() {
        let responder = responder(closed_port(), echo_upstream());
        let authorization = format!("Bearer {}", token());

        let (status, body) = search(
            &responder,
            Some(&authorization),
            r#"{"type":"Companie","name":"Tesla"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(
            body,
            json!({
                "path": "/companies",
                "authorization": authorization,
                "search": { "type": "Companie", "name": "Tesla" }
            })
        );
    }

    #[tokio::test]
    async fn report_unreachable_services() {
        let responder = responder(closed_port(), closed_port());
        let authorization = format!("Bearer {}", token());

        let (status, body) = search(
            &responder,
            Some(&authorization),
            r#"{"type":"Client","name":"Elon Musk"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error forwarding request to Client service");
    }
}
