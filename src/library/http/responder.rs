use super::json_response;
use async_trait::async_trait;
use futures::Future;
use hyper::http::{request::Parts, HeaderValue, Request, Response, StatusCode};
use hyper::Body;
use serde_json::json;
use std::convert::Infallible;
use std::net::IpAddr;
use tokio::time::Instant;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// Header identifying a request across the gateway and the services behind it
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Handler for incoming HTTP requests which may be chained
///
/// Implementations either answer a request themselves or hand it on by calling `next`.
#[async_trait]
pub trait Responder {
    /// Executes the responder on the parts of a request
    async fn respond<F, Fut>(
        &self,
        parts: Parts,
        body: Body,
        client_ip: IpAddr,
        next: F,
    ) -> Result<Response<Body>, Infallible>
    where
        Fut: Future<Output = Result<Response<Body>, Infallible>> + Send,
        F: FnOnce(Parts, Body, IpAddr) -> Fut + Send;
}

/// Answer for requests that fell through a whole responder chain
///
/// The body is `{ message, path }` with status `404`.
pub fn unhandled(parts: &Parts, client_ip: IpAddr) -> Result<Response<Body>, Infallible> {
    let path = parts.uri.path();
    warn!(%client_ip, method = %parts.method, path, "No responder handled request");

    Ok(json_response(
        StatusCode::NOT_FOUND,
        &json!({ "message": "Not found", "path": path }),
    ))
}

/// Runs a request through a responder chain in a span carrying its request id
///
/// The id is taken from the [`REQUEST_ID_HEADER`] or generated when absent. It is written back into
/// the request, so forwarded requests keep it, and into the response.
pub async fn dispatch<F, Fut>(
    request: Request<Body>,
    client_ip: IpAddr,
    chain: F,
) -> Result<Response<Body>, Infallible>
where
    Fut: Future<Output = Result<Response<Body>, Infallible>>,
    F: FnOnce(Parts, Body, IpAddr) -> Fut,
{
    let (mut parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get(REQUEST_ID_HEADER)
        .filter(|id| !id.is_empty())
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        });
    parts.headers.insert(REQUEST_ID_HEADER, request_id.clone());

    let span = info_span!(
        "request",
        id = request_id.to_str().unwrap_or_default(),
        %client_ip,
        method = %parts.method,
        path = parts.uri.path()
    );

    async move {
        let started = Instant::now();
        let result = chain(parts, body, client_ip).await;

        result.map(|mut response| {
            debug!(status = response.status().as_u16(), elapsed = ?started.elapsed(), "Answered request");
            response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
            response
        })
    }
    .instrument(span)
    .await
}

/// Chains together a number of `Responder` implementations, ending in [`unhandled`]
#[macro_export]
macro_rules! responder_chain {
    ($parts:expr, $body:expr, $ip:expr, { $first:ident, $($rest:tt)+ }) => {
        $first.respond($parts, $body, $ip, move |p, b, i| async move {
            $crate::responder_chain!(p, b, i, { $($rest)+ }).await
        })
    };

    ($parts:expr, $body:expr, $ip:expr, { $last:ident$(,)? }) => {
        $last.respond($parts, $body, $ip, move |parts, _, ip| async move {
            $crate::library::http::unhandled(&parts, ip)
        })
    };
}

/// Builds a hyper service factory which sends every request through [`dispatch`] and the given responders
///
/// Responders are moved into [`Arc`](std::sync::Arc)s shared by all connections.
#[macro_export]
macro_rules! make_responder_chain_service_fn {
    ( $($responder:ident$(,)? )+ ) => {{
        use hyper::{server::conn::AddrStream, service::{make_service_fn, service_fn}};
        use std::{sync::Arc, convert::Infallible};
        use $crate::library::http::Responder as _;

        paste::paste! {
            $( let [<shared_ $responder>] = Arc::new($responder); )+

            make_service_fn(move |conn: &AddrStream| {
                let client_ip = conn.remote_addr().ip();
                $( let [<shared_ $responder>] = [<shared_ $responder>].clone(); )+

                async move {
                    Ok::<_, Infallible>(service_fn(move |req| {
                        $( let [<shared_ $responder>] = [<shared_ $responder>].clone(); )+

                        $crate::library::http::dispatch(req, client_ip, move |parts, body, ip| async move {
                            $crate::responder_chain!(parts, body, ip, {
                                $( [<shared_ $responder>], )+
                            }).await
                        })
                    }))
                }
            })
        }
    }};
}

pub use make_responder_chain_service_fn;
pub use responder_chain;

#[cfg(test)]
mod does {
    use super::*;
    use crate::library::http::message_response;
    use crate::make_responder_chain_service_fn;
    use hyper::{body, Client, Server};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::net::SocketAddr;

    struct Ping;

    #[async_trait]
    impl Responder for Ping {
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
            if parts.uri.path() != "/ping" {
                return next(parts, body, client_ip).await;
            }

            let id = parts
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|id| id.to_str().ok())
                .unwrap_or_default()
                .to_owned();

            Ok(message_response(StatusCode::OK, &id))
        }
    }

    fn serve() -> SocketAddr {
        let ping = Ping;
        let make_svc = make_responder_chain_service_fn! { ping };

        let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
        let addr = server.local_addr();
        tokio::spawn(server);

        addr
    }

    async fn json(response: Response<Body>) -> Value {
        let bytes = body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn answer_unhandled_requests_with_json() {
        let addr = serve();

        let response = Client::new()
            .get(format!("http://{}/nowhere", addr).parse().unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(
            json(response).await,
            json!({ "message": "Not found", "path": "/nowhere" })
        );
    }

    #[tokio::test]
    async fn hand_request_ids_to_responders_and_back() {
        let addr = serve();

        let request = Request::get(format!("http://{}/ping", addr))
            .header(REQUEST_ID_HEADER, "search-42")
            .body(Body::empty())
            .unwrap();
        let response = Client::new().request(request).await.unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "search-42");
        assert_eq!(json(response).await, json!({ "message": "search-42" }));
    }

    #[tokio::test]
    async fn generate_missing_request_ids() {
        let addr = serve();

        let response = Client::new()
            .get(format!("http://{}/ping", addr).parse().unwrap())
            .await
            .unwrap();

        let header = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_owned();
        assert!(Uuid::parse_str(&header).is_ok());
        assert_eq!(json(response).await, json!({ "message": header }));
    }
}
