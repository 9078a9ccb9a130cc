//! Functions for forwarding HTTP requests to remote endpoints

use hyper::client::HttpConnector;
use hyper::http::{
    header::{
        Entry, HeaderName, InvalidHeaderValue, ToStrError, CONNECTION, FORWARDED, HOST,
        PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE, VIA,
    },
    uri::InvalidUri,
    HeaderMap, HeaderValue, Request, Response, Uri,
};
use hyper::{Body, Client};
use std::net::IpAddr;
use thiserror::Error;

const HOP_HEADERS: [HeaderName; 7] = [
    CONNECTION,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// HTTP forwarding error
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Unable to construct proxy header value
    #[error("unable to construct proxy header value")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
    /// Received non-ASCII proxy header (via/forwarded)
    #[error("received non-ASCII proxy header (via/forwarded)")]
    InvalidHeaderInput(#[from] ToStrError),
    /// HTTP connection failed
    #[error("http connection failed: {0}")]
    ConnectionFailed(#[from] hyper::Error),
}

macro_rules! append_header_value {
    ($req:expr, $key:expr, $value:expr) => {
        match $req.headers_mut().entry($key) {
            Entry::Vacant(entry) => {
                entry.insert($value.parse()?);
            }
            Entry::Occupied(mut entry) => {
                let existing_value = entry.get().to_str()?;
                let new_value = format!("{}, {}", existing_value, $value);

                entry.insert(new_value.parse()?);
            }
        }
    };
}

#[inline]
fn add_proxy_headers<B>(
    req: &mut Request<B>,
    ip: &IpAddr,
    proxy_identifier: &str,
) -> Result<(), ForwardError> {
    let proto = req.version();
    let host = req
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| format!(";host={}", host))
        .unwrap_or_default();

    // Forwarded: for;proto;host
    let forwarded_value = format!("for={};proto={:?}{}", ip, proto, host);
    append_header_value!(req, FORWARDED, forwarded_value);

    // Via: HTTP/1.1 crosslink-{identifier}
    let via_value = format!("{:?} crosslink-{}", proto, proxy_identifier);
    append_header_value!(req, VIA, via_value);

    Ok(())
}

#[inline]
fn strip_hop_headers(headers: &mut HeaderMap<HeaderValue>) {
    HOP_HEADERS.iter().for_each(|key| {
        headers.remove(key);
    });
}

#[inline]
fn translate_request<B>(
    ip: IpAddr,
    mut req: Request<B>,
    target: Uri,
    proxy_identifier: &str,
) -> Result<Request<B>, ForwardError> {
    *req.uri_mut() = target;

    strip_hop_headers(req.headers_mut());
    add_proxy_headers(&mut req, &ip, proxy_identifier)?;

    // Hyper derives the host of the upstream from the target uri
    req.headers_mut().remove(HOST);

    Ok(req)
}

/// Joins a base url (e.g. `http://localhost:3001` or just `localhost:3001`) with an absolute path
///
/// The scheme defaults to `http` when the base does not carry one. Any path of the base is replaced.
pub fn uri_with_path(base: &str, path: &str) -> Result<Uri, InvalidUri> {
    let base: Uri = base.parse()?;
    let scheme = base.scheme_str().unwrap_or("http");
    let authority = base
        .authority()
        .map(|a| a.as_str())
        .unwrap_or_default();

    format!("{}://{}{}", scheme, authority, path).parse()
}

/// Takes a request and forwards it to a remote target
///
/// Additional information provided (e.g. client IP, proxy identifier) will be attached to the
/// requests [`VIA`] and [`FORWARDED`] header.
#[inline]
pub async fn forward_request(
    client: &Client<HttpConnector>,
    req: Request<Body>,
    source_ip: IpAddr,
    proxy_identifier: &str,
    target: Uri,
) -> Result<Response<Body>, ForwardError> {
    let upstream = target.to_string();
    let req = translate_request(source_ip, req, target, proxy_identifier)?;

    match client.request(req).await {
        Ok(mut res) => {
            strip_hop_headers(res.headers_mut());
            Ok(res)
        }
        Err(e) => {
            log::error!("Failed to fulfill request to '{}': {}", upstream, e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn join_bases_with_paths() {
        assert_eq!(
            uri_with_path("http://localhost:3001", "/customers")
                .unwrap()
                .to_string(),
            "http://localhost:3001/customers"
        );
        assert_eq!(
            uri_with_path("http://company-service:3002/ignored", "/companies")
                .unwrap()
                .to_string(),
            "http://company-service:3002/companies"
        );
    }

    #[test]
    fn rewrite_headers_for_upstream() {
        let req = Request::builder()
            .uri("/search")
            .header(HOST, "gateway:8000")
            .header(CONNECTION, "keep-alive")
            .header(VIA, "HTTP/1.0 edge")
            .body(())
            .unwrap();

        let target = uri_with_path("localhost:3001", "/customers").unwrap();
        let translated =
            translate_request("10.0.0.1".parse().unwrap(), req, target, "gateway").unwrap();

        assert_eq!(translated.uri().path(), "/customers");
        assert!(translated.headers().get(CONNECTION).is_none());
        assert!(translated.headers().get(HOST).is_none());
        assert_eq!(
            translated.headers().get(FORWARDED).unwrap(),
            "for=10.0.0.1;proto=HTTP/1.1;host=gateway:8000"
        );
        assert_eq!(
            translated.headers().get(VIA).unwrap(),
            "HTTP/1.0 edge, HTTP/1.1 crosslink-gateway"
        );
    }
}
