use super::{CredentialError, CredentialStore};
use crate::domain::token::TokenAuthority;
use crate::library::http::{
    bearer_token, json_response, message_response, read_json_body, Responder,
};
use async_trait::async_trait;
use futures::Future;
use hyper::http::{request::Parts, Method, Response, StatusCode};
use hyper::Body;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::net::IpAddr;
use tracing::{error, info};

/// Body of registration and login requests
#[derive(Debug, Default, Deserialize)]
struct Credentials {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl Credentials {
    fn complete(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some((username, password))
            }
            _ => None,
        }
    }
}

/// Answer to a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Access token
    pub token: String,
    /// User the token has been issued to
    pub username: String,
}

/// Registers users, logs them in and shows their profile
pub struct AccountResponder {
    store: CredentialStore,
    authority: TokenAuthority,
}

impl AccountResponder {
    /// Creates a new instance from raw parts
    pub fn new(store: CredentialStore, authority: TokenAuthority) -> Self {
        Self { store, authority }
    }

    fn register(&self, credentials: Credentials) -> Response<Body> {
        let (username, password) = match credentials.complete() {
            Some(complete) => complete,
            None => return missing_credentials(),
        };

        match self.store.register(username, password) {
            Ok(()) => {
                info!(username, "User registered");
                message_response(StatusCode::CREATED, "Registered successfully")
            }
            Err(CredentialError::AlreadyExists) => {
                message_response(StatusCode::CONFLICT, "User already exists")
            }
            Err(e) => {
                error!(username, error = %e, "Registration failed");
                message_response(StatusCode::INTERNAL_SERVER_ERROR, "Error registering user")
            }
        }
    }

    fn login(&self, credentials: Credentials) -> Response<Body> {
        let (username, password) = match credentials.complete() {
            Some(complete) => complete,
            None => return missing_credentials(),
        };

        if !self.store.verify(username, password) {
            info!(username, "Login attempt failed");
            return message_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
        }

        match self.authority.issue(username) {
            Ok(token) => {
                info!(username, "User logged in");
                json_response(
                    StatusCode::OK,
                    &LoginResponse {
                        token,
                        username: username.to_owned(),
                    },
                )
            }
            Err(e) => {
                error!(username, error = %e, "Issuing token failed");
                message_response(StatusCode::INTERNAL_SERVER_ERROR, "Error logging in")
            }
        }
    }

    fn profile(&self, parts: &Parts) -> Response<Body> {
        let token = match bearer_token(parts) {
            Some(token) => token,
            None => return message_response(StatusCode::UNAUTHORIZED, "Missing token"),
        };

        match self.authority.verify(token) {
            Ok(claims) => json_response(
                StatusCode::OK,
                &json!({ "message": format!("Welcome {}", claims.username) }),
            ),
            Err(_) => message_response(StatusCode::FORBIDDEN, "Invalid token"),
        }
    }
}

fn missing_credentials() -> Response<Body> {
    message_response(
        StatusCode::BAD_REQUEST,
        "Username and password are required",
    )
}

#[async_trait]
impl Responder for AccountResponder {
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
        let method = parts.method.clone();
        let path = parts.uri.path().to_owned();

        if method == Method::POST && path == "/register" {
            let credentials = read_json_body(body).await.unwrap_or_default();
            Ok(self.register(credentials))
        } else if method == Method::POST && path == "/login" {
            let credentials = read_json_body(body).await.unwrap_or_default();
            Ok(self.login(credentials))
        } else if method == Method::GET && path == "/profile" {
            Ok(self.profile(&parts))
        } else {
            next(parts, body, client_ip).await
        }
    }
}
