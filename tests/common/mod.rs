#![allow(dead_code)]

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

pub use wordset_api::testing::{seed_user, seed_word_set, word, TestApp, TEST_PASSWORD};

/// Status, headers and decoded envelope of one in-process call.
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn kind(&self) -> &str {
        self.body["type"].as_str().unwrap_or_default()
    }

    pub fn message(&self) -> &str {
        self.body["payload"]["message"].as_str().unwrap_or_default()
    }

    /// `JWT=<token>` from the response's `Set-Cookie`, ready to send back.
    pub fn session_cookie(&self) -> Option<String> {
        let raw = self.headers.get(header::SET_COOKIE)?.to_str().ok()?;
        raw.split(';').next().map(str::to_string)
    }
}

/// Drives the router without a socket, the way a browser on the allowed origin would.
pub struct Client {
    pub app: TestApp,
    router: Router,
    peer: SocketAddr,
}

impl Client {
    pub fn new() -> Self {
        Self::from_app(TestApp::new())
    }

    pub fn from_app(app: TestApp) -> Self {
        let router = app.router();
        Self {
            app,
            router,
            peer: SocketAddr::from(([127, 0, 0, 1], 40000)),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Result<Reply> {
        self.send(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> Result<Reply> {
        self.send(Method::POST, uri, Some(body), cookie).await
    }

    /// Session cookie for an already seeded user.
    pub fn cookie(&self, user_id: &str) -> String {
        self.app.session_cookie(user_id)
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Result<Reply> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::ORIGIN, self.app.origin());
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json)?)
            }
            None => Body::empty(),
        };
        let mut request = builder.body(body).context("build request")?;
        request.extensions_mut().insert(ConnectInfo(self.peer));
        self.dispatch(request).await
    }

    /// Sends a hand-built request; only the peer address is added.
    pub async fn dispatch(&self, mut request: Request<Body>) -> Result<Reply> {
        if request.extensions().get::<ConnectInfo<SocketAddr>>().is_none() {
            request.extensions_mut().insert(ConnectInfo(self.peer));
        }
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {:?}", bytes))?
        };
        Ok(Reply { status, headers, body })
    }
}
