//! Drives the assembled router in-process, backed by a [MemoryDatabase].

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::Duration;
use http_body_util::BodyExt;
use lateshow_catalog::{AuthSettings, Catalog, MemoryDatabase};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{app, context::ServerContext};

pub const USERNAME: &str = "letterman";
pub const PASSWORD: &str = "gap-toothed-grin";

pub struct TestApp {
    router: axum::Router,
}

impl TestApp {
    pub fn new() -> Self {
        let catalog = Catalog::new(
            MemoryDatabase::new(),
            AuthSettings {
                secret_key: "integration-test-secret".to_string(),
                token_lifetime: Duration::minutes(15),
            },
        );

        Self {
            router: app(ServerContext::new(catalog)),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    /// Sends a request exactly as built
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Registers the test user and logs in, returning the bearer token
    pub async fn token(&self) -> String {
        let credentials = json!({ "username": USERNAME, "password": PASSWORD });

        let (status, _) = self.post("/auth/register", None, credentials.clone()).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.post("/auth/login", None, credentials).await;
        assert_eq!(status, StatusCode::OK);

        body["token"].as_str().unwrap().to_string()
    }

    /// Creates a guest and returns its id
    pub async fn guest(&self, token: &str, name: &str) -> i64 {
        let (_, body) = self
            .post(
                "/guests",
                Some(token),
                json!({ "name": name, "profession": "actor" }),
            )
            .await;

        body["id"].as_i64().unwrap()
    }

    /// Creates an episode and returns its id
    pub async fn episode(&self, token: &str, number: i32) -> i64 {
        let (_, body) = self
            .post(
                "/episodes",
                Some(token),
                json!({ "date": "1/11/99", "number": number }),
            )
            .await;

        body["id"].as_i64().unwrap()
    }
}
