//! HTTP test client.
//!
//! [`TestClient`] wraps an axum [`Router`] and sends requests through it with
//! `tower::ServiceExt::oneshot`, so every layer of the application runs
//! exactly as it would behind a socket.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use axum::Router;
//! use axum::routing::get;
//! use profiles_test::TestClient;
//!
//! async fn example() {
//!     let app = Router::new().route("/hello-view/", get(|| async { "Hello!" }));
//!     let client = TestClient::new(app);
//!
//!     let response = client.get("/hello-view/").await;
//!     assert_eq!(response.status_code(), 200);
//!     assert_eq!(response.text(), "Hello!");
//! }
//! ```

use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use profiles_core::{ApiError, ApiResult};

/// The `Host` header sent unless overridden.
pub const DEFAULT_HOST: &str = "testserver";

/// A client for simulated requests against an axum application.
///
/// Every request carries a `Host` header and, once [`TestClient::with_token`]
/// has been called, an `Authorization: Token <key>` header.
#[derive(Clone)]
pub struct TestClient {
    app: Router,
    host: String,
    authorization: Option<String>,
}

impl TestClient {
    /// Creates a client for the given router.
    pub fn new(app: Router) -> Self {
        Self {
            app,
            host: DEFAULT_HOST.to_string(),
            authorization: None,
        }
    }

    /// Sends subsequent requests with this `Host` header.
    #[must_use]
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Authenticates subsequent requests with a token.
    pub fn with_token(&mut self, token: &str) {
        self.authorization = Some(format!("Token {token}"));
    }

    /// Stops sending an `Authorization` header.
    pub fn logout(&mut self) {
        self.authorization = None;
    }

    /// Sends a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post_json(&self, path: &str, data: &serde_json::Value) -> TestResponse {
        self.request(Method::POST, path, Some(data)).await
    }

    /// Sends a POST request with a form-encoded body.
    pub async fn post_form(&self, path: &str, data: &[(&str, &str)]) -> TestResponse {
        let body = data
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        self.request_with_body(
            Method::POST,
            path,
            body.into_bytes(),
            Some("application/x-www-form-urlencoded"),
        )
        .await
    }

    /// Sends a PUT request with a JSON body.
    pub async fn put_json(&self, path: &str, data: &serde_json::Value) -> TestResponse {
        self.request(Method::PUT, path, Some(data)).await
    }

    /// Sends a PATCH request with a JSON body.
    pub async fn patch_json(&self, path: &str, data: &serde_json::Value) -> TestResponse {
        self.request(Method::PATCH, path, Some(data)).await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Method::DELETE, path, None).await
    }

    /// Sends a HEAD request.
    pub async fn head(&self, path: &str) -> TestResponse {
        self.request(Method::HEAD, path, None).await
    }

    /// Sends an OPTIONS request.
    pub async fn options(&self, path: &str) -> TestResponse {
        self.request(Method::OPTIONS, path, None).await
    }

    /// Sends a request with any method and an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        data: Option<&serde_json::Value>,
    ) -> TestResponse {
        match data {
            Some(value) => {
                self.request_with_body(
                    method,
                    path,
                    value.to_string().into_bytes(),
                    Some("application/json"),
                )
                .await
            }
            None => self.request_with_body(method, path, Vec::new(), None).await,
        }
    }

    async fn request_with_body(
        &self,
        method: Method,
        path: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(http::header::HOST, self.host.as_str());

        if let Some(ct) = content_type {
            builder = builder.header(http::header::CONTENT_TYPE, ct);
        }
        if let Some(auth) = &self.authorization {
            builder = builder.header(http::header::AUTHORIZATION, auth.as_str());
        }

        let req = builder
            .body(Body::from(body))
            .expect("request builder should not fail");

        self.send(req).await
    }

    /// Sends the request through the router and collects the response.
    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = match self.app.clone().oneshot(req).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_or_else(|_| Bytes::new(), http_body_util::Collected::to_bytes);

        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("host", &self.host)
            .field("authenticated", &self.authorization.is_some())
            .finish_non_exhaustive()
    }
}

/// The response to a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw response body.
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Returns the numeric status code.
    pub const fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the body as a UTF-8 string.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::SerializationError(e.to_string()))
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` if the body contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.text().contains(text)
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::{any, get, post};

    use super::*;

    fn test_app() -> Router {
        Router::new()
            .route("/hello-view/", get(|| async { "Hello!" }))
            .route(
                "/echo/",
                post(|headers: HeaderMap, body: String| async move {
                    let ct = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    format!("{ct}|{body}")
                }),
            )
            .route(
                "/whoami/",
                any(|headers: HeaderMap| async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("-")
                            .to_string()
                    };
                    axum::Json(serde_json::json!({
                        "host": header("host"),
                        "authorization": header("authorization"),
                    }))
                }),
            )
            .route(
                "/created/",
                get(|| async { (StatusCode::CREATED, [("x-custom", "yes")], "made") }),
            )
    }

    #[tokio::test]
    async fn test_get_text() {
        let client = TestClient::new(test_app());
        let response = client.get("/hello-view/").await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.text(), "Hello!");
        assert!(response.contains("Hello"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let client = TestClient::new(test_app());
        assert_eq!(client.get("/missing/").await.status_code(), 404);
    }

    #[tokio::test]
    async fn test_post_json_sets_content_type() {
        let client = TestClient::new(test_app());
        let response = client
            .post_json("/echo/", &serde_json::json!({"name": "Ann"}))
            .await;
        assert_eq!(response.text(), r#"application/json|{"name":"Ann"}"#);
    }

    #[tokio::test]
    async fn test_post_form() {
        let client = TestClient::new(test_app());
        let response = client.post_form("/echo/", &[("a", "1"), ("b", "2")]).await;
        assert_eq!(response.text(), "application/x-www-form-urlencoded|a=1&b=2");
    }

    #[tokio::test]
    async fn test_default_host_and_token() {
        let mut client = TestClient::new(test_app());
        let body: serde_json::Value = client.get("/whoami/").await.json().unwrap();
        assert_eq!(body["host"], DEFAULT_HOST);
        assert_eq!(body["authorization"], "-");

        client.with_token("abc123");
        let body: serde_json::Value = client.delete("/whoami/").await.json().unwrap();
        assert_eq!(body["authorization"], "Token abc123");

        client.logout();
        let body: serde_json::Value = client.get("/whoami/").await.json().unwrap();
        assert_eq!(body["authorization"], "-");
    }

    #[tokio::test]
    async fn test_custom_host() {
        let client = TestClient::new(test_app()).with_host("api.example.com");
        let body: serde_json::Value = client.get("/whoami/").await.json().unwrap();
        assert_eq!(body["host"], "api.example.com");
    }

    #[tokio::test]
    async fn test_status_and_headers() {
        let client = TestClient::new(test_app());
        let response = client.get("/created/").await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.header("x-custom"), Some("yes"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[tokio::test]
    async fn test_json_error_on_text_body() {
        let client = TestClient::new(test_app());
        let result: ApiResult<serde_json::Value> = client.get("/hello-view/").await.json();
        assert!(result.is_err());
    }
}
