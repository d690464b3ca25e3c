//! HTTP response types.
//!
//! [`HttpResponse`] carries a status, headers, a content type and a byte
//! body. [`JsonResponse`] builds JSON responses, and any [`ApiError`] can be
//! turned into a response through `From`.

use axum::response::IntoResponse;
use http::{HeaderMap, HeaderValue, StatusCode};

use profiles_core::ApiError;

/// An HTTP response produced by a view.
///
/// # Examples
///
/// ```
/// use profiles_http::HttpResponse;
///
/// let response = HttpResponse::ok("Hello, World!");
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.text(), "Hello, World!");
/// ```
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    content_type: String,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    /// Creates a new text response with the given status.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into().into_bytes(),
            content_type: "text/plain".to_string(),
        }
    }

    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates a 204 No Content response.
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT, "")
    }

    /// Creates a 404 Not Found response with a JSON `detail` body.
    pub fn not_found() -> Self {
        JsonResponse::with_status(
            StatusCode::NOT_FOUND,
            &serde_json::json!({ "detail": "Not found." }),
        )
    }

    /// Creates a 400 Bad Request text response.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, body)
    }

    /// Creates a 500 Internal Server Error text response.
    pub fn server_error(body: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    /// Creates a 405 Method Not Allowed response listing the permitted methods.
    ///
    /// The body is `{"detail": "Method \"X\" not allowed."}` and the `Allow`
    /// header carries the permitted methods.
    pub fn not_allowed(method: &http::Method, permitted_methods: &[&str]) -> Self {
        let mut response = JsonResponse::with_status(
            StatusCode::METHOD_NOT_ALLOWED,
            &serde_json::json!({ "detail": format!("Method \"{method}\" not allowed.") }),
        );
        if let Ok(value) = HeaderValue::from_str(&permitted_methods.join(", ")) {
            response.headers.insert(http::header::ALLOW, value);
        }
        response
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns a reference to the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Adds a header to the response.
    #[must_use]
    pub fn with_header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the content type (without charset).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the body bytes.
    pub fn content(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body decoded as UTF-8 (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON, returning `Value::Null` if it is not JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }

    fn full_content_type(&self) -> String {
        if self.content_type.starts_with("text/") || self.content_type.contains("json") {
            format!("{}; charset=utf-8", self.content_type)
        } else {
            self.content_type.clone()
        }
    }
}

impl From<ApiError> for HttpResponse {
    fn from(err: ApiError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        JsonResponse::with_status(status, &err.to_json())
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> axum::response::Response {
        let content_type = self.full_content_type();
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();
        if let Ok(ct) = HeaderValue::from_str(&content_type) {
            headers.insert(http::header::CONTENT_TYPE, ct);
        }
        for (key, value) in &self.headers {
            headers.insert(key, value.clone());
        }
        response
    }
}

/// Builds JSON responses.
pub struct JsonResponse;

impl JsonResponse {
    /// Creates a 200 OK JSON response from a serializable value.
    ///
    /// Serialization failures produce a 500 response.
    pub fn new<T: serde::Serialize>(data: &T) -> HttpResponse {
        Self::with_status(StatusCode::OK, data)
    }

    /// Creates a JSON response with a custom status code.
    pub fn with_status<T: serde::Serialize>(status: StatusCode, data: &T) -> HttpResponse {
        match serde_json::to_vec(data) {
            Ok(body) => HttpResponse {
                status,
                headers: HeaderMap::new(),
                body,
                content_type: "application/json".to_string(),
            },
            Err(e) => HttpResponse::server_error(format!("JSON serialization error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use profiles_core::ValidationError;

    use super::*;

    #[test]
    fn test_http_response_ok() {
        let resp = HttpResponse::ok("Hello");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.content_type(), "text/plain");
        assert_eq!(resp.content(), b"Hello");
    }

    #[test]
    fn test_no_content() {
        let resp = HttpResponse::no_content();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(resp.content().is_empty());
    }

    #[test]
    fn test_not_found_is_json() {
        let resp = HttpResponse::not_found();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.json()["detail"], "Not found.");
    }

    #[test]
    fn test_not_allowed_sets_allow_header() {
        let resp = HttpResponse::not_allowed(&http::Method::PUT, &["GET", "POST"]);
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            resp.headers().get(http::header::ALLOW).unwrap(),
            "GET, POST"
        );
        assert_eq!(resp.json()["detail"], "Method \"PUT\" not allowed.");
    }

    #[test]
    fn test_json_response() {
        let resp = JsonResponse::new(&serde_json::json!({"message": "Hello!"}));
        assert_eq!(resp.content_type(), "application/json");
        assert_eq!(resp.json()["message"], "Hello!");
    }

    #[test]
    fn test_from_api_error() {
        let resp: HttpResponse = ApiError::PermissionDenied(
            "You do not have permission to perform this action.".into(),
        )
        .into();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            resp.json()["detail"],
            "You do not have permission to perform this action."
        );
    }

    #[test]
    fn test_from_validation_error() {
        let resp: HttpResponse =
            ApiError::from(ValidationError::for_field("name", "This field is required.")).into();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.json()["name"][0], "This field is required.");
    }

    #[test]
    fn test_into_response_copies_headers() {
        let resp = HttpResponse::ok("x").with_header(
            http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        );
        let axum_resp = resp.into_response();
        assert_eq!(
            axum_resp.headers().get(http::header::CACHE_CONTROL).unwrap(),
            "no-cache"
        );
        assert_eq!(
            axum_resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
