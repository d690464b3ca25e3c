//! HTTP request type.
//!
//! [`HttpRequest`] is what every view receives: the method, path, headers,
//! parsed query parameters, raw body, and (once routing has run) the
//! [`ResolverMatch`] describing which route matched and what it captured.

use std::time::Instant;

use http::{HeaderMap, Method};

use profiles_core::{ApiError, ApiResult};

use crate::querydict::QueryDict;
use crate::urls::resolver::ResolverMatch;

/// An incoming HTTP request.
///
/// Instances are created from an axum request via [`HttpRequest::from_axum`],
/// or with [`HttpRequest::builder`] in tests.
///
/// # Examples
///
/// ```
/// use profiles_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::GET)
///     .path("/profile/")
///     .query_string("search=ada")
///     .build();
///
/// assert_eq!(request.method(), &http::Method::GET);
/// assert_eq!(request.path(), "/profile/");
/// assert_eq!(request.query().get("search"), Some("ada"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query_string: String,
    query: QueryDict,
    headers: HeaderMap,
    body: Vec<u8>,
    scheme: String,
    resolver_match: Option<ResolverMatch>,
    received_at: Instant,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`].
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Creates an `HttpRequest` from axum request parts and the collected body.
    pub fn from_axum(parts: http::request::Parts, body: Vec<u8>) -> Self {
        let path = parts.uri.path().to_string();
        let query_string = parts.uri.query().unwrap_or("").to_string();

        let scheme = if parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("https"))
        {
            "https"
        } else {
            "http"
        };

        Self {
            method: parts.method,
            query: QueryDict::parse(&query_string),
            path,
            query_string,
            headers: parts.headers,
            body,
            scheme: scheme.to_string(),
            resolver_match: None,
            received_at: Instant::now(),
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the parsed query parameters.
    pub const fn query(&self) -> &QueryDict {
        &self.query
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the content type of the request body, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw request body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parses the request body into a JSON value.
    ///
    /// JSON bodies are parsed as-is; form-encoded bodies become an object of
    /// strings. An empty body yields an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::SerializationError`] for malformed JSON and
    /// [`ApiError::BadRequest`] for an unsupported media type.
    pub fn data(&self) -> ApiResult<serde_json::Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }

        match self.content_type() {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
                let body = String::from_utf8_lossy(&self.body);
                Ok(QueryDict::parse(&body).to_json())
            }
            Some(ct) if !ct.starts_with("application/json") => Err(ApiError::BadRequest(
                format!("Unsupported media type \"{ct}\" in request."),
            )),
            _ => Ok(serde_json::from_slice(&self.body)?),
        }
    }

    /// Returns the instant the request was received.
    pub const fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Returns the resolver match, if the URL has been resolved.
    pub const fn resolver_match(&self) -> Option<&ResolverMatch> {
        self.resolver_match.as_ref()
    }

    /// Sets the resolver match on this request.
    pub fn set_resolver_match(&mut self, resolver_match: ResolverMatch) {
        self.resolver_match = Some(resolver_match);
    }

    /// Returns a keyword argument captured by the matched URL pattern.
    pub fn kwarg(&self, name: &str) -> Option<&str> {
        self.resolver_match
            .as_ref()
            .and_then(|m| m.kwargs.get(name))
            .map(String::as_str)
    }

    /// Returns the host from the `Host` header, defaulting to `localhost`.
    pub fn get_host(&self) -> &str {
        self.header(http::header::HOST.as_str())
            .unwrap_or("localhost")
    }

    /// Returns the URL scheme (`"http"` or `"https"`).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Builds an absolute URI for `location`, relative to this request's host.
    ///
    /// # Examples
    ///
    /// ```
    /// use profiles_http::HttpRequest;
    ///
    /// let request = HttpRequest::builder()
    ///     .path("/")
    ///     .header("host", "testserver")
    ///     .build();
    /// assert_eq!(request.build_absolute_uri("profile/"), "http://testserver/profile/");
    /// ```
    pub fn build_absolute_uri(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            return location.to_string();
        }
        let path = if location.starts_with('/') {
            location.to_string()
        } else {
            format!("/{location}")
        };
        format!("{}://{}{path}", self.scheme, self.get_host())
    }
}

/// Builder for constructing [`HttpRequest`] instances, mainly in tests.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    headers: HeaderMap,
    body: Vec<u8>,
    scheme: String,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            scheme: "http".to_string(),
        }
    }
}

impl HttpRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request path.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Sets the query string (without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets a JSON body and the matching content type.
    #[must_use]
    pub fn json(self, value: &serde_json::Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string().into_bytes())
    }

    /// Sets the raw request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Sets the scheme (http or https).
    #[must_use]
    pub fn scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Builds the [`HttpRequest`].
    pub fn build(self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            path: self.path,
            query: QueryDict::parse(&self.query_string),
            query_string: self.query_string,
            headers: self.headers,
            body: self.body,
            scheme: self.scheme,
            resolver_match: None,
            received_at: Instant::now(),
        }
    }
}
