//! Built-in middleware components.
//!
//! - [`RequestLoggingMiddleware`] - logs method, path, status and latency
//! - [`AllowedHostsMiddleware`] - rejects requests for hosts not in `allowed_hosts`
//! - [`SecurityMiddleware`] - sets protective response headers

use async_trait::async_trait;
use http::StatusCode;

use profiles_core::Settings;
use profiles_http::{HttpRequest, HttpResponse, JsonResponse};

use super::Middleware;

// ── RequestLoggingMiddleware ────────────────────────────────────────────

/// Logs one line per request once its response is ready.
///
/// 5xx responses are logged at `error`, 4xx at `warn`, everything else at
/// `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLoggingMiddleware;

#[async_trait]
impl Middleware for RequestLoggingMiddleware {
    async fn process_request(&self, _request: &mut HttpRequest) -> Option<HttpResponse> {
        None
    }

    async fn process_response(&self, request: &HttpRequest, response: HttpResponse) -> HttpResponse {
        let elapsed_ms = request.received_at().elapsed().as_secs_f64() * 1000.0;
        let status = response.status().as_u16();
        let route = request
            .resolver_match()
            .map_or_else(String::new, |m| m.view_name());
        let span = profiles_core::logging::request_span(request.method().as_str(), request.path());

        span.in_scope(|| {
            if response.status().is_server_error() {
                tracing::error!(status, elapsed_ms, route = %route, "request failed");
            } else if response.status().is_client_error() {
                tracing::warn!(status, elapsed_ms, route = %route, "request rejected");
            } else {
                tracing::info!(status, elapsed_ms, route = %route, "request completed");
            }
        });
        response
    }
}

// ── AllowedHostsMiddleware ──────────────────────────────────────────────

/// Answers 400 when the `Host` header is not allowed by the settings.
///
/// An empty `allowed_hosts` list allows every host.
#[derive(Debug, Clone)]
pub struct AllowedHostsMiddleware {
    settings: Settings,
}

impl AllowedHostsMiddleware {
    /// Creates the middleware from the `allowed_hosts` setting.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            settings: Settings {
                allowed_hosts: settings.allowed_hosts.clone(),
                ..Settings::default()
            },
        }
    }
}

#[async_trait]
impl Middleware for AllowedHostsMiddleware {
    async fn process_request(&self, request: &mut HttpRequest) -> Option<HttpResponse> {
        let host = request.get_host();
        if self.settings.is_host_allowed(host) {
            return None;
        }
        tracing::warn!(host, "disallowed host");
        Some(JsonResponse::with_status(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({ "detail": format!("Invalid HTTP_HOST header: '{host}'.") }),
        ))
    }
}

// ── SecurityMiddleware ──────────────────────────────────────────────────

/// Sets `X-Content-Type-Options: nosniff`, `X-Frame-Options` and
/// `Referrer-Policy` on every response.
#[derive(Debug, Clone)]
pub struct SecurityMiddleware {
    /// The value for the X-Frame-Options header.
    pub x_frame_options: String,
    /// The value for the Referrer-Policy header.
    pub referrer_policy: String,
}

impl Default for SecurityMiddleware {
    fn default() -> Self {
        Self {
            x_frame_options: "DENY".to_string(),
            referrer_policy: "same-origin".to_string(),
        }
    }
}

#[async_trait]
impl Middleware for SecurityMiddleware {
    async fn process_request(&self, _request: &mut HttpRequest) -> Option<HttpResponse> {
        None
    }

    async fn process_response(&self, _request: &HttpRequest, mut response: HttpResponse) -> HttpResponse {
        let headers = response.headers_mut();
        headers.insert(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        );
        if let Ok(value) = http::HeaderValue::from_str(&self.x_frame_options) {
            headers.insert(http::header::X_FRAME_OPTIONS, value);
        }
        if let Ok(value) = http::HeaderValue::from_str(&self.referrer_policy) {
            headers.insert(http::header::REFERRER_POLICY, value);
        }
        response
    }
}
