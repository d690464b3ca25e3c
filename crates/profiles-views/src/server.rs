//! HTTP server integration.
//!
//! [`ProfilesApp`] combines a URL resolver, a middleware pipeline and the
//! settings into an axum router, or serves it directly with [`ProfilesApp::run`].
//!
//! # Examples
//!
//! ```no_run
//! use profiles_views::server::ProfilesApp;
//! use profiles_core::Settings;
//! use profiles_http::urls::resolver::{root, URLEntry};
//! use profiles_http::urls::pattern::path;
//! use profiles_http::{HttpRequest, HttpResponse};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = Arc::new(|_req: HttpRequest| -> profiles_http::BoxFuture {
//!     Box::pin(async { HttpResponse::ok("Hello!") })
//! });
//!
//! let resolver = root(vec![URLEntry::Pattern(path("hello-view/", handler, None)?)])?;
//! ProfilesApp::new(Settings::default()).urls(resolver).run("127.0.0.1:8000").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::response::IntoResponse;
use axum::routing::any;
use tower_http::trace::TraceLayer;

use profiles_core::{ApiError, Settings};
use profiles_http::urls::resolver::URLResolver;
use profiles_http::{HttpRequest, HttpResponse, JsonResponse};

use crate::middleware::{Middleware, MiddlewarePipeline, ViewFuture, ViewHandler};

/// Request bodies larger than this are rejected.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// The application: route table, middleware and settings.
pub struct ProfilesApp {
    url_conf: Option<URLResolver>,
    middleware: MiddlewarePipeline,
    settings: Settings,
}

impl ProfilesApp {
    /// Creates an application with no routes and no middleware.
    pub fn new(settings: Settings) -> Self {
        Self {
            url_conf: None,
            middleware: MiddlewarePipeline::new(),
            settings,
        }
    }

    /// Sets the route table.
    #[must_use]
    pub fn urls(mut self, url_conf: URLResolver) -> Self {
        self.url_conf = Some(url_conf);
        self
    }

    /// Appends a middleware to the pipeline.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.add(middleware);
        self
    }

    /// Returns the settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns `true` if a route table has been set.
    pub const fn has_urls(&self) -> bool {
        self.url_conf.is_some()
    }

    /// Returns the number of middleware in the pipeline.
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    /// Converts the application into an axum router.
    ///
    /// Every path and method goes through the middleware pipeline and then
    /// the resolver. Unmatched paths get a 404 JSON response.
    pub fn into_axum_router(self) -> axum::Router {
        let url_conf = Arc::new(self.url_conf);
        let middleware = Arc::new(self.middleware);

        let view_handler: Arc<ViewHandler> = Arc::new(Box::new(move |request: HttpRequest| -> ViewFuture {
            let url_conf = Arc::clone(&url_conf);
            Box::pin(async move { route((*url_conf).as_ref(), request).await })
        }));

        let handler = move |req: Request<Body>| {
            let middleware = Arc::clone(&middleware);
            let view_handler = Arc::clone(&view_handler);

            async move {
                let (parts, body) = req.into_parts();
                let body_bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read request body");
                        return JsonResponse::with_status(
                            http::StatusCode::PAYLOAD_TOO_LARGE,
                            &serde_json::json!({ "detail": "Request body too large or unreadable." }),
                        )
                        .into_response();
                    }
                };

                let request = HttpRequest::from_axum(parts, body_bytes);
                middleware.process(request, &view_handler).await.into_response()
            }
        };

        axum::Router::new()
            .route("/{*path}", any(handler.clone()))
            .route("/", any(handler))
            .layer(TraceLayer::new_for_http())
    }

    /// Serves the application on `addr` until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn run(self, addr: &str) -> Result<(), ApiError> {
        let router = self.into_axum_router();
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            ApiError::ImproperlyConfigured(format!("Failed to bind to {addr}: {e}"))
        })?;

        tracing::info!("Starting server at http://{addr}/");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::InternalServerError(format!("Server error: {e}")))?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Resolves the request path and calls the matched handler.
///
/// Returns the request with its resolver match set alongside the response.
async fn route(url_conf: Option<&URLResolver>, mut request: HttpRequest) -> (HttpRequest, HttpResponse) {
    let Some(url_conf) = url_conf else {
        let response = HttpResponse::from(ApiError::ImproperlyConfigured(
            "No URL configuration provided".to_string(),
        ));
        return (request, response);
    };

    // Route patterns carry no leading slash and match decoded text.
    let path = decode_path(request.path());
    let path = path.strip_prefix('/').unwrap_or(&path);

    match url_conf.resolve(path) {
        Ok(resolver_match) => {
            let handler = Arc::clone(&resolver_match.func);
            request.set_resolver_match(resolver_match);
            let response = handler(request.clone()).await;
            (request, response)
        }
        Err(ApiError::NotFound(msg)) => {
            tracing::debug!(%msg, "no route");
            (request, HttpResponse::not_found())
        }
        Err(e) => (request, HttpResponse::from(e)),
    }
}

/// Percent-decodes a request path. Invalid UTF-8 is replaced lossily.
fn decode_path(raw: &str) -> String {
    percent_encoding::percent_decode_str(raw)
        .decode_utf8_lossy()
        .into_owned()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

impl std::fmt::Debug for ProfilesApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilesApp")
            .field("has_urls", &self.url_conf.is_some())
            .field("middleware_count", &self.middleware.len())
            .field("debug", &self.settings.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::builtin::{RequestLoggingMiddleware, SecurityMiddleware};

    #[test]
    fn test_app_new() {
        let app = ProfilesApp::new(Settings::default());
        assert!(!app.has_urls());
        assert_eq!(app.middleware_count(), 0);
        assert!(app.settings().debug);
    }

    #[test]
    fn test_app_builder() {
        let resolver = profiles_http::urls::resolver::root(vec![]).unwrap();
        let app = ProfilesApp::new(Settings::default())
            .urls(resolver)
            .middleware(RequestLoggingMiddleware)
            .middleware(SecurityMiddleware::default());
        assert!(app.has_urls());
        assert_eq!(app.middleware_count(), 2);
        assert!(format!("{app:?}").contains("ProfilesApp"));
    }

    #[tokio::test]
    async fn test_route_without_urlconf_is_500() {
        let (_, resp) = route(None, HttpRequest::builder().build()).await;
        assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/profile/%31/"), "/profile/1/");
        assert_eq!(decode_path("/hello-view/"), "/hello-view/");
        assert_eq!(decode_path("/a%20b/"), "/a b/");
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let app = ProfilesApp::new(Settings::default());
        let result = app.run("invalid-address").await;
        assert!(result.is_err());
    }
}
