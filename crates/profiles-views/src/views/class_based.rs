//! Class-based views.
//!
//! [`View`] dispatches a request to the method handler matching its HTTP
//! method. Every handler defaults to 405 Method Not Allowed, so an
//! implementation only overrides the methods it serves and lists them in
//! [`View::allowed_methods`].

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;

use profiles_http::{BoxFuture, HttpRequest, HttpResponse, JsonResponse};

use super::function::ViewFunction;

/// The base trait for class-based views.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use profiles_views::views::class_based::View;
/// use profiles_http::{HttpRequest, HttpResponse};
///
/// struct Ping;
///
/// #[async_trait]
/// impl View for Ping {
///     fn allowed_methods(&self) -> Vec<http::Method> {
///         vec![http::Method::GET, http::Method::HEAD, http::Method::OPTIONS]
///     }
///
///     async fn get(&self, _request: HttpRequest) -> HttpResponse {
///         HttpResponse::ok("pong")
///     }
/// }
/// ```
#[async_trait]
pub trait View: Send + Sync {
    /// A human-readable name, reported by OPTIONS.
    fn name(&self) -> &str {
        "View"
    }

    /// The HTTP methods this view serves, reported in `Allow`.
    fn allowed_methods(&self) -> Vec<Method> {
        vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ]
    }

    /// Routes the request to the handler for its method.
    async fn dispatch(&self, request: HttpRequest) -> HttpResponse {
        tracing::trace!(view = self.name(), method = %request.method(), "dispatching");
        match *request.method() {
            Method::GET => self.get(request).await,
            Method::POST => self.post(request).await,
            Method::PUT => self.put(request).await,
            Method::PATCH => self.patch(request).await,
            Method::DELETE => self.delete(request).await,
            Method::HEAD => self.head(request).await,
            Method::OPTIONS => self.options(request).await,
            _ => self.http_method_not_allowed(request).await,
        }
    }

    /// Handles GET. Returns 405 by default.
    async fn get(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles POST. Returns 405 by default.
    async fn post(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles PUT. Returns 405 by default.
    async fn put(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles PATCH. Returns 405 by default.
    async fn patch(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles DELETE. Returns 405 by default.
    async fn delete(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles HEAD. Delegates to `get` by default.
    async fn head(&self, request: HttpRequest) -> HttpResponse {
        self.get(request).await
    }

    /// Handles OPTIONS: `Allow` header plus a JSON description.
    async fn options(&self, _request: HttpRequest) -> HttpResponse {
        let methods = self.allowed_methods();
        let method_strs: Vec<&str> = methods.iter().map(Method::as_str).collect();
        let response = JsonResponse::new(&serde_json::json!({
            "name": self.name(),
            "allowed_methods": method_strs,
        }));
        match http::HeaderValue::from_str(&method_strs.join(", ")) {
            Ok(value) => response.with_header(http::header::ALLOW, value),
            Err(_) => response,
        }
    }

    /// Returns 405 with the `Allow` header.
    async fn http_method_not_allowed(&self, request: HttpRequest) -> HttpResponse {
        let methods = self.allowed_methods();
        let method_strs: Vec<&str> = methods.iter().map(Method::as_str).collect();
        HttpResponse::not_allowed(request.method(), &method_strs)
    }

    /// Converts this view into a [`ViewFunction`] for use in a route table.
    #[allow(clippy::wrong_self_convention)]
    fn as_view(self) -> ViewFunction
    where
        Self: Sized + 'static,
    {
        let view = Arc::new(self);
        Box::new(move |request: HttpRequest| -> BoxFuture {
            let view = Arc::clone(&view);
            Box::pin(async move { view.dispatch(request).await })
        })
    }
}
