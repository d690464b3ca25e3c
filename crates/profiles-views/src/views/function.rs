//! Function-based views and method-restricting wrappers.
//!
//! A [`ViewFunction`] is the plain async-function form of a view. The
//! wrappers here restrict which HTTP methods reach it, answering everything
//! else with 405 and an `Allow` header.
//!
//! # Examples
//!
//! ```
//! use profiles_views::views::function::{require_get, ViewFunction};
//! use profiles_http::HttpResponse;
//!
//! let my_view: ViewFunction = Box::new(|_req| {
//!     Box::pin(async { HttpResponse::ok("Hello!") })
//! });
//!
//! let get_only = require_get(my_view);
//! ```

use std::sync::Arc;

use profiles_http::urls::pattern::RouteHandler;
use profiles_http::{BoxFuture, HttpRequest, HttpResponse};

/// An async view function: takes an [`HttpRequest`], yields an [`HttpResponse`].
pub type ViewFunction = Box<dyn Fn(HttpRequest) -> BoxFuture + Send + Sync>;

/// Converts a view function into a shareable route handler.
pub fn into_handler(view: ViewFunction) -> RouteHandler {
    Arc::from(view)
}

/// Wraps a view function to only allow the given HTTP methods.
///
/// Method names are compared case-insensitively.
pub fn require_http_methods(methods: &[&str], view: ViewFunction) -> ViewFunction {
    let allowed: Arc<Vec<String>> = Arc::new(methods.iter().map(|m| m.to_uppercase()).collect());
    let view = Arc::new(view);

    Box::new(move |request: HttpRequest| -> BoxFuture {
        let allowed = Arc::clone(&allowed);
        let view = Arc::clone(&view);

        Box::pin(async move {
            if allowed.iter().any(|m| m == request.method().as_str()) {
                view(request).await
            } else {
                let permitted: Vec<&str> = allowed.iter().map(String::as_str).collect();
                HttpResponse::not_allowed(request.method(), &permitted)
            }
        })
    })
}

/// Wraps a view function to only allow GET and HEAD.
pub fn require_get(view: ViewFunction) -> ViewFunction {
    require_http_methods(&["GET", "HEAD"], view)
}

/// Wraps a view function to only allow POST.
pub fn require_post(view: ViewFunction) -> ViewFunction {
    require_http_methods(&["POST"], view)
}
