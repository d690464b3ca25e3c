//! Middleware framework.
//!
//! [`Middleware`] components see each request before it reaches a view and
//! each response on the way out. [`MiddlewarePipeline`] runs requests through
//! them in order and responses in reverse order, so the first middleware
//! added wraps all the others.

pub mod builtin;

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use profiles_http::{HttpRequest, HttpResponse};

/// The future a [`ViewHandler`] returns: the request as the view left it
/// (with its resolver match, if routing succeeded) and the response.
pub type ViewFuture = Pin<Box<dyn Future<Output = (HttpRequest, HttpResponse)> + Send>>;

/// The handler a pipeline calls once every middleware has let the request through.
pub type ViewHandler = Box<dyn Fn(HttpRequest) -> ViewFuture + Send + Sync>;

/// A middleware component that can process requests and responses.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use profiles_views::middleware::Middleware;
/// use profiles_http::{HttpRequest, HttpResponse};
///
/// struct Passthrough;
///
/// #[async_trait]
/// impl Middleware for Passthrough {
///     async fn process_request(&self, _request: &mut HttpRequest) -> Option<HttpResponse> {
///         None
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Inspects or modifies a request before the view.
    ///
    /// Returning `Some(response)` skips the view and every later middleware.
    async fn process_request(&self, request: &mut HttpRequest) -> Option<HttpResponse>;

    /// Inspects or modifies the response. Called in reverse pipeline order.
    async fn process_response(&self, _request: &HttpRequest, response: HttpResponse) -> HttpResponse {
        response
    }
}

/// An ordered list of middleware wrapped around a view handler.
#[derive(Default)]
pub struct MiddlewarePipeline {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewarePipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware.
    pub fn add(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Returns the number of middleware components.
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns `true` if the pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Runs `request` through the pipeline and `handler`.
    ///
    /// `process_response` receives the request returned by the handler, so
    /// response middleware sees the matched route.
    ///
    /// If a middleware short-circuits, only the middleware that already saw
    /// the request get to process the response.
    pub async fn process(&self, mut request: HttpRequest, handler: &ViewHandler) -> HttpResponse {
        for (i, mw) in self.middlewares.iter().enumerate() {
            if let Some(mut response) = mw.process_request(&mut request).await {
                for earlier in self.middlewares[..=i].iter().rev() {
                    response = earlier.process_response(&request, response).await;
                }
                return response;
            }
        }

        let (request, mut response) = handler(request).await;

        for mw in self.middlewares.iter().rev() {
            response = mw.process_response(&request, response).await;
        }
        response
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("middleware_count", &self.middlewares.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::StatusCode;

    use super::*;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Recorder {
        async fn process_request(&self, _request: &mut HttpRequest) -> Option<HttpResponse> {
            self.log.lock().unwrap().push(format!("req:{}", self.name));
            None
        }

        async fn process_response(&self, _request: &HttpRequest, response: HttpResponse) -> HttpResponse {
            self.log.lock().unwrap().push(format!("resp:{}", self.name));
            response
        }
    }

    struct Blocker;

    #[async_trait]
    impl Middleware for Blocker {
        async fn process_request(&self, _request: &mut HttpRequest) -> Option<HttpResponse> {
            Some(HttpResponse::new(StatusCode::FORBIDDEN, "Blocked"))
        }
    }

    struct PathRewriter;

    #[async_trait]
    impl Middleware for PathRewriter {
        async fn process_request(&self, request: &mut HttpRequest) -> Option<HttpResponse> {
            *request = HttpRequest::builder().path("/rewritten/").build();
            None
        }
    }

    fn echo_path() -> ViewHandler {
        Box::new(|req: HttpRequest| -> ViewFuture {
            Box::pin(async move {
                let response = HttpResponse::ok(req.path().to_string());
                (req, response)
            })
        })
    }

    #[tokio::test]
    async fn test_empty_pipeline_calls_handler() {
        let pipeline = MiddlewarePipeline::new();
        assert!(pipeline.is_empty());
        let resp = pipeline
            .process(HttpRequest::builder().path("/x/").build(), &echo_path())
            .await;
        assert_eq!(resp.text(), "/x/");
    }

    #[tokio::test]
    async fn test_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.add(Recorder { name: "a", log: Arc::clone(&log) });
        pipeline.add(Recorder { name: "b", log: Arc::clone(&log) });
        assert_eq!(pipeline.len(), 2);

        pipeline.process(HttpRequest::builder().build(), &echo_path()).await;
        assert_eq!(*log.lock().unwrap(), vec!["req:a", "req:b", "resp:b", "resp:a"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_view_and_later_middleware() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.add(Recorder { name: "outer", log: Arc::clone(&log) });
        pipeline.add(Blocker);
        pipeline.add(Recorder { name: "inner", log: Arc::clone(&log) });

        let resp = pipeline.process(HttpRequest::builder().build(), &echo_path()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(*log.lock().unwrap(), vec!["req:outer", "resp:outer"]);
    }

    #[tokio::test]
    async fn test_handler_sees_modified_request() {
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.add(PathRewriter);
        let resp = pipeline.process(HttpRequest::builder().build(), &echo_path()).await;
        assert_eq!(resp.text(), "/rewritten/");
    }
}
