//! # profiles-http
//!
//! HTTP layer for profiles-rs. Provides the request and response types that
//! views operate on, and the URL routing primitives (patterns, converters,
//! hierarchical resolution, reverse lookup) that route tables are built from.

pub mod querydict;
pub mod request;
pub mod response;
pub mod urls;

use std::future::Future;
use std::pin::Pin;

pub use querydict::QueryDict;
pub use request::{HttpRequest, HttpRequestBuilder};
pub use response::{HttpResponse, JsonResponse};

/// The boxed future returned by every route handler.
pub type BoxFuture = Pin<Box<dyn Future<Output = HttpResponse> + Send>>;
