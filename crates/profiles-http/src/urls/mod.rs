//! URL routing and resolution.
//!
//! - [`pattern`]: route definitions via `path()` and `re_path()`
//! - [`converters`]: placeholder converters (`int`, `str`, `slug`, `uuid`, `path`)
//! - [`resolver`]: ordered, hierarchical resolution with namespaces
//! - [`reverse`]: URL generation from route names
//!
//! # Examples
//!
//! ```
//! use profiles_http::urls::pattern::path;
//! use profiles_http::urls::resolver::{root, URLEntry};
//! use profiles_http::urls::reverse::reverse;
//! use profiles_http::{HttpRequest, HttpResponse};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let handler = Arc::new(|_req: HttpRequest| -> profiles_http::BoxFuture {
//!     Box::pin(async { HttpResponse::ok("ok") })
//! });
//!
//! let patterns = vec![
//!     URLEntry::Pattern(path("feed/<int:pk>/", handler, Some("feed-detail")).unwrap()),
//! ];
//! let resolver = root(patterns).unwrap();
//!
//! let m = resolver.resolve("feed/3/").unwrap();
//! assert_eq!(m.kwargs.get("pk").unwrap(), "3");
//!
//! let mut kwargs = HashMap::new();
//! kwargs.insert("pk", "3");
//! assert_eq!(reverse("feed-detail", &kwargs, &resolver).unwrap(), "/feed/3/");
//! ```

pub mod converters;
pub mod pattern;
pub mod resolver;
pub mod reverse;
