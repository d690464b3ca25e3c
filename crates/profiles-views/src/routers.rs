//! Routers that expand registered viewsets into URL patterns.
//!
//! [`DefaultRouter`] keeps registrations in order and, on [`DefaultRouter::urls`],
//! produces an API root route followed by a list route and a detail route per
//! registration, each with a `.json` format-suffix companion:
//!
//! | Route                    | Methods                     | Name               |
//! |--------------------------|-----------------------------|--------------------|
//! | `{prefix}/`              | GET list, POST create       | `{basename}-list`   |
//! | `{prefix}/<pk>/`         | GET retrieve, PUT update, PATCH partial_update, DELETE destroy | `{basename}-detail` |
//!
//! The route list is built once and never mutated afterwards.

use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};

use profiles_core::{ApiError, ApiResult};
use profiles_http::urls::converters::Converter;
use profiles_http::urls::pattern::{path, path_with, RouteHandler};
use profiles_http::urls::resolver::URLEntry;
use profiles_http::{BoxFuture, HttpRequest, HttpResponse, JsonResponse};

use crate::viewsets::{self, Action, ViewSet};

/// The only format suffix routes accept.
const FORMAT_SUFFIX_REGEX: &str = "json";

/// The name of the API root route.
pub const API_ROOT_NAME: &str = "api-root";

/// One registered viewset.
#[derive(Clone)]
pub struct Registration {
    /// The URL segment the viewset is mounted under.
    pub prefix: String,
    /// The viewset.
    pub viewset: Arc<dyn ViewSet>,
    /// The route-name stem, unique within a router.
    pub basename: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("prefix", &self.prefix)
            .field("viewset", &self.viewset.name())
            .field("basename", &self.basename)
            .finish()
    }
}

/// Which half of a registration a generated route serves.
#[derive(Debug, Clone, Copy)]
struct RouteSpec {
    suffix: &'static str,
    detail: bool,
    actions: &'static [Action],
}

const ROUTES: [RouteSpec; 2] = [
    RouteSpec {
        suffix: "list",
        detail: false,
        actions: &[Action::List, Action::Create],
    },
    RouteSpec {
        suffix: "detail",
        detail: true,
        actions: &[
            Action::Retrieve,
            Action::Update,
            Action::PartialUpdate,
            Action::Destroy,
        ],
    },
];

/// The HTTP method a generated route maps to `action`.
fn method_for(action: Action) -> Method {
    match action {
        Action::List | Action::Retrieve => Method::GET,
        Action::Create => Method::POST,
        Action::Update => Method::PUT,
        Action::PartialUpdate => Method::PATCH,
        Action::Destroy => Method::DELETE,
    }
}

/// A router that registers viewsets and generates their CRUD routes.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use profiles_core::ApiResult;
/// use profiles_http::{HttpRequest, HttpResponse};
/// use profiles_views::routers::DefaultRouter;
/// use profiles_views::viewsets::{Action, ViewSet};
/// use std::sync::Arc;
///
/// struct Things;
///
/// #[async_trait]
/// impl ViewSet for Things {
///     fn name(&self) -> &str { "Things" }
///     fn model_name(&self) -> Option<&str> { Some("Thing") }
///     fn actions(&self) -> Vec<Action> { vec![Action::List] }
///     async fn list(&self, _request: HttpRequest) -> ApiResult<HttpResponse> {
///         Ok(HttpResponse::ok("[]"))
///     }
/// }
///
/// let mut router = DefaultRouter::new();
/// router.register("things", Arc::new(Things), None).unwrap();
/// assert_eq!(router.registrations()[0].basename, "thing");
/// assert!(router.register("more-things", Arc::new(Things), None).is_err());
/// ```
#[derive(Debug)]
pub struct DefaultRouter {
    registry: Vec<Registration>,
    trailing_slash: bool,
    include_root_view: bool,
    include_format_suffixes: bool,
}

impl Default for DefaultRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultRouter {
    /// Creates an empty router with trailing slashes, a root view and
    /// format suffixes.
    pub const fn new() -> Self {
        Self {
            registry: Vec::new(),
            trailing_slash: true,
            include_root_view: true,
            include_format_suffixes: true,
        }
    }

    /// Sets whether generated routes end with `/`.
    #[must_use]
    pub const fn with_trailing_slash(mut self, trailing_slash: bool) -> Self {
        self.trailing_slash = trailing_slash;
        self
    }

    /// Sets whether the API root route is generated.
    #[must_use]
    pub const fn with_root_view(mut self, include_root_view: bool) -> Self {
        self.include_root_view = include_root_view;
        self
    }

    /// Sets whether `.json` format-suffix companions are generated.
    #[must_use]
    pub const fn with_format_suffixes(mut self, include: bool) -> Self {
        self.include_format_suffixes = include;
        self
    }

    /// Registers a viewset under `prefix`.
    ///
    /// Without an explicit `basename` the viewset's model name, lowercased,
    /// is used.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ImproperlyConfigured`] if no basename can be
    /// derived, or if the basename or the prefix is already registered.
    pub fn register(
        &mut self,
        prefix: &str,
        viewset: Arc<dyn ViewSet>,
        basename: Option<&str>,
    ) -> ApiResult<()> {
        let basename = match basename {
            Some(name) => name.to_string(),
            None => viewset.model_name().map(str::to_lowercase).ok_or_else(|| {
                ApiError::ImproperlyConfigured(format!(
                    "`basename` argument not specified, and could not automatically \
                     determine the name from the viewset \"{}\", as it has no model.",
                    viewset.name()
                ))
            })?,
        };

        if self.registry.iter().any(|r| r.basename == basename) {
            return Err(ApiError::ImproperlyConfigured(format!(
                "Router with basename \"{basename}\" is already registered. \
                 Please provide a unique basename for viewset \"{}\".",
                viewset.name()
            )));
        }

        let trimmed = prefix.trim_matches('/');
        if let Some(existing) = self
            .registry
            .iter()
            .find(|r| r.prefix.trim_matches('/') == trimmed)
        {
            return Err(ApiError::ImproperlyConfigured(format!(
                "Prefix \"{prefix}\" is already registered for basename \"{}\"; \
                 viewset \"{}\" would never be reached.",
                existing.basename,
                viewset.name()
            )));
        }

        tracing::debug!(prefix, basename = %basename, viewset = viewset.name(), "registered viewset");
        self.registry.push(Registration {
            prefix: prefix.to_string(),
            viewset,
            basename,
        });
        Ok(())
    }

    /// Returns the registrations in registration order.
    pub fn registrations(&self) -> &[Registration] {
        &self.registry
    }

    /// Generates the route list.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ImproperlyConfigured`] if a viewset's lookup regex
    /// is invalid.
    pub fn urls(&self) -> ApiResult<Vec<URLEntry>> {
        let mut entries = Vec::new();

        if self.include_root_view {
            let root = self.root_view();
            entries.push(URLEntry::Pattern(path("", Arc::clone(&root), Some(API_ROOT_NAME))?));
            if self.include_format_suffixes {
                entries.push(URLEntry::Pattern(path_with(
                    ".<format>",
                    &[("format", format_converter())],
                    root,
                    Some(API_ROOT_NAME),
                )?));
            }
        }

        for registration in &self.registry {
            for kind in ROUTES {
                self.push_route(&mut entries, registration, kind)?;
            }
        }

        Ok(entries)
    }

    fn push_route(
        &self,
        entries: &mut Vec<URLEntry>,
        registration: &Registration,
        kind: RouteSpec,
    ) -> ApiResult<()> {
        let viewset = &registration.viewset;
        let mapping: Vec<(Method, Action)> = kind
            .actions
            .iter()
            .filter(|action| viewset.supports(**action))
            .map(|action| (method_for(*action), *action))
            .collect();
        if mapping.is_empty() {
            return Ok(());
        }

        let lookup = viewset.lookup_field().to_string();
        let base = if kind.detail {
            format!("{}/<{lookup}>", registration.prefix)
        } else {
            registration.prefix.clone()
        };
        let slash = if self.trailing_slash { "/" } else { "" };

        let lookup_regex = viewset.lookup_value_regex().to_string();
        check_lookup_regex(&lookup_regex)?;
        let overrides = [
            (lookup.as_str(), Converter::Regex(lookup_regex)),
            ("format", format_converter()),
        ];

        let name = format!("{}-{}", registration.basename, kind.suffix);
        let handler = viewsets::as_view(Arc::clone(viewset), mapping);

        entries.push(URLEntry::Pattern(path_with(
            &format!("{base}{slash}"),
            &overrides,
            Arc::clone(&handler),
            Some(&name),
        )?));
        if self.include_format_suffixes {
            entries.push(URLEntry::Pattern(path_with(
                &format!("{base}.<format>"),
                &overrides,
                handler,
                Some(&name),
            )?));
        }
        Ok(())
    }

    /// The root view: GET lists every registration's list URL.
    fn root_view(&self) -> RouteHandler {
        let slash = if self.trailing_slash { "/" } else { "" };
        let listed: Arc<Vec<(String, String)>> = Arc::new(
            self.registry
                .iter()
                .filter(|r| r.viewset.supports(Action::List) || r.viewset.supports(Action::Create))
                .map(|r| (r.prefix.clone(), format!("{}{slash}", r.prefix)))
                .collect(),
        );

        Arc::new(move |request: HttpRequest| -> BoxFuture {
            let listed = Arc::clone(&listed);
            Box::pin(async move {
                let method = request.method();
                if method == Method::OPTIONS {
                    return JsonResponse::new(&serde_json::json!({ "name": "Api Root" }))
                        .with_header(
                            http::header::ALLOW,
                            http::HeaderValue::from_static("GET, HEAD, OPTIONS"),
                        );
                }
                if method != Method::GET && method != Method::HEAD {
                    return HttpResponse::not_allowed(method, &["GET", "HEAD", "OPTIONS"]);
                }

                let path = request.path();
                let base = path.rfind('/').map_or("/", |i| &path[..=i]);
                let body: serde_json::Map<String, serde_json::Value> = listed
                    .iter()
                    .map(|(prefix, route)| {
                        let url = request.build_absolute_uri(&format!("{base}{route}"));
                        (prefix.clone(), serde_json::Value::String(url))
                    })
                    .collect();
                JsonResponse::with_status(StatusCode::OK, &body)
            })
        })
    }
}

fn format_converter() -> Converter {
    Converter::Regex(FORMAT_SUFFIX_REGEX.to_string())
}

fn check_lookup_regex(pattern: &str) -> ApiResult<()> {
    if pattern.contains('/') {
        return Err(ApiError::ImproperlyConfigured(format!(
            "Lookup value regex must not match '/': {pattern}"
        )));
    }
    Ok(())
}
