//! URL resolver and namespace support.
//!
//! A [`URLResolver`] matches a prefix and hands the rest of the path to its
//! children, which are tried strictly in declaration order. The first child
//! that matches wins; later entries are never consulted.

use std::collections::HashMap;
use std::fmt;

use profiles_core::{ApiError, ApiResult};

use super::pattern::{self, ConverterEntry, RouteHandler, URLPattern};

/// An entry in the named-pattern collection: `(qualified_name, route_template, converters)`.
pub type NamedPatternEntry = (String, String, Vec<ConverterEntry>);

/// The result of resolving a path to a handler.
#[derive(Clone)]
pub struct ResolverMatch {
    /// The handler function to call.
    pub func: RouteHandler,
    /// Keyword arguments captured from the path.
    pub kwargs: HashMap<String, String>,
    /// The name of the matched pattern, if any.
    pub url_name: Option<String>,
    /// The instance namespaces in the resolution chain (outermost first).
    pub namespaces: Vec<String>,
    /// The full matched route template.
    pub route: String,
}

impl fmt::Debug for ResolverMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverMatch")
            .field("kwargs", &self.kwargs)
            .field("url_name", &self.url_name)
            .field("namespaces", &self.namespaces)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

impl ResolverMatch {
    /// Returns the fully-qualified view name, including namespaces.
    ///
    /// With namespaces `["v1"]` and url name `"userprofile-detail"` this is
    /// `"v1:userprofile-detail"`.
    pub fn view_name(&self) -> String {
        let mut parts: Vec<&str> = self.namespaces.iter().map(String::as_str).collect();
        if let Some(name) = &self.url_name {
            parts.push(name);
        }
        parts.join(":")
    }
}

/// An entry in a URL configuration: a leaf pattern or a nested resolver.
pub enum URLEntry {
    /// A leaf pattern that maps directly to a handler.
    Pattern(URLPattern),
    /// A nested resolver, usually created with [`include`].
    Resolver(URLResolver),
}

impl fmt::Debug for URLEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            Self::Resolver(r) => f.debug_tuple("Resolver").field(r).finish(),
        }
    }
}

/// A resolver that matches a prefix and delegates to ordered child entries.
pub struct URLResolver {
    pattern: URLPattern,
    url_patterns: Vec<URLEntry>,
    namespace: Option<String>,
}

impl fmt::Debug for URLResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("URLResolver")
            .field("pattern", &self.pattern)
            .field("url_patterns", &self.url_patterns)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl URLResolver {
    /// Creates a resolver from a prefix pattern and its children.
    pub fn new(pattern: URLPattern, url_patterns: Vec<URLEntry>, namespace: Option<&str>) -> Self {
        Self {
            pattern,
            url_patterns,
            namespace: namespace.map(String::from),
        }
    }

    /// Returns the prefix pattern.
    pub const fn pattern(&self) -> &URLPattern {
        &self.pattern
    }

    /// Returns the child entries in declaration order.
    pub fn url_patterns(&self) -> &[URLEntry] {
        &self.url_patterns
    }

    /// Returns the instance namespace, if set.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Resolves a path (without its leading `/`) to a [`ResolverMatch`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if no entry matches.
    pub fn resolve(&self, path: &str) -> ApiResult<ResolverMatch> {
        self.try_resolve(path)
            .ok_or_else(|| ApiError::NotFound(format!("No URL pattern matches '{path}'")))
    }

    fn try_resolve(&self, path: &str) -> Option<ResolverMatch> {
        let (prefix_kwargs, remaining) = self.pattern.match_path(path)?;

        let mut resolved = self.url_patterns.iter().find_map(|entry| match entry {
            URLEntry::Pattern(child) => child.full_match(&remaining).map(|kwargs| ResolverMatch {
                func: child.callback().clone(),
                kwargs,
                url_name: child.name().map(String::from),
                namespaces: Vec::new(),
                route: child.route().to_string(),
            }),
            URLEntry::Resolver(child) => child.try_resolve(&remaining),
        })?;

        for (k, v) in prefix_kwargs {
            resolved.kwargs.entry(k).or_insert(v);
        }
        if let Some(ns) = &self.namespace {
            resolved.namespaces.insert(0, ns.clone());
        }
        resolved.route = format!("{}{}", self.pattern.route(), resolved.route);

        Some(resolved)
    }

    /// Collects every named pattern in the tree with its qualified name.
    ///
    /// Used by [`reverse`](super::reverse::reverse).
    pub fn collect_named_patterns(&self) -> Vec<NamedPatternEntry> {
        self.collect_routes()
            .into_iter()
            .filter_map(|(route, name, converters)| name.map(|n| (n, route, converters)))
            .collect()
    }

    /// Lists every leaf route in resolution order as
    /// `(full_route, qualified_name, converters)`.
    pub fn collect_routes(&self) -> Vec<(String, Option<String>, Vec<ConverterEntry>)> {
        let mut result = Vec::new();
        self.collect_routes_inner(&mut result, &[], "");
        result
    }

    fn collect_routes_inner(
        &self,
        result: &mut Vec<(String, Option<String>, Vec<ConverterEntry>)>,
        parent_namespaces: &[String],
        parent_route: &str,
    ) {
        let mut namespaces = parent_namespaces.to_vec();
        if let Some(ns) = &self.namespace {
            namespaces.push(ns.clone());
        }

        let route_prefix = format!("{parent_route}{}", self.pattern.route());
        let prefix_converters = self.pattern.converters();

        for entry in &self.url_patterns {
            match entry {
                URLEntry::Pattern(child) => {
                    let qualified = child.name().map(|name| {
                        if namespaces.is_empty() {
                            name.to_string()
                        } else {
                            format!("{}:{name}", namespaces.join(":"))
                        }
                    });
                    let mut converters = prefix_converters.to_vec();
                    converters.extend(child.converters().iter().cloned());
                    result.push((format!("{route_prefix}{}", child.route()), qualified, converters));
                }
                URLEntry::Resolver(child) => {
                    child.collect_routes_inner(result, &namespaces, &route_prefix);
                }
            }
        }
    }
}

/// Creates a resolver for `prefix` holding `patterns`, optionally namespaced.
///
/// # Examples
///
/// ```
/// use profiles_http::urls::resolver::{include, root, URLEntry};
/// use profiles_http::urls::pattern::path;
/// use profiles_http::{HttpRequest, HttpResponse};
/// use std::sync::Arc;
///
/// let handler = Arc::new(|_req: HttpRequest| -> profiles_http::BoxFuture {
///     Box::pin(async { HttpResponse::ok("list") })
/// });
/// let patterns = vec![URLEntry::Pattern(path("profile/", handler, Some("userprofile-list")).unwrap())];
/// let api = include("api/", patterns, None).unwrap();
/// let resolver = root(vec![URLEntry::Resolver(api)]).unwrap();
/// assert!(resolver.resolve("api/profile/").is_ok());
/// ```
///
/// # Errors
///
/// Returns an error if the prefix route is malformed.
pub fn include(
    prefix: &str,
    patterns: Vec<URLEntry>,
    namespace: Option<&str>,
) -> ApiResult<URLResolver> {
    let prefix_pattern = pattern::path_prefix(prefix)?;
    Ok(URLResolver::new(prefix_pattern, patterns, namespace))
}

/// Creates a root resolver (empty prefix) holding `patterns`.
///
/// # Errors
///
/// Returns an error if pattern creation fails.
pub fn root(patterns: Vec<URLEntry>) -> ApiResult<URLResolver> {
    include("", patterns, None)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::urls::pattern::path;
    use crate::HttpResponse;

    fn dummy_handler() -> RouteHandler {
        Arc::new(|_req| Box::pin(async { HttpResponse::ok("ok") }))
    }

    fn labelled(label: &'static str) -> RouteHandler {
        Arc::new(move |_req| Box::pin(async move { HttpResponse::ok(label) }))
    }

    #[test]
    fn test_resolve_simple_pattern() {
        let resolver = root(vec![URLEntry::Pattern(
            path("hello-view/", dummy_handler(), None).unwrap(),
        )])
        .unwrap();
        let m = resolver.resolve("hello-view/").unwrap();
        assert!(m.url_name.is_none());
        assert!(m.kwargs.is_empty());
        assert_eq!(m.route, "hello-view/");
    }

    #[test]
    fn test_resolve_pattern_with_params() {
        let resolver = root(vec![URLEntry::Pattern(
            path("feed/<int:pk>/", dummy_handler(), Some("feed-detail")).unwrap(),
        )])
        .unwrap();
        let m = resolver.resolve("feed/3/").unwrap();
        assert_eq!(m.kwargs.get("pk").unwrap(), "3");
        assert_eq!(m.url_name.as_deref(), Some("feed-detail"));
    }

    #[test]
    fn test_resolve_not_found() {
        let resolver = root(vec![URLEntry::Pattern(
            path("login/", dummy_handler(), None).unwrap(),
        )])
        .unwrap();
        let err = resolver.resolve("logout/").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let resolver = root(vec![
            URLEntry::Pattern(path("profile/", labelled("first"), None).unwrap()),
            URLEntry::Pattern(path("profile/", labelled("second"), None).unwrap()),
        ])
        .unwrap();
        let m = resolver.resolve("profile/").unwrap();
        let resp = (m.func)(crate::HttpRequest::builder().build()).await;
        assert_eq!(resp.text(), "first");
    }

    #[tokio::test]
    async fn test_pattern_before_nested_resolver_wins() {
        let nested = include(
            "",
            vec![URLEntry::Pattern(
                path("<str:prefix>/", labelled("generated"), Some("generated")).unwrap(),
            )],
            None,
        )
        .unwrap();
        let resolver = root(vec![
            URLEntry::Pattern(path("hello-view/", labelled("explicit"), None).unwrap()),
            URLEntry::Resolver(nested),
        ])
        .unwrap();

        let m = resolver.resolve("hello-view/").unwrap();
        assert_eq!((m.func)(crate::HttpRequest::builder().build()).await.text(), "explicit");

        let m = resolver.resolve("other/").unwrap();
        assert_eq!(m.url_name.as_deref(), Some("generated"));
    }

    #[test]
    fn test_resolve_nested_include_with_namespace() {
        let children = vec![
            URLEntry::Pattern(path("", dummy_handler(), Some("list")).unwrap()),
            URLEntry::Pattern(path("<int:pk>/", dummy_handler(), Some("detail")).unwrap()),
        ];
        let resolver = root(vec![URLEntry::Resolver(
            include("profile/", children, Some("profiles")).unwrap(),
        )])
        .unwrap();

        let m = resolver.resolve("profile/").unwrap();
        assert_eq!(m.view_name(), "profiles:list");

        let m = resolver.resolve("profile/42/").unwrap();
        assert_eq!(m.kwargs["pk"], "42");
        assert_eq!(m.namespaces, vec!["profiles"]);
        assert_eq!(m.route, "profile/<int:pk>/");
    }

    #[test]
    fn test_include_with_prefix_params() {
        let children = vec![URLEntry::Pattern(
            path("feed/", dummy_handler(), Some("feed")).unwrap(),
        )];
        let resolver = root(vec![URLEntry::Resolver(
            include("api/<str:version>/", children, None).unwrap(),
        )])
        .unwrap();
        let m = resolver.resolve("api/v2/feed/").unwrap();
        assert_eq!(m.kwargs["version"], "v2");
    }

    #[test]
    fn test_collect_routes_in_order() {
        let children = vec![URLEntry::Pattern(
            path("<int:pk>/", dummy_handler(), Some("detail")).unwrap(),
        )];
        let resolver = root(vec![
            URLEntry::Pattern(path("login/", dummy_handler(), None).unwrap()),
            URLEntry::Resolver(include("feed/", children, Some("feed")).unwrap()),
        ])
        .unwrap();

        let routes = resolver.collect_routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].0, "login/");
        assert!(routes[0].1.is_none());
        assert_eq!(routes[1].0, "feed/<int:pk>/");
        assert_eq!(routes[1].1.as_deref(), Some("feed:detail"));

        let named = resolver.collect_named_patterns();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].0, "feed:detail");
    }

    #[test]
    fn test_resolver_match_debug() {
        let resolver = root(vec![URLEntry::Pattern(
            path("login/", dummy_handler(), Some("login")).unwrap(),
        )])
        .unwrap();
        let m = resolver.resolve("login/").unwrap();
        assert!(format!("{m:?}").contains("login"));
    }
}
