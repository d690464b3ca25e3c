//! URL path pattern parsing and matching.
//!
//! [`URLPattern`] is a single route: either `path()` syntax with typed
//! placeholders (e.g. `feed/<int:pk>/`) or a raw `re_path()` regex.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use regex::Regex;

use profiles_core::{ApiError, ApiResult};

use super::converters::Converter;

/// A named converter entry: `(parameter_name, converter)`.
pub type ConverterEntry = (String, Converter);

/// The type for route handler functions.
///
/// A handler takes an [`HttpRequest`](crate::HttpRequest) and returns a boxed
/// future of an [`HttpResponse`](crate::HttpResponse). It is wrapped in an
/// `Arc` so it can be shared across worker tasks.
pub type RouteHandler = Arc<dyn Fn(crate::HttpRequest) -> crate::BoxFuture + Send + Sync>;

/// A single URL pattern that matches a path and invokes a handler.
pub struct URLPattern {
    route: String,
    regex: Regex,
    name: Option<String>,
    converters: Vec<ConverterEntry>,
    callback: RouteHandler,
}

impl fmt::Debug for URLPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("URLPattern")
            .field("route", &self.route)
            .field("regex", &self.regex.as_str())
            .field("name", &self.name)
            .field("converters", &self.converters)
            .finish_non_exhaustive()
    }
}

impl URLPattern {
    /// Returns the original route string.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Returns the compiled regex.
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the optional name used for reverse lookup.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the named converters, in route order.
    pub fn converters(&self) -> &[ConverterEntry] {
        &self.converters
    }

    /// Returns the handler.
    pub fn callback(&self) -> &RouteHandler {
        &self.callback
    }

    /// Matches `path` from its start.
    ///
    /// Returns the captured kwargs and the unmatched remainder, or `None` if
    /// the path does not match or a converter rejects a captured value.
    pub fn match_path(&self, path: &str) -> Option<(HashMap<String, String>, String)> {
        let captures = self.regex.captures(path)?;
        let full_match = captures.get(0)?;

        let mut kwargs = HashMap::new();

        if self.converters.is_empty() {
            // re_path: every named group is a string kwarg
            for name in self.regex.capture_names().flatten() {
                if let Some(m) = captures.name(name) {
                    kwargs.insert(name.to_string(), m.as_str().to_string());
                }
            }
        } else {
            for (name, converter) in &self.converters {
                if let Some(m) = captures.name(name) {
                    let raw = m.as_str();
                    if !converter.validate(raw) {
                        return None;
                    }
                    kwargs.insert(name.clone(), raw.to_string());
                }
            }
        }

        Some((kwargs, path[full_match.end()..].to_string()))
    }

    /// Matches the whole of `path`, returning the captured kwargs.
    pub fn full_match(&self, path: &str) -> Option<HashMap<String, String>> {
        let (kwargs, remaining) = self.match_path(path)?;
        remaining.is_empty().then_some(kwargs)
    }
}

/// Splits `type:name` into its parts, defaulting the type to `str`.
fn parse_type_and_name(inner: &str) -> (&str, &str) {
    inner
        .split_once(':')
        .unwrap_or(("str", inner))
}

/// Compiles a `path()`-style route into an anchored regex.
///
/// `overrides` replace the converter of the named placeholders, whatever type
/// the route spells out.
fn compile(
    route: &str,
    overrides: &[(&str, Converter)],
    anchor_end: bool,
) -> ApiResult<(Regex, Vec<ConverterEntry>)> {
    let mut regex_str = String::from("^");
    let mut converter_list = Vec::new();
    let mut remaining = route;

    while let Some(start) = remaining.find('<') {
        regex_str.push_str(&regex::escape(&remaining[..start]));

        let end = remaining[start..].find('>').ok_or_else(|| {
            ApiError::ImproperlyConfigured(format!("Unclosed angle bracket in route: {route}"))
        })? + start;

        let (type_name, param_name) = parse_type_and_name(&remaining[start + 1..end]);
        if param_name.is_empty() {
            return Err(ApiError::ImproperlyConfigured(format!(
                "Empty parameter name in route: {route}"
            )));
        }

        let converter = match overrides.iter().find(|(name, _)| *name == param_name) {
            Some((_, conv)) => conv.clone(),
            None => Converter::from_name(type_name)?,
        };

        write!(regex_str, "(?P<{param_name}>{})", converter.regex()).ok();
        converter_list.push((param_name.to_string(), converter));

        remaining = &remaining[end + 1..];
    }
    regex_str.push_str(&regex::escape(remaining));

    if anchor_end {
        regex_str.push('$');
    }

    let regex = Regex::new(&regex_str)
        .map_err(|e| ApiError::ImproperlyConfigured(format!("Invalid pattern regex: {e}")))?;
    Ok((regex, converter_list))
}

/// Creates a URL pattern using `path()` syntax.
///
/// The route may contain `<type:name>` placeholders; see
/// [`converters`](super::converters) for the supported types.
///
/// # Examples
///
/// ```
/// use profiles_http::urls::pattern::path;
/// use profiles_http::{HttpRequest, HttpResponse};
/// use std::sync::Arc;
///
/// let handler = Arc::new(|_req: HttpRequest| -> profiles_http::BoxFuture {
///     Box::pin(async { HttpResponse::ok("Hello") })
/// });
///
/// let pattern = path("hello-view/", handler, None).unwrap();
/// assert!(pattern.full_match("hello-view/").is_some());
/// assert!(pattern.full_match("hello-view").is_none());
/// ```
///
/// # Errors
///
/// Returns [`ApiError::ImproperlyConfigured`] for an unknown converter or
/// malformed placeholder.
pub fn path(route: &str, callback: RouteHandler, name: Option<&str>) -> ApiResult<URLPattern> {
    path_with(route, &[], callback, name)
}

/// Like [`path`], but with explicit converters for some placeholders.
///
/// # Examples
///
/// ```
/// use profiles_http::urls::converters::Converter;
/// use profiles_http::urls::pattern::path_with;
/// use profiles_http::{HttpRequest, HttpResponse};
/// use std::sync::Arc;
///
/// let handler = Arc::new(|_req: HttpRequest| -> profiles_http::BoxFuture {
///     Box::pin(async { HttpResponse::ok("detail") })
/// });
///
/// let lookup = Converter::Regex("[^/.]+".to_string());
/// let pattern = path_with("profile/<pk>/", &[("pk", lookup)], handler, None).unwrap();
/// assert_eq!(pattern.full_match("profile/7/").unwrap()["pk"], "7");
/// assert!(pattern.full_match("profile/7.json/").is_none());
/// ```
///
/// # Errors
///
/// Same as [`path`].
pub fn path_with(
    route: &str,
    overrides: &[(&str, Converter)],
    callback: RouteHandler,
    name: Option<&str>,
) -> ApiResult<URLPattern> {
    let (regex, converters) = compile(route, overrides, true)?;
    Ok(URLPattern {
        route: route.to_string(),
        regex,
        name: name.map(String::from),
        converters,
        callback,
    })
}

/// Creates a URL pattern from a raw regex.
///
/// Named groups (e.g. `(?P<pk>[0-9]+)`) become string kwargs. The regex is
/// anchored at both ends if it is not already.
///
/// # Errors
///
/// Returns [`ApiError::ImproperlyConfigured`] if the regex is invalid.
pub fn re_path(regex_str: &str, callback: RouteHandler, name: Option<&str>) -> ApiResult<URLPattern> {
    let mut full_regex = String::with_capacity(regex_str.len() + 2);
    if !regex_str.starts_with('^') {
        full_regex.push('^');
    }
    full_regex.push_str(regex_str);
    if !regex_str.ends_with('$') {
        full_regex.push('$');
    }

    let regex = Regex::new(&full_regex)
        .map_err(|e| ApiError::ImproperlyConfigured(format!("Invalid regex pattern: {e}")))?;

    Ok(URLPattern {
        route: regex_str.to_string(),
        regex,
        name: name.map(String::from),
        converters: Vec::new(),
        callback,
    })
}

/// Creates a pattern that only matches a prefix, for use by a resolver.
///
/// # Errors
///
/// Same as [`path`].
pub fn path_prefix(route: &str) -> ApiResult<URLPattern> {
    let (regex, converters) = compile(route, &[], false)?;

    let unreachable: RouteHandler =
        Arc::new(|_req| Box::pin(async { crate::HttpResponse::not_found() }));

    Ok(URLPattern {
        route: route.to_string(),
        regex,
        name: None,
        converters,
        callback: unreachable,
    })
}
