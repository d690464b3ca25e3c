//! Reverse URL resolution.
//!
//! [`reverse`] turns a route name and its keyword arguments back into a path.

use std::collections::HashMap;
use std::hash::BuildHasher;

use profiles_core::{ApiError, ApiResult};

use super::pattern::ConverterEntry;
use super::resolver::URLResolver;

/// Generates the path for a named route.
///
/// Namespaced names use colons (`"v1:userprofile-detail"`). When several
/// routes share a name, as a route and its format-suffix companion do, the
/// first one whose placeholders are all satisfied by `kwargs` is used. Values
/// are checked against the placeholder's converter.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if no route has that name or none accepts
/// the given arguments.
///
/// # Examples
///
/// ```
/// use profiles_http::urls::reverse::reverse;
/// use profiles_http::urls::resolver::{root, URLEntry};
/// use profiles_http::urls::pattern::path;
/// use profiles_http::{HttpRequest, HttpResponse};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let handler = Arc::new(|_req: HttpRequest| -> profiles_http::BoxFuture {
///     Box::pin(async { HttpResponse::ok("ok") })
/// });
///
/// let resolver = root(vec![
///     URLEntry::Pattern(path("profile/<int:pk>/", handler, Some("userprofile-detail")).unwrap()),
/// ])
/// .unwrap();
///
/// let mut kwargs = HashMap::new();
/// kwargs.insert("pk", "7");
/// assert_eq!(reverse("userprofile-detail", &kwargs, &resolver).unwrap(), "/profile/7/");
/// ```
pub fn reverse<S: BuildHasher>(
    viewname: &str,
    kwargs: &HashMap<&str, &str, S>,
    urlconf: &URLResolver,
) -> ApiResult<String> {
    let mut found_name = false;

    for (qualified_name, route_template, converters) in urlconf.collect_named_patterns() {
        if qualified_name != viewname {
            continue;
        }
        found_name = true;
        if !accepts(&converters, kwargs) {
            continue;
        }
        let url = substitute_pattern(&route_template, kwargs)?;
        return Ok(if url.starts_with('/') {
            url
        } else {
            format!("/{url}")
        });
    }

    Err(ApiError::NotFound(if found_name {
        format!("Reverse for '{viewname}' with the given arguments not found")
    } else {
        format!("Reverse for '{viewname}' not found")
    }))
}

/// Checks that `kwargs` supplies exactly the placeholders, with valid values.
fn accepts<S: BuildHasher>(converters: &[ConverterEntry], kwargs: &HashMap<&str, &str, S>) -> bool {
    converters.len() == kwargs.len()
        && converters.iter().all(|(name, converter)| {
            kwargs.get(name.as_str()).is_some_and(|value| {
                converter.validate(value)
                    && regex::Regex::new(&format!("^(?:{})$", converter.regex()))
                        .is_ok_and(|re| re.is_match(value))
            })
        })
}

/// Replaces `<type:name>` placeholders in `route` with values from `kwargs`.
fn substitute_pattern<S: BuildHasher>(
    route: &str,
    kwargs: &HashMap<&str, &str, S>,
) -> ApiResult<String> {
    let mut result = String::new();
    let mut remaining = route;

    while let Some(start) = remaining.find('<') {
        result.push_str(&remaining[..start]);

        let end = remaining[start..].find('>').ok_or_else(|| {
            ApiError::ImproperlyConfigured(format!("Unclosed angle bracket in route template: {route}"))
        })? + start;

        let inner = &remaining[start + 1..end];
        let param_name = inner.split_once(':').map_or(inner, |(_, name)| name);

        let value = kwargs.get(param_name).ok_or_else(|| {
            ApiError::NotFound(format!(
                "No value provided for parameter '{param_name}' in URL pattern"
            ))
        })?;
        result.push_str(value);

        remaining = &remaining[end + 1..];
    }
    result.push_str(remaining);

    Ok(result)
}
