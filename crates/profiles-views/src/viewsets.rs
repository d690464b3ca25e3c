//! ViewSets: one handler object serving a resource's CRUD actions.
//!
//! A [`ViewSet`] implements the actions it supports and declares them in
//! [`ViewSet::actions`]. [`as_view`] binds a viewset to one route with an
//! HTTP method to [`Action`] map; the router does this for the list and
//! detail routes of every registration.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, StatusCode};

use profiles_core::{ApiError, ApiResult};
use profiles_http::urls::pattern::RouteHandler;
use profiles_http::{BoxFuture, HttpRequest, HttpResponse, JsonResponse};

/// A CRUD action a viewset may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `GET {prefix}/`
    List,
    /// `POST {prefix}/`
    Create,
    /// `GET {prefix}/<pk>/`
    Retrieve,
    /// `PUT {prefix}/<pk>/`
    Update,
    /// `PATCH {prefix}/<pk>/`
    PartialUpdate,
    /// `DELETE {prefix}/<pk>/`
    Destroy,
}

impl Action {
    /// Every action, list actions first.
    pub const ALL: [Self; 6] = [
        Self::List,
        Self::Create,
        Self::Retrieve,
        Self::Update,
        Self::PartialUpdate,
        Self::Destroy,
    ];

    /// Returns the conventional snake-case action name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Retrieve => "retrieve",
            Self::Update => "update",
            Self::PartialUpdate => "partial_update",
            Self::Destroy => "destroy",
        }
    }

    /// Returns `true` for actions that operate on a single object.
    pub const fn is_detail(self) -> bool {
        !matches!(self, Self::List | Self::Create)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn not_implemented(action: Action) -> ApiError {
    ApiError::MethodNotAllowed(format!("Action \"{action}\" is not supported."))
}

/// A resource handler exposing some of the CRUD [`Action`]s.
///
/// Detail actions receive the lookup value captured from the URL. Returning
/// `Err` renders the error through its status code and JSON body.
#[async_trait]
pub trait ViewSet: Send + Sync {
    /// A human-readable name, used in logs and OPTIONS responses.
    fn name(&self) -> &str;

    /// The model this viewset serves. A router derives the default basename
    /// from it, lowercased.
    fn model_name(&self) -> Option<&str> {
        None
    }

    /// The URL keyword naming the object in detail routes.
    fn lookup_field(&self) -> &str {
        "pk"
    }

    /// The regex a lookup value must match.
    fn lookup_value_regex(&self) -> &str {
        "[^/.]+"
    }

    /// The actions this viewset implements.
    fn actions(&self) -> Vec<Action>;

    /// Returns `true` if `action` is implemented.
    fn supports(&self, action: Action) -> bool {
        self.actions().contains(&action)
    }

    async fn list(&self, _request: HttpRequest) -> ApiResult<HttpResponse> {
        Err(not_implemented(Action::List))
    }

    async fn create(&self, _request: HttpRequest) -> ApiResult<HttpResponse> {
        Err(not_implemented(Action::Create))
    }

    async fn retrieve(&self, _request: HttpRequest, _pk: String) -> ApiResult<HttpResponse> {
        Err(not_implemented(Action::Retrieve))
    }

    async fn update(&self, _request: HttpRequest, _pk: String) -> ApiResult<HttpResponse> {
        Err(not_implemented(Action::Update))
    }

    async fn partial_update(&self, _request: HttpRequest, _pk: String) -> ApiResult<HttpResponse> {
        Err(not_implemented(Action::PartialUpdate))
    }

    async fn destroy(&self, _request: HttpRequest, _pk: String) -> ApiResult<HttpResponse> {
        Err(not_implemented(Action::Destroy))
    }
}

/// Runs a single action on a viewset.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] when a detail action has no lookup value,
/// or whatever the action itself returns.
pub async fn perform(
    viewset: &dyn ViewSet,
    action: Action,
    request: HttpRequest,
) -> ApiResult<HttpResponse> {
    if !action.is_detail() {
        return match action {
            Action::List => viewset.list(request).await,
            _ => viewset.create(request).await,
        };
    }

    let pk = request
        .kwarg(viewset.lookup_field())
        .map(ToString::to_string)
        .ok_or_else(|| ApiError::NotFound("Not found.".to_string()))?;

    match action {
        Action::Retrieve => viewset.retrieve(request, pk).await,
        Action::Update => viewset.update(request, pk).await,
        Action::PartialUpdate => viewset.partial_update(request, pk).await,
        _ => viewset.destroy(request, pk).await,
    }
}

/// Binds a viewset to one route.
///
/// Methods in `method_map` run their action. HEAD runs the GET action,
/// OPTIONS describes the route, and any other method gets 405 with an
/// `Allow` header.
pub fn as_view(viewset: Arc<dyn ViewSet>, method_map: Vec<(Method, Action)>) -> RouteHandler {
    let method_map = Arc::new(method_map);

    Arc::new(move |request: HttpRequest| -> BoxFuture {
        let viewset = Arc::clone(&viewset);
        let method_map = Arc::clone(&method_map);

        Box::pin(async move {
            let method = request.method().clone();
            let lookup = if method == Method::HEAD {
                Method::GET
            } else {
                method.clone()
            };

            if let Some(action) = action_for(&method_map, &lookup) {
                tracing::debug!(viewset = viewset.name(), %action, %method, "viewset action");
                return match perform(viewset.as_ref(), action, request).await {
                    Ok(response) => response,
                    Err(err) => {
                        if err.status_code() >= 500 {
                            tracing::error!(viewset = viewset.name(), %action, error = %err, "action failed");
                        }
                        HttpResponse::from(err)
                    }
                };
            }

            let allowed = allowed_methods(&method_map);
            let allowed_strs: Vec<&str> = allowed.iter().map(String::as_str).collect();

            if method == Method::OPTIONS {
                let actions: serde_json::Map<String, serde_json::Value> = method_map
                    .iter()
                    .map(|(m, a)| (m.to_string(), serde_json::Value::from(a.as_str())))
                    .collect();
                let response = JsonResponse::with_status(
                    StatusCode::OK,
                    &serde_json::json!({ "name": viewset.name(), "actions": actions }),
                );
                return match http::HeaderValue::from_str(&allowed_strs.join(", ")) {
                    Ok(value) => response.with_header(http::header::ALLOW, value),
                    Err(_) => response,
                };
            }

            HttpResponse::not_allowed(&method, &allowed_strs)
        })
    })
}

fn action_for(method_map: &[(Method, Action)], method: &Method) -> Option<Action> {
    method_map
        .iter()
        .find(|(m, _)| m == method)
        .map(|(_, action)| *action)
}

/// The mapped methods, plus HEAD when GET is mapped, plus OPTIONS.
fn allowed_methods(method_map: &[(Method, Action)]) -> Vec<String> {
    let mut allowed: Vec<String> = method_map.iter().map(|(m, _)| m.to_string()).collect();
    if method_map.iter().any(|(m, _)| m == Method::GET) {
        allowed.push(Method::HEAD.to_string());
    }
    allowed.push(Method::OPTIONS.to_string());
    allowed
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use profiles_http::urls::resolver::ResolverMatch;

    use super::*;

    struct Notes;

    #[async_trait]
    impl ViewSet for Notes {
        fn name(&self) -> &str {
            "Notes"
        }

        fn actions(&self) -> Vec<Action> {
            vec![Action::List, Action::Retrieve, Action::Destroy]
        }

        async fn list(&self, _request: HttpRequest) -> ApiResult<HttpResponse> {
            Ok(JsonResponse::new(&serde_json::json!(["a", "b"])))
        }

        async fn retrieve(&self, _request: HttpRequest, pk: String) -> ApiResult<HttpResponse> {
            if pk == "404" {
                return Err(ApiError::NotFound("Not found.".into()));
            }
            Ok(JsonResponse::new(&serde_json::json!({ "id": pk })))
        }

        async fn destroy(&self, _request: HttpRequest, _pk: String) -> ApiResult<HttpResponse> {
            Ok(HttpResponse::no_content())
        }
    }

    fn detail_request(method: Method, pk: &str) -> HttpRequest {
        let mut request = HttpRequest::builder().method(method).build();
        let handler: RouteHandler = Arc::new(|_req| Box::pin(async { HttpResponse::ok("") }));
        request.set_resolver_match(ResolverMatch {
            func: handler,
            kwargs: HashMap::from([("pk".to_string(), pk.to_string())]),
            url_name: Some("notes-detail".into()),
            namespaces: Vec::new(),
            route: "notes/<pk>/".into(),
        });
        request
    }

    fn detail_view() -> RouteHandler {
        as_view(
            Arc::new(Notes),
            vec![(Method::GET, Action::Retrieve), (Method::DELETE, Action::Destroy)],
        )
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::PartialUpdate.as_str(), "partial_update");
        assert!(Action::Destroy.is_detail());
        assert!(!Action::Create.is_detail());
        assert_eq!(Action::ALL.len(), 6);
    }

    #[test]
    fn test_supports() {
        assert!(Notes.supports(Action::List));
        assert!(!Notes.supports(Action::Create));
    }

    #[tokio::test]
    async fn test_unimplemented_default_is_405() {
        let err = Notes.create(HttpRequest::builder().build()).await.unwrap_err();
        assert_eq!(err.status_code(), 405);
    }

    #[tokio::test]
    async fn test_detail_action_receives_pk() {
        let resp = detail_view()(detail_request(Method::GET, "3")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.json()["id"], "3");
    }

    #[tokio::test]
    async fn test_action_error_is_rendered() {
        let resp = detail_view()(detail_request(Method::GET, "404")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.json()["detail"], "Not found.");
    }

    #[tokio::test]
    async fn test_head_uses_get_action() {
        let resp = detail_view()(detail_request(Method::HEAD, "3")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unmapped_method_is_405_with_allow() {
        let resp = detail_view()(detail_request(Method::PUT, "3")).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            resp.headers().get(http::header::ALLOW).unwrap(),
            "GET, DELETE, HEAD, OPTIONS"
        );
    }

    #[tokio::test]
    async fn test_options_lists_actions() {
        let resp = detail_view()(detail_request(Method::OPTIONS, "3")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.json();
        assert_eq!(body["name"], "Notes");
        assert_eq!(body["actions"]["DELETE"], "destroy");
    }

    #[tokio::test]
    async fn test_detail_without_lookup_is_404() {
        let resp = detail_view()(HttpRequest::builder().build()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
