//! The greeting endpoints.

use async_trait::async_trait;
use http::Method;

use profiles_core::{ApiError, ApiResult};
use profiles_http::{HttpRequest, HttpResponse, JsonResponse};
use profiles_views::views::class_based::View;
use profiles_views::{Action, ViewSet};

use super::render;
use crate::serializers::validate_hello;

const AN_APIVIEW: [&str; 4] = [
    "Uses HTTP methods as function (get, post, patch, put, delete)",
    "Is similar to a traditional Django View",
    "Gives you the most control over your application logic",
    "Is mapped manually to URLs",
];

const A_VIEWSET: [&str; 3] = [
    "Uses actions (list, create, retrieve, update, partial_update)",
    "Automatically maps to URLs using Routers",
    "Provides more functionality with less code",
];

/// Reads `name` from the body and greets it.
fn greet(request: &HttpRequest, suffix: &str) -> ApiResult<HttpResponse> {
    let data = request.data()?;
    let name = validate_hello(&data).map_err(ApiError::ValidationError)?;
    Ok(JsonResponse::new(
        &serde_json::json!({ "message": format!("Hello {name}{suffix}") }),
    ))
}

/// A class-based view: one handler per HTTP method.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloApiView;

impl HelloApiView {
    fn echo_method(method: &Method) -> HttpResponse {
        JsonResponse::new(&serde_json::json!({ "method": method.as_str() }))
    }
}

#[async_trait]
impl View for HelloApiView {
    fn name(&self) -> &str {
        "Hello Api"
    }

    async fn get(&self, _request: HttpRequest) -> HttpResponse {
        JsonResponse::new(&serde_json::json!({
            "message": "Hello!",
            "an_apiview": AN_APIVIEW,
        }))
    }

    async fn post(&self, request: HttpRequest) -> HttpResponse {
        render(greet(&request, ""))
    }

    async fn put(&self, request: HttpRequest) -> HttpResponse {
        Self::echo_method(request.method())
    }

    async fn patch(&self, request: HttpRequest) -> HttpResponse {
        Self::echo_method(request.method())
    }

    async fn delete(&self, request: HttpRequest) -> HttpResponse {
        Self::echo_method(request.method())
    }
}

/// The greeting as a viewset. It has no model, so it must be registered
/// with an explicit basename.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloViewSet;

impl HelloViewSet {
    fn echo_method(method: &str) -> HttpResponse {
        JsonResponse::new(&serde_json::json!({ "http_method": method }))
    }
}

#[async_trait]
impl ViewSet for HelloViewSet {
    fn name(&self) -> &str {
        "Hello"
    }

    fn actions(&self) -> Vec<Action> {
        Action::ALL.to_vec()
    }

    async fn list(&self, _request: HttpRequest) -> ApiResult<HttpResponse> {
        Ok(JsonResponse::new(&serde_json::json!({
            "message": "Hello!",
            "a_viewset": A_VIEWSET,
        })))
    }

    async fn create(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        greet(&request, "!")
    }

    async fn retrieve(&self, _request: HttpRequest, _pk: String) -> ApiResult<HttpResponse> {
        Ok(Self::echo_method("GET"))
    }

    async fn update(&self, _request: HttpRequest, _pk: String) -> ApiResult<HttpResponse> {
        Ok(Self::echo_method("PUT"))
    }

    async fn partial_update(&self, _request: HttpRequest, _pk: String) -> ApiResult<HttpResponse> {
        Ok(Self::echo_method("PATCH"))
    }

    async fn destroy(&self, _request: HttpRequest, _pk: String) -> ApiResult<HttpResponse> {
        Ok(Self::echo_method("DELETE"))
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    fn json_request(method: Method, body: &serde_json::Value) -> HttpRequest {
        HttpRequest::builder().method(method).json(body).build()
    }

    #[tokio::test]
    async fn test_api_view_get() {
        let resp = HelloApiView.dispatch(HttpRequest::builder().build()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.json();
        assert_eq!(body["message"], "Hello!");
        assert_eq!(body["an_apiview"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_api_view_post_greets() {
        let resp = HelloApiView
            .dispatch(json_request(Method::POST, &serde_json::json!({"name": "Ann"})))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.json()["message"], "Hello Ann");
    }

    #[tokio::test]
    async fn test_api_view_post_invalid_is_400() {
        let resp = HelloApiView
            .dispatch(json_request(Method::POST, &serde_json::json!({"name": "ElevenChars"})))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.json()["name"].is_array());
    }

    #[tokio::test]
    async fn test_api_view_echoes_method() {
        for method in [Method::PUT, Method::PATCH, Method::DELETE] {
            let resp = HelloApiView
                .dispatch(HttpRequest::builder().method(method.clone()).build())
                .await;
            assert_eq!(resp.json()["method"], method.as_str());
        }
    }

    #[tokio::test]
    async fn test_viewset_actions() {
        let request = || HttpRequest::builder().build();

        let list = HelloViewSet.list(request()).await.unwrap();
        assert_eq!(list.json()["a_viewset"].as_array().unwrap().len(), 3);

        let created = HelloViewSet
            .create(json_request(Method::POST, &serde_json::json!({"name": "Bo"})))
            .await
            .unwrap();
        assert_eq!(created.json()["message"], "Hello Bo!");

        let destroyed = HelloViewSet.destroy(request(), "1".into()).await.unwrap();
        assert_eq!(destroyed.json()["http_method"], "DELETE");
    }

    #[tokio::test]
    async fn test_viewset_create_invalid() {
        let err = HelloViewSet
            .create(json_request(Method::POST, &serde_json::json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
