//! Token login.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;

use profiles_core::{ApiError, ApiResult, ValidationError};
use profiles_http::{HttpRequest, HttpResponse, JsonResponse};
use profiles_views::views::class_based::View;

use super::render;
use crate::auth::{generate_token, verify_password};
use crate::models::ProfileStore;
use crate::serializers::LoginInput;

/// Exchanges `{"username", "password"}` for `{"token"}`.
///
/// The username is the account email. A profile keeps the same token across
/// logins.
#[derive(Debug, Clone)]
pub struct UserLoginApiViewSet {
    store: Arc<ProfileStore>,
}

impl UserLoginApiViewSet {
    pub const fn new(store: Arc<ProfileStore>) -> Self {
        Self { store }
    }

    async fn login(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        let data = request.data()?;
        let input = LoginInput::parse(&data).map_err(ApiError::ValidationError)?;

        let invalid = || {
            ApiError::ValidationError(ValidationError::new(
                "Unable to log in with provided credentials.",
                "authorization",
            ))
        };

        let profile = self.store.profile_by_email(&input.username).ok_or_else(invalid)?;
        if !profile.is_active || !verify_password(&input.password, &profile.password_hash).await? {
            tracing::info!(user_id = profile.id, "login rejected");
            return Err(invalid());
        }

        let token = self.store.token_for(profile.id, generate_token);
        tracing::info!(user_id = profile.id, "login succeeded");
        Ok(JsonResponse::new(&serde_json::json!({ "token": token })))
    }
}

#[async_trait]
impl View for UserLoginApiViewSet {
    fn name(&self) -> &str {
        "User Login Api"
    }

    fn allowed_methods(&self) -> Vec<Method> {
        vec![Method::POST, Method::OPTIONS]
    }

    async fn post(&self, request: HttpRequest) -> HttpResponse {
        render(self.login(&request).await)
    }

    async fn head(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }
}
