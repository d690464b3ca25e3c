//! The status feed resource.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;

use profiles_core::{ApiError, ApiResult};
use profiles_http::{HttpRequest, HttpResponse, JsonResponse};
use profiles_views::{Action, ViewSet};

use super::{not_found, parse_pk};
use crate::auth::{authenticate, not_authenticated, permission_denied, require_user};
use crate::models::{ProfileFeedItem, ProfileStore};
use crate::serializers::{feed_item_representation, FeedItemInput};

/// CRUD over feed items.
///
/// Reading is public. Posting needs a token and stamps the item with the
/// caller; editing and deleting are limited to the item's author.
#[derive(Debug, Clone)]
pub struct UserProfileFeedbackViewSet {
    store: Arc<ProfileStore>,
}

impl UserProfileFeedbackViewSet {
    pub const fn new(store: Arc<ProfileStore>) -> Self {
        Self { store }
    }

    fn owned_item(&self, request: &HttpRequest, pk: &str) -> ApiResult<ProfileFeedItem> {
        let caller = authenticate(request, &self.store)?;
        let item = self.store.feed_item(parse_pk(pk)?).ok_or_else(not_found)?;
        match caller {
            None => Err(not_authenticated()),
            Some(id) if id == item.user_profile => Ok(item),
            Some(_) => Err(permission_denied()),
        }
    }

    fn write(&self, request: &HttpRequest, pk: &str, partial: bool) -> ApiResult<HttpResponse> {
        let mut item = self.owned_item(request, pk)?;
        let input = FeedItemInput::parse(&request.data()?, partial).map_err(ApiError::ValidationError)?;
        if let Some(status_text) = input.status_text {
            item.status_text = status_text;
        }
        let item = self.store.save_feed_item(item)?;
        Ok(JsonResponse::new(&feed_item_representation(&item)))
    }
}

#[async_trait]
impl ViewSet for UserProfileFeedbackViewSet {
    fn name(&self) -> &str {
        "User Profile Feed"
    }

    fn model_name(&self) -> Option<&str> {
        Some("ProfileFeedItem")
    }

    fn actions(&self) -> Vec<Action> {
        Action::ALL.to_vec()
    }

    async fn list(&self, _request: HttpRequest) -> ApiResult<HttpResponse> {
        let items: Vec<serde_json::Value> = self
            .store
            .feed_items()
            .iter()
            .map(feed_item_representation)
            .collect();
        Ok(JsonResponse::new(&items))
    }

    async fn create(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let user_id = require_user(&request, &self.store)?;
        let input = FeedItemInput::parse(&request.data()?, false).map_err(ApiError::ValidationError)?;
        let status_text = input.status_text.unwrap_or_default();

        let item = self.store.create_feed_item(user_id, &status_text);
        tracing::debug!(user_id, item = item.id, "feed item posted");
        Ok(JsonResponse::with_status(
            StatusCode::CREATED,
            &feed_item_representation(&item),
        ))
    }

    async fn retrieve(&self, _request: HttpRequest, pk: String) -> ApiResult<HttpResponse> {
        let item = self.store.feed_item(parse_pk(&pk)?).ok_or_else(not_found)?;
        Ok(JsonResponse::new(&feed_item_representation(&item)))
    }

    async fn update(&self, request: HttpRequest, pk: String) -> ApiResult<HttpResponse> {
        self.write(&request, &pk, false)
    }

    async fn partial_update(&self, request: HttpRequest, pk: String) -> ApiResult<HttpResponse> {
        self.write(&request, &pk, true)
    }

    async fn destroy(&self, request: HttpRequest, pk: String) -> ApiResult<HttpResponse> {
        let item = self.owned_item(&request, &pk)?;
        if !self.store.delete_feed_item(item.id) {
            return Err(not_found());
        }
        Ok(HttpResponse::no_content())
    }
}
