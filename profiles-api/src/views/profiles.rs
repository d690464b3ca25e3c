//! The user profile resource.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;

use profiles_core::{ApiError, ApiResult};
use profiles_http::{HttpRequest, HttpResponse, JsonResponse};
use profiles_views::{Action, ViewSet};

use super::{not_found, parse_pk};
use crate::auth::{authenticate, hash_password, not_authenticated, permission_denied};
use crate::models::{ProfileStore, UserProfile};
use crate::serializers::{profile_representation, ProfileInput};

/// CRUD over user profiles.
///
/// Anyone may list, search, retrieve and register. Changing or deleting a
/// profile requires a token belonging to that profile.
#[derive(Debug, Clone)]
pub struct UserProfileViewSet {
    store: Arc<ProfileStore>,
}

/// Returns `true` if every search term appears in the name or the email.
///
/// Terms are separated by whitespace or commas and compared without case.
fn matches_search(profile: &UserProfile, search: &str) -> bool {
    let name = profile.name.to_lowercase();
    let email = profile.email.to_lowercase();
    search
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .all(|term| name.contains(&term) || email.contains(&term))
}

impl UserProfileViewSet {
    pub const fn new(store: Arc<ProfileStore>) -> Self {
        Self { store }
    }

    /// Loads the profile named by `pk` and checks the caller owns it.
    fn owned_profile(&self, request: &HttpRequest, pk: &str) -> ApiResult<UserProfile> {
        let caller = authenticate(request, &self.store)?;
        let profile = self.store.profile(parse_pk(pk)?).ok_or_else(not_found)?;
        match caller {
            None => Err(not_authenticated()),
            Some(id) if id == profile.id => Ok(profile),
            Some(id) => {
                tracing::warn!(caller = id, profile = profile.id, "profile change refused");
                Err(permission_denied())
            }
        }
    }

    async fn write(&self, request: &HttpRequest, pk: &str, partial: bool) -> ApiResult<HttpResponse> {
        let mut profile = self.owned_profile(request, pk)?;
        let input = ProfileInput::parse(&request.data()?, partial).map_err(ApiError::ValidationError)?;

        if let Some(email) = input.email {
            profile.email = email;
        }
        if let Some(name) = input.name {
            profile.name = name;
        }
        if let Some(password) = input.password {
            profile.password_hash = hash_password(&password).await?;
        }

        let profile = self.store.save_profile(profile)?;
        Ok(JsonResponse::new(&profile_representation(&profile)))
    }
}

#[async_trait]
impl ViewSet for UserProfileViewSet {
    fn name(&self) -> &str {
        "User Profile"
    }

    fn model_name(&self) -> Option<&str> {
        Some("UserProfile")
    }

    fn actions(&self) -> Vec<Action> {
        Action::ALL.to_vec()
    }

    async fn list(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let search = request.query().get("search").unwrap_or("");
        let profiles: Vec<serde_json::Value> = self
            .store
            .profiles()
            .iter()
            .filter(|p| matches_search(p, search))
            .map(profile_representation)
            .collect();
        Ok(JsonResponse::new(&profiles))
    }

    async fn create(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let input = ProfileInput::parse(&request.data()?, false).map_err(ApiError::ValidationError)?;
        let (Some(email), Some(name), Some(password)) = (input.email, input.name, input.password) else {
            return Err(ApiError::BadRequest("Incomplete profile.".to_string()));
        };

        let password_hash = hash_password(&password).await?;
        let profile = self.store.create_profile(&email, &name, password_hash)?;
        tracing::info!(user_id = profile.id, "profile created");
        Ok(JsonResponse::with_status(
            StatusCode::CREATED,
            &profile_representation(&profile),
        ))
    }

    async fn retrieve(&self, _request: HttpRequest, pk: String) -> ApiResult<HttpResponse> {
        let profile = self.store.profile(parse_pk(&pk)?).ok_or_else(not_found)?;
        Ok(JsonResponse::new(&profile_representation(&profile)))
    }

    async fn update(&self, request: HttpRequest, pk: String) -> ApiResult<HttpResponse> {
        self.write(&request, &pk, false).await
    }

    async fn partial_update(&self, request: HttpRequest, pk: String) -> ApiResult<HttpResponse> {
        self.write(&request, &pk, true).await
    }

    async fn destroy(&self, request: HttpRequest, pk: String) -> ApiResult<HttpResponse> {
        let profile = self.owned_profile(&request, &pk)?;
        if !self.store.delete_profile(profile.id) {
            return Err(not_found());
        }
        tracing::info!(user_id = profile.id, "profile deleted");
        Ok(HttpResponse::no_content())
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use serde_json::json;

    use super::*;
    use crate::auth::generate_token;

    fn viewset() -> (UserProfileViewSet, Arc<ProfileStore>) {
        let store = Arc::new(ProfileStore::new());
        (UserProfileViewSet::new(Arc::clone(&store)), store)
    }

    fn post(body: &serde_json::Value) -> HttpRequest {
        HttpRequest::builder().method(Method::POST).json(body).build()
    }

    fn authed(method: Method, token: &str, body: &serde_json::Value) -> HttpRequest {
        HttpRequest::builder()
            .method(method)
            .header("authorization", &format!("Token {token}"))
            .json(body)
            .build()
    }

    #[test]
    fn test_matches_search() {
        let store = ProfileStore::new();
        let ann = store.create_profile("ann@example.com", "Ann Lee", "h".into()).unwrap();
        assert!(matches_search(&ann, ""));
        assert!(matches_search(&ann, "LEE"));
        assert!(matches_search(&ann, "ann, example"));
        assert!(!matches_search(&ann, "ann bob"));
    }

    #[tokio::test]
    async fn test_create_and_retrieve() {
        let (vs, _) = viewset();
        let resp = vs
            .create(post(&json!({"email": "ann@example.com", "name": "Ann", "password": "pw"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.json(), json!({"id": 1, "email": "ann@example.com", "name": "Ann"}));

        let resp = vs.retrieve(HttpRequest::builder().build(), "1".into()).await.unwrap();
        assert_eq!(resp.json()["name"], "Ann");

        let err = vs.retrieve(HttpRequest::builder().build(), "9".into()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_create_invalid_and_duplicate() {
        let (vs, _) = viewset();
        let body = json!({"email": "ann@example.com", "name": "Ann", "password": "pw"});
        assert_eq!(vs.create(post(&json!({}))).await.unwrap_err().status_code(), 400);
        vs.create(post(&body)).await.unwrap();
        assert_eq!(vs.create(post(&body)).await.unwrap_err().status_code(), 400);
    }

    #[tokio::test]
    async fn test_list_search() {
        let (vs, store) = viewset();
        store.create_profile("ann@example.com", "Ann", "h".into()).unwrap();
        store.create_profile("bob@test.org", "Bob", "h".into()).unwrap();

        let all = vs.list(HttpRequest::builder().build()).await.unwrap();
        assert_eq!(all.json().as_array().unwrap().len(), 2);

        let request = HttpRequest::builder().query_string("search=test.org").build();
        let found = vs.list(request).await.unwrap().json();
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["name"], "Bob");
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let (vs, store) = viewset();
        let ann = store.create_profile("ann@example.com", "Ann", "h".into()).unwrap();
        let bob = store.create_profile("bob@example.com", "Bob", "h".into()).unwrap();
        let bob_token = store.token_for(bob.id, generate_token);
        let ann_token = store.token_for(ann.id, generate_token);
        let patch = json!({"name": "Annie"});

        let anonymous = HttpRequest::builder().method(Method::PATCH).json(&patch).build();
        let err = vs.partial_update(anonymous, ann.id.to_string()).await.unwrap_err();
        assert_eq!(err.status_code(), 401);

        let err = vs
            .partial_update(authed(Method::PATCH, &bob_token, &patch), ann.id.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let resp = vs
            .partial_update(authed(Method::PATCH, &ann_token, &patch), ann.id.to_string())
            .await
            .unwrap();
        assert_eq!(resp.json()["name"], "Annie");
        assert_eq!(store.profile(ann.id).unwrap().email, "ann@example.com");
    }

    #[tokio::test]
    async fn test_full_update_requires_every_field() {
        let (vs, store) = viewset();
        let ann = store.create_profile("ann@example.com", "Ann", "h".into()).unwrap();
        let token = store.token_for(ann.id, generate_token);

        let err = vs
            .update(authed(Method::PUT, &token, &json!({"name": "A"})), ann.id.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let body = json!({"email": "a@example.com", "name": "A", "password": "new"});
        let resp = vs.update(authed(Method::PUT, &token, &body), ann.id.to_string()).await.unwrap();
        assert_eq!(resp.json()["email"], "a@example.com");
        assert_ne!(store.profile(ann.id).unwrap().password_hash, "h");
    }

    #[tokio::test]
    async fn test_destroy_own_profile() {
        let (vs, store) = viewset();
        let ann = store.create_profile("ann@example.com", "Ann", "h".into()).unwrap();
        let token = store.token_for(ann.id, generate_token);

        let resp = vs
            .destroy(authed(Method::DELETE, &token, &json!({})), ann.id.to_string())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(store.profile(ann.id).is_none());
    }
}
