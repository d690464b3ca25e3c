//! Handlers for the profiles API.
//!
//! - [`HelloApiView`] - a class-based view answering every HTTP method
//! - [`HelloViewSet`] - the same greeting expressed as viewset actions
//! - [`UserLoginApiViewSet`] - exchanges credentials for a token
//! - [`UserProfileViewSet`] - CRUD over user profiles
//! - [`UserProfileFeedbackViewSet`] - CRUD over status feed items

mod feed;
mod hello;
mod login;
mod profiles;

pub use feed::UserProfileFeedbackViewSet;
pub use hello::{HelloApiView, HelloViewSet};
pub use login::UserLoginApiViewSet;
pub use profiles::UserProfileViewSet;

use profiles_core::{ApiError, ApiResult};
use profiles_http::HttpResponse;

/// Collapses a handler result into a response.
fn render(result: ApiResult<HttpResponse>) -> HttpResponse {
    result.unwrap_or_else(HttpResponse::from)
}

/// Parses a numeric primary key; anything else cannot name an object.
fn parse_pk(pk: &str) -> ApiResult<u64> {
    pk.parse()
        .map_err(|_| ApiError::NotFound("Not found.".to_string()))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Not found.".to_string())
}
