//! # profiles-api
//!
//! A profiles REST API: greeting endpoints, token login, user profiles and a
//! status feed, served through a Django REST framework style router.
//!
//! ## Modules
//!
//! - [`models`] - In-memory profile, feed item and token storage
//! - [`auth`] - Argon2 password hashing and token authentication
//! - [`serializers`] - Request validation and JSON representations
//! - [`views`] - The view and viewset handlers
//! - [`urls`] - The route table

pub mod auth;
pub mod models;
pub mod serializers;
pub mod urls;
pub mod views;

use std::sync::Arc;

use profiles_core::{ApiResult, Settings};
use profiles_views::middleware::builtin::{
    AllowedHostsMiddleware, RequestLoggingMiddleware, SecurityMiddleware,
};
use profiles_views::ProfilesApp;

pub use models::ProfileStore;

/// Assembles the application: route table plus the standard middleware.
///
/// # Errors
///
/// Returns [`ApiError::ImproperlyConfigured`](profiles_core::ApiError::ImproperlyConfigured)
/// if the route table cannot be built.
pub fn application(settings: &Settings, store: &Arc<ProfileStore>) -> ApiResult<ProfilesApp> {
    let url_conf = urls::build_urls(store, settings)?;
    Ok(ProfilesApp::new(settings.clone())
        .urls(url_conf)
        .middleware(RequestLoggingMiddleware)
        .middleware(AllowedHostsMiddleware::from_settings(settings))
        .middleware(SecurityMiddleware::default()))
}
