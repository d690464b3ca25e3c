//! The route table.
//!
//! Explicit routes come first so a literal path always wins over a
//! router-generated pattern:
//!
//! | Pattern                | Handler                      | Name                     |
//! |------------------------|------------------------------|--------------------------|
//! | `hello-view/`          | `HelloApiView`               |                          |
//! | `login/`               | `UserLoginApiViewSet`        |                          |
//! | ``                     | API root                     | `api-root`               |
//! | `hello-viewset/`       | `HelloViewSet`               | `hello-viewset-list`     |
//! | `hello-viewset/<pk>/`  | `HelloViewSet`               | `hello-viewset-detail`   |
//! | `profile/`             | `UserProfileViewSet`         | `userprofile-list`       |
//! | `profile/<pk>/`        | `UserProfileViewSet`         | `userprofile-detail`     |
//! | `feed/`                | `UserProfileFeedbackViewSet` | `profilefeeditem-list`   |
//! | `feed/<pk>/`           | `UserProfileFeedbackViewSet` | `profilefeeditem-detail` |

use std::sync::Arc;

use profiles_core::{ApiResult, Settings};
use profiles_http::urls::pattern::path;
use profiles_http::urls::resolver::{include, root, URLEntry, URLResolver};
use profiles_views::views::class_based::View;
use profiles_views::views::into_handler;
use profiles_views::DefaultRouter;

use crate::models::ProfileStore;
use crate::views::{
    HelloApiView, HelloViewSet, UserLoginApiViewSet, UserProfileFeedbackViewSet, UserProfileViewSet,
};

/// Registers the viewsets on a router configured from `settings`.
///
/// # Errors
///
/// Returns [`ApiError::ImproperlyConfigured`](profiles_core::ApiError::ImproperlyConfigured)
/// if a basename is missing or registered twice.
pub fn api_router(store: &Arc<ProfileStore>, settings: &Settings) -> ApiResult<DefaultRouter> {
    let mut router = DefaultRouter::new().with_trailing_slash(settings.trailing_slash);
    router.register("hello-viewset", Arc::new(HelloViewSet), Some("hello-viewset"))?;
    router.register("profile", Arc::new(UserProfileViewSet::new(Arc::clone(store))), None)?;
    router.register(
        "feed",
        Arc::new(UserProfileFeedbackViewSet::new(Arc::clone(store))),
        None,
    )?;
    Ok(router)
}

/// Builds the complete, immutable route table.
///
/// # Errors
///
/// Returns [`ApiError::ImproperlyConfigured`](profiles_core::ApiError::ImproperlyConfigured)
/// if the router rejects a registration or a pattern is malformed.
pub fn build_urls(store: &Arc<ProfileStore>, settings: &Settings) -> ApiResult<URLResolver> {
    let router = api_router(store, settings)?;

    let urlpatterns = vec![
        URLEntry::Pattern(path("hello-view/", into_handler(HelloApiView.as_view()), None)?),
        URLEntry::Pattern(path(
            "login/",
            into_handler(UserLoginApiViewSet::new(Arc::clone(store)).as_view()),
            None,
        )?),
        URLEntry::Resolver(include("", router.urls()?, None)?),
    ];

    let api = include(&settings.normalized_api_prefix(), urlpatterns, None)?;
    let resolver = root(vec![URLEntry::Resolver(api)])?;
    tracing::info!(
        routes = resolver.collect_routes().len(),
        prefix = %settings.normalized_api_prefix(),
        "route table built"
    );
    Ok(resolver)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use profiles_http::urls::reverse::reverse;

    use super::*;

    fn resolver(settings: &Settings) -> URLResolver {
        build_urls(&Arc::new(ProfileStore::new()), settings).unwrap()
    }

    #[test]
    fn test_explicit_routes_come_first() {
        let routes = resolver(&Settings::default()).collect_routes();
        let patterns: Vec<&str> = routes.iter().map(|(route, _, _)| route.as_str()).collect();
        assert_eq!(patterns[0], "hello-view/");
        assert_eq!(patterns[1], "login/");
        assert_eq!(patterns[2], "");
        assert!(patterns.contains(&"feed/<pk>/"));
    }

    #[test]
    fn test_route_names() {
        let routes = resolver(&Settings::default()).collect_routes();
        let names: Vec<String> = routes.into_iter().filter_map(|(_, name, _)| name).collect();
        for expected in [
            "api-root",
            "hello-viewset-list",
            "hello-viewset-detail",
            "userprofile-list",
            "userprofile-detail",
            "profilefeeditem-list",
            "profilefeeditem-detail",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }

    #[test]
    fn test_resolves_detail_kwargs() {
        let m = resolver(&Settings::default()).resolve("feed/3/").unwrap();
        assert_eq!(m.url_name.as_deref(), Some("profilefeeditem-detail"));
        assert_eq!(m.kwargs["pk"], "3");
    }

    #[test]
    fn test_reverse_under_prefix() {
        let settings = Settings {
            api_prefix: "api".to_string(),
            ..Settings::default()
        };
        let resolver = resolver(&settings);
        let kwargs = HashMap::from([("pk", "7")]);
        assert_eq!(
            reverse("userprofile-detail", &kwargs, &resolver).unwrap(),
            "/api/profile/7/"
        );
        assert!(resolver.resolve("profile/").is_err());
    }

    #[test]
    fn test_duplicate_basename_is_fatal() {
        let store = Arc::new(ProfileStore::new());
        let mut router = api_router(&store, &Settings::default()).unwrap();
        let err = router
            .register("people", Arc::new(UserProfileViewSet::new(store)), None)
            .unwrap_err();
        assert!(matches!(err, profiles_core::ApiError::ImproperlyConfigured(_)));
    }

    #[test]
    fn test_viewset_without_model_needs_basename() {
        let mut router = DefaultRouter::new();
        assert!(router.register("hello", Arc::new(HelloViewSet), None).is_err());
    }
}
