//! Password hashing and token authentication.
//!
//! Hashing runs Argon2id on the blocking pool through
//! `tokio::task::spawn_blocking`. Clients authenticate with an
//! `Authorization: Token <key>` header; keys are issued by the login view.

use profiles_core::{ApiError, ApiResult};
use profiles_http::HttpRequest;

use crate::models::ProfileStore;

/// The scheme word expected in the `Authorization` header.
pub const TOKEN_KEYWORD: &str = "Token";

/// Hashes a password with Argon2id and a random salt.
pub async fn hash_password(password: &str) -> ApiResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        use argon2::password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString};
        use argon2::Argon2;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::InternalServerError(format!("Argon2 hash error: {e}")))?;
        Ok(hash.to_string())
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("Task join error: {e}")))?
}

/// Checks a password against an encoded Argon2 hash.
///
/// A hash that does not parse never matches.
pub async fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        use argon2::password_hash::{PasswordHash, PasswordVerifier as _};
        use argon2::Argon2;

        let Ok(parsed) = PasswordHash::new(&hash) else {
            tracing::warn!("stored password hash does not parse");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("Task join error: {e}")))
}

/// Generates a new token key.
pub fn generate_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Identifies the caller from the `Authorization` header.
///
/// Returns `Ok(None)` for anonymous requests, including requests using a
/// different scheme.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] for a malformed token header or an
/// unknown key.
pub fn authenticate(request: &HttpRequest, store: &ProfileStore) -> ApiResult<Option<u64>> {
    let Some(header) = request.header(http::header::AUTHORIZATION.as_str()) else {
        return Ok(None);
    };

    let mut parts = header.split_whitespace();
    if !parts
        .next()
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(TOKEN_KEYWORD))
    {
        return Ok(None);
    }

    let key = match (parts.next(), parts.next()) {
        (Some(key), None) => key,
        (None, _) => {
            return Err(ApiError::Unauthorized(
                "Invalid token header. No credentials provided.".to_string(),
            ))
        }
        (Some(_), Some(_)) => {
            return Err(ApiError::Unauthorized(
                "Invalid token header. Token string should not contain spaces.".to_string(),
            ))
        }
    };

    match store.user_for_token(key) {
        Some(user_id) => Ok(Some(user_id)),
        None => Err(ApiError::Unauthorized("Invalid token.".to_string())),
    }
}

/// Like [`authenticate`], but anonymous requests are rejected too.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] unless a valid token is presented.
pub fn require_user(request: &HttpRequest, store: &ProfileStore) -> ApiResult<u64> {
    authenticate(request, store)?.ok_or_else(not_authenticated)
}

/// The error for a request that needs credentials but sent none.
pub fn not_authenticated() -> ApiError {
    ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
}

/// The error for an authenticated caller acting on someone else's object.
pub fn permission_denied() -> ApiError {
    ApiError::PermissionDenied("You do not have permission to perform this action.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: &str) -> HttpRequest {
        HttpRequest::builder().header("authorization", value).build()
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("correct horse").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_unique_salts() {
        let a = hash_password("same").await.unwrap();
        let b = hash_password("same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_verify_garbage_hash_is_false() {
        assert!(!verify_password("pw", "not-a-hash").await.unwrap());
    }

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_authenticate() {
        let store = ProfileStore::new();
        let profile = store.create_profile("a@b.co", "A", "h".into()).unwrap();
        let key = store.token_for(profile.id, generate_token);

        let anonymous = HttpRequest::builder().build();
        assert_eq!(authenticate(&anonymous, &store).unwrap(), None);
        assert_eq!(require_user(&anonymous, &store).unwrap_err().status_code(), 401);

        let basic = request_with_auth("Basic abc");
        assert_eq!(authenticate(&basic, &store).unwrap(), None);

        let valid = request_with_auth(&format!("Token {key}"));
        assert_eq!(authenticate(&valid, &store).unwrap(), Some(profile.id));
        assert_eq!(require_user(&valid, &store).unwrap(), profile.id);

        for bad in ["Token", "Token a b", "Token unknown"] {
            let err = authenticate(&request_with_auth(bad), &store).unwrap_err();
            assert_eq!(err.status_code(), 401, "{bad}");
        }
    }
}
