//! In-memory models for user profiles, feed items and auth tokens.
//!
//! [`ProfileStore`] owns every record behind one `RwLock`. Each method takes
//! the lock, copies what it needs and releases it before returning, so no
//! caller ever holds the lock across an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use profiles_core::{ApiError, ApiResult, ValidationError};

/// A registered user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: u64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_on: DateTime<Utc>,
}

/// A status update posted by a user.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeedItem {
    pub id: u64,
    /// The id of the posting [`UserProfile`].
    pub user_profile: u64,
    pub status_text: String,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    profiles: BTreeMap<u64, UserProfile>,
    feed: BTreeMap<u64, ProfileFeedItem>,
    /// Token key to profile id.
    tokens: HashMap<String, u64>,
    next_profile_id: u64,
    next_feed_id: u64,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        self.profiles
            .values()
            .any(|p| Some(p.id) != except && p.email.eq_ignore_ascii_case(email))
    }
}

/// Lowercases the domain part of an email address.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn duplicate_email() -> ApiError {
    ApiError::ValidationError(ValidationError::for_field(
        "email",
        "user profile with this email already exists.",
    ))
}

/// Shared storage for every model.
#[derive(Debug, Default)]
pub struct ProfileStore {
    tables: RwLock<Tables>,
}

impl ProfileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Profiles ────────────────────────────────────────────────────────

    /// Inserts a new profile. `password_hash` must already be hashed.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the email is already registered.
    pub fn create_profile(&self, email: &str, name: &str, password_hash: String) -> ApiResult<UserProfile> {
        let email = normalize_email(email);
        let mut tables = self.write();
        if tables.email_taken(&email, None) {
            return Err(duplicate_email());
        }

        tables.next_profile_id += 1;
        let profile = UserProfile {
            id: tables.next_profile_id,
            email,
            name: name.to_string(),
            password_hash,
            is_active: true,
            is_staff: false,
            created_on: Utc::now(),
        };
        tables.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    /// Returns every profile in id order.
    pub fn profiles(&self) -> Vec<UserProfile> {
        self.read().profiles.values().cloned().collect()
    }

    pub fn profile(&self, id: u64) -> Option<UserProfile> {
        self.read().profiles.get(&id).cloned()
    }

    /// Looks a profile up by email, ignoring case.
    pub fn profile_by_email(&self, email: &str) -> Option<UserProfile> {
        let email = normalize_email(email);
        self.read()
            .profiles
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(&email))
            .cloned()
    }

    /// Replaces a stored profile.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the profile no longer exists, or a
    /// validation error if its email now collides with another profile.
    pub fn save_profile(&self, mut profile: UserProfile) -> ApiResult<UserProfile> {
        profile.email = normalize_email(&profile.email);
        let mut tables = self.write();
        if !tables.profiles.contains_key(&profile.id) {
            return Err(ApiError::NotFound("Not found.".to_string()));
        }
        if tables.email_taken(&profile.email, Some(profile.id)) {
            return Err(duplicate_email());
        }
        tables.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    /// Deletes a profile together with its feed items and tokens.
    ///
    /// Returns `false` if no such profile exists.
    pub fn delete_profile(&self, id: u64) -> bool {
        let mut tables = self.write();
        if tables.profiles.remove(&id).is_none() {
            return false;
        }
        tables.feed.retain(|_, item| item.user_profile != id);
        tables.tokens.retain(|_, owner| *owner != id);
        true
    }

    // ── Feed ────────────────────────────────────────────────────────────

    /// Inserts a feed item owned by `user_profile`.
    pub fn create_feed_item(&self, user_profile: u64, status_text: &str) -> ProfileFeedItem {
        let mut tables = self.write();
        tables.next_feed_id += 1;
        let item = ProfileFeedItem {
            id: tables.next_feed_id,
            user_profile,
            status_text: status_text.to_string(),
            created_on: Utc::now(),
        };
        tables.feed.insert(item.id, item.clone());
        item
    }

    /// Returns every feed item in id order.
    pub fn feed_items(&self) -> Vec<ProfileFeedItem> {
        self.read().feed.values().cloned().collect()
    }

    pub fn feed_item(&self, id: u64) -> Option<ProfileFeedItem> {
        self.read().feed.get(&id).cloned()
    }

    /// Replaces a stored feed item.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the item no longer exists.
    pub fn save_feed_item(&self, item: ProfileFeedItem) -> ApiResult<ProfileFeedItem> {
        let mut tables = self.write();
        match tables.feed.get_mut(&item.id) {
            Some(slot) => {
                *slot = item.clone();
                Ok(item)
            }
            None => Err(ApiError::NotFound("Not found.".to_string())),
        }
    }

    /// Deletes a feed item. Returns `false` if it did not exist.
    pub fn delete_feed_item(&self, id: u64) -> bool {
        self.write().feed.remove(&id).is_some()
    }

    // ── Tokens ──────────────────────────────────────────────────────────

    /// Returns the profile's token, creating it with `generate` on first use.
    pub fn token_for(&self, profile_id: u64, generate: impl FnOnce() -> String) -> String {
        let mut tables = self.write();
        if let Some((key, _)) = tables.tokens.iter().find(|(_, owner)| **owner == profile_id) {
            return key.clone();
        }
        let key = generate();
        tables.tokens.insert(key.clone(), profile_id);
        key
    }

    /// Returns the id of the profile owning `key`.
    pub fn user_for_token(&self, key: &str) -> Option<u64> {
        self.read().tokens.get(key).copied()
    }
}
