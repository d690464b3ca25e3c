//! Request validation and response representations.
//!
//! Inputs arrive as the JSON value produced by [`HttpRequest::data`]. Each
//! parser collects every field error before failing, so a client sees all
//! problems in one 400 response.
//!
//! [`HttpRequest::data`]: profiles_http::HttpRequest::data

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use profiles_core::ValidationError;

use crate::models::{ProfileFeedItem, UserProfile};

/// Longest name the hello endpoints accept.
pub const HELLO_NAME_MAX_LENGTH: usize = 10;
pub const EMAIL_MAX_LENGTH: usize = 255;
pub const NAME_MAX_LENGTH: usize = 255;
pub const STATUS_TEXT_MAX_LENGTH: usize = 255;
pub const PASSWORD_MAX_LENGTH: usize = 128;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid email regex"))
}

/// Rejects anything but a JSON object.
fn expect_object(data: &Value) -> Result<&serde_json::Map<String, Value>, ValidationError> {
    data.as_object().ok_or_else(|| {
        let kind = match data {
            Value::Array(_) => "list",
            Value::String(_) => "str",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            _ => "null",
        };
        ValidationError::new(
            format!("Invalid data. Expected a dictionary, but got {kind}."),
            "invalid",
        )
    })
}

/// Reads one string field, recording any problem in `errors`.
fn char_field(
    data: &serde_json::Map<String, Value>,
    field: &str,
    required: bool,
    max_length: usize,
    errors: &mut ValidationError,
) -> Option<String> {
    let value = match data.get(field) {
        None | Some(Value::Null) => {
            if required {
                errors.add(field, "This field is required.");
            }
            return None;
        }
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            errors.add(field, "Not a valid string.");
            return None;
        }
    };

    if value.is_empty() {
        errors.add(field, "This field may not be blank.");
        return None;
    }
    if value.chars().count() > max_length {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_length} characters."),
        );
        return None;
    }
    Some(value)
}

fn finish<T>(value: T, errors: ValidationError) -> Result<T, ValidationError> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

/// Validates the `{"name"}` body the hello endpoints accept.
///
/// # Examples
///
/// ```
/// use profiles_api::serializers::validate_hello;
///
/// assert_eq!(validate_hello(&serde_json::json!({"name": "Ann"})).unwrap(), "Ann");
/// assert!(validate_hello(&serde_json::json!({"name": "Bartholomew"})).is_err());
/// ```
pub fn validate_hello(data: &Value) -> Result<String, ValidationError> {
    let data = expect_object(data)?;
    let mut errors = ValidationError::default();
    let name = char_field(data, "name", true, HELLO_NAME_MAX_LENGTH, &mut errors);
    match name {
        Some(name) if errors.is_empty() => Ok(name),
        _ => Err(errors),
    }
}

/// Writable profile fields. `None` means "leave unchanged" for partial
/// updates; full writes require every field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileInput {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

impl ProfileInput {
    /// Parses a create or update body. With `partial`, no field is required.
    pub fn parse(data: &Value, partial: bool) -> Result<Self, ValidationError> {
        let data = expect_object(data)?;
        let mut errors = ValidationError::default();

        let email = char_field(data, "email", !partial, EMAIL_MAX_LENGTH, &mut errors);
        let email = match email {
            Some(email) if !email_regex().is_match(&email) => {
                errors.add("email", "Enter a valid email address.");
                None
            }
            other => other,
        };
        let name = char_field(data, "name", !partial, NAME_MAX_LENGTH, &mut errors);
        let password = char_field(data, "password", !partial, PASSWORD_MAX_LENGTH, &mut errors);

        finish(Self { email, name, password }, errors)
    }
}

/// The writable feed item field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItemInput {
    pub status_text: Option<String>,
}

impl FeedItemInput {
    /// Parses a create or update body. With `partial`, `status_text` may be
    /// omitted.
    pub fn parse(data: &Value, partial: bool) -> Result<Self, ValidationError> {
        let data = expect_object(data)?;
        let mut errors = ValidationError::default();
        let status_text = char_field(data, "status_text", !partial, STATUS_TEXT_MAX_LENGTH, &mut errors);
        finish(Self { status_text }, errors)
    }
}

/// Login credentials. The username is the account email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl LoginInput {
    pub fn parse(data: &Value) -> Result<Self, ValidationError> {
        let data = expect_object(data)?;
        let mut errors = ValidationError::default();
        let username = char_field(data, "username", true, EMAIL_MAX_LENGTH, &mut errors);
        let password = char_field(data, "password", true, PASSWORD_MAX_LENGTH, &mut errors);
        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => Ok(Self { username, password }),
            _ => Err(errors),
        }
    }
}

/// The public view of a profile: the password never leaves the server.
pub fn profile_representation(profile: &UserProfile) -> Value {
    serde_json::json!({
        "id": profile.id,
        "email": profile.email,
        "name": profile.name,
    })
}

pub fn feed_item_representation(item: &ProfileFeedItem) -> Value {
    serde_json::json!({
        "id": item.id,
        "user_profile": item.user_profile,
        "status_text": item.status_text,
        "created_on": item.created_on.to_rfc3339(),
    })
}
