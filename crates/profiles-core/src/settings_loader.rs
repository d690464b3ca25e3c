//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `PROFILES_DEBUG` | `debug` |
//! | `PROFILES_ALLOWED_HOSTS` | `allowed_hosts` (comma-separated) |
//! | `PROFILES_BIND_ADDRESS` | `bind_address` |
//! | `PROFILES_API_PREFIX` | `api_prefix` |
//! | `PROFILES_TRAILING_SLASH` | `trailing_slash` |
//! | `PROFILES_LOG_LEVEL` | `log_level` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use profiles_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("profiles.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::ApiError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Keys missing from the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, ApiError> {
    // Merge through serde_json so absent keys fall back to the defaults.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| ApiError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    let json_value = toml_to_json(toml_value);
    merge_over_defaults(json_value, "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, ApiError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        ApiError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, ApiError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, ApiError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ApiError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a file, choosing the format from its extension.
///
/// `.json` files are read as JSON, everything else as TOML. Environment
/// overrides are applied afterwards.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, ApiError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let mut settings = if is_json {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigurationError(format!(
                "Failed to read JSON file '{}': {e}",
                path.display()
            ))
        })?;
        from_json_str(&content)?
    } else {
        from_toml_file(path)?
    };
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `PROFILES_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

/// Applies overrides using an arbitrary variable lookup.
fn apply_overrides_from(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("PROFILES_DEBUG") {
        settings.debug = parse_bool(&val);
    }

    if let Some(val) = lookup("PROFILES_ALLOWED_HOSTS") {
        settings.allowed_hosts = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(val) = lookup("PROFILES_BIND_ADDRESS") {
        settings.bind_address = val;
    }

    if let Some(val) = lookup("PROFILES_API_PREFIX") {
        settings.api_prefix = val;
    }

    if let Some(val) = lookup("PROFILES_TRAILING_SLASH") {
        settings.trailing_slash = parse_bool(&val);
    }

    if let Some(val) = lookup("PROFILES_LOG_LEVEL") {
        settings.log_level = val;
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_bool(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, ApiError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        ApiError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        ApiError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write as _;

    use super::*;

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            api_prefix = "api/"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.api_prefix, "api/");
        // Defaults preserved
        assert_eq!(settings.bind_address, "127.0.0.1:8000");
        assert!(settings.trailing_slash);
    }

    #[test]
    fn test_from_toml_str_allowed_hosts() {
        let toml = r#"
            allowed_hosts = ["example.com", "www.example.com"]
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.allowed_hosts.len(), 2);
        assert!(settings.allowed_hosts.contains(&"example.com".to_string()));
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert!(settings.allowed_hosts.is_empty());
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("this is not = = toml");
        assert!(matches!(result, Err(ApiError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("trailing_slash = \"sometimes\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_str_basic() {
        let settings = from_json_str(r#"{"log_level": "debug", "trailing_slash": false}"#).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert!(!settings.trailing_slash);
        assert!(settings.debug);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address = \"0.0.0.0:9000\"").unwrap();
        let settings = from_toml_file(file.path()).unwrap();
        assert_eq!(settings.bind_address, "0.0.0.0:9000");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = from_toml_file("/definitely/not/here/profiles.toml");
        assert!(matches!(result, Err(ApiError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_file_with_env_picks_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"api_prefix": "v1/"}}"#).unwrap();
        let settings = from_file_with_env(file.path()).unwrap();
        assert_eq!(settings.api_prefix, "v1/");
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("PROFILES_DEBUG", "false"),
            ("PROFILES_ALLOWED_HOSTS", "a.com, b.com,,"),
            ("PROFILES_TRAILING_SLASH", "0"),
            ("PROFILES_LOG_LEVEL", "warn"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_overrides_from(&mut settings, |k| vars.get(k).map(ToString::to_string));

        assert!(!settings.debug);
        assert_eq!(settings.allowed_hosts, vec!["a.com", "b.com"]);
        assert!(!settings.trailing_slash);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.bind_address, "127.0.0.1:8000");
    }

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"a": 1, "b": {"c": 2, "d": 3}});
        let over = serde_json::json!({"b": {"c": 20}});
        let merged = merge_json(base, over);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"]["c"], 20);
        assert_eq!(merged["b"]["d"], 3);
    }
}
