//! Settings for profiles-rs.
//!
//! [`Settings`] holds everything the server and the route table read at
//! startup. Settings are loaded once (see [`settings_loader`](crate::settings_loader))
//! and passed by reference; nothing mutates them after the server starts.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The complete set of application settings.
///
/// # Examples
///
/// ```
/// use profiles_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert!(settings.trailing_slash);
/// assert_eq!(settings.api_prefix, "");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// Hostnames that this application can serve. Empty allows any host.
    pub allowed_hosts: Vec<String>,

    // ── Server ───────────────────────────────────────────────────────

    /// The address `runserver` binds to when none is given on the command line.
    pub bind_address: String,

    // ── Routing ──────────────────────────────────────────────────────

    /// Path prefix under which the route table is mounted (e.g. `"api/"`).
    pub api_prefix: String,
    /// Whether router-generated routes end with a trailing slash.
    pub trailing_slash: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter directive (e.g. "info", "debug", "profiles_views=trace").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            allowed_hosts: Vec::new(),
            bind_address: "127.0.0.1:8000".to_string(),
            api_prefix: String::new(),
            trailing_slash: true,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Returns `true` if `host` (without port) is permitted by `allowed_hosts`.
    ///
    /// An empty list allows every host. Entries starting with `.` match the
    /// domain and all its subdomains; `*` matches anything.
    pub fn is_host_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        let host = strip_port(host).to_lowercase();
        self.allowed_hosts.iter().any(|pattern| {
            let pattern = pattern.to_lowercase();
            if pattern == "*" {
                true
            } else if let Some(domain) = pattern.strip_prefix('.') {
                host == domain || host.ends_with(&pattern)
            } else {
                host == pattern
            }
        })
    }

    /// Returns the API prefix normalized to either `""` or `"segment/"`.
    pub fn normalized_api_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        }
    }

    /// Checks the settings for combinations the server refuses to start with.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigurationError`] when `bind_address` is empty
    /// or `log_level` is not a valid filter directive.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.bind_address.trim().is_empty() {
            return Err(ApiError::ConfigurationError(
                "The bind_address setting must not be empty.".to_string(),
            ));
        }
        if tracing_subscriber::EnvFilter::try_new(&self.log_level).is_err() {
            return Err(ApiError::ConfigurationError(format!(
                "The log_level setting \"{}\" is not a valid filter directive.",
                self.log_level
            )));
        }
        Ok(())
    }
}

/// Removes a trailing `:port` from a `Host` value. Bracketed IPv6 literals
/// keep their brackets and inner colons.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}
