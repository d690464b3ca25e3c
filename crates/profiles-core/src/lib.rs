//! # profiles-core
//!
//! Core types for the profiles-rs workspace: the error enum shared by every
//! crate, the settings struct and its loaders, and tracing setup.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Application settings
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

pub use error::{ApiError, ApiResult, ValidationError};
pub use settings::Settings;
