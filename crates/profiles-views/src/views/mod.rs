//! View system for profiles-rs.
//!
//! - [`function`] - the [`ViewFunction`] type and method-restricting wrappers
//! - [`class_based`] - the [`View`] trait with per-method dispatch

pub mod class_based;
pub mod function;

pub use class_based::View;
pub use function::{into_handler, require_get, require_http_methods, require_post, ViewFunction};
