//! # profiles-views
//!
//! View layer for profiles-rs. Provides class-based views, viewsets and the
//! router that expands them into CRUD routes, the middleware pipeline, and
//! [`ProfilesApp`](server::ProfilesApp), which serves a resolved route table
//! through axum.

pub mod middleware;
pub mod routers;
pub mod server;
pub mod views;
pub mod viewsets;

pub use routers::DefaultRouter;
pub use server::ProfilesApp;
pub use viewsets::{Action, ViewSet};
