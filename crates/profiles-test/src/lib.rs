//! # profiles-test
//!
//! Testing support for profiles-rs. [`TestClient`] sends simulated requests
//! through an axum router without binding a socket, and [`TestResponse`]
//! exposes the status, headers and body for assertions.

pub mod client;

pub use client::{TestClient, TestResponse};
