//! HTTP API layer for attenda.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth, attendance, events, outside events, enrollments,
//!   settings
//! - **Extractors**: Authentication and admin gating
//! - **Middleware**: Bearer-token authentication
//! - **Response**: The `{statusCode, success, message, data}` envelope
//!
//! Built on Axum 0.8 with Tower middleware stack.

// Allow dead_code for API compatibility fields in request structs
#![allow(dead_code)]

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use response::ApiResponse;
