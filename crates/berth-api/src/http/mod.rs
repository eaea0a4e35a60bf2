//! HTTP surface modules (router, handlers, middleware).

/// Credential extraction middleware.
pub mod auth;
/// Shared header names and problem URIs.
pub mod constants;
/// Problem response helpers and error types.
pub mod errors;
/// Liveness and metrics endpoints.
pub mod health;
/// Label route handlers.
pub mod labels;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub mod telemetry;
