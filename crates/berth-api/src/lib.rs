#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! HTTP surface for Berth label management.
//!
//! Layout: `http/router.rs` (server host and layers), `http/labels.rs`
//! (label handlers), `http/auth.rs` (credential middleware), `http/errors.rs`
//! (problem responses), `http/health.rs` (liveness and metrics),
//! `models.rs` (wire DTOs), `state.rs` (shared handler state).

pub mod error;
pub mod http;
pub mod models;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::ApiState;
