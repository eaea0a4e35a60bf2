#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Environment-driven application configuration.
//!
//! Layout: `defaults.rs` (variable names and default values), `model.rs`
//! (`AppConfig` and its loaders), `error.rs` (`ConfigError`).

pub mod defaults;
pub mod error;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::AppConfig;
