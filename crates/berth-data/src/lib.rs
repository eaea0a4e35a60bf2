#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! `PostgreSQL` persistence for Berth: migrations, label store, policy
//! listing, and the identity/project directory.

pub mod directory;
pub mod error;
pub mod labels;
pub mod migrate;
pub mod policies;
pub mod secrets;

pub use directory::PgDirectory;
pub use error::{DataError, Result as DataResult};
pub use labels::PgLabelStore;
pub use migrate::{apply_migrations, connect};
pub use policies::{NewPolicy, PgPolicySource};
pub use secrets::{hash_secret, verify_secret};
