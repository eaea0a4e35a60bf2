#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (standard actors, projects, and policy rows),
//! postgres.rs (disposable databases on an external server).

pub mod fixtures;
pub mod postgres;
