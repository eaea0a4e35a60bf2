#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Label management core for the Berth registry.
//!
//! Layout: `model.rs` (labels, policies, queries), `validate.rs` (payload
//! shape checks), `directory.rs` (identity/project/policy collaborators),
//! `store.rs` (label persistence contract + in-memory store), `filter.rs`
//! (policy filter index), `authz.rs` (authorization gate), `service.rs`
//! (label service facade), `memory.rs` (in-memory collaborators).

pub mod authz;
pub mod directory;
pub mod error;
pub mod filter;
pub mod memory;
pub mod model;
pub mod service;
pub mod store;
pub mod validate;

pub use authz::{AuthorizationGate, Decision, Operation, Role, ScopeRef, Visibility, decide};
pub use directory::{
    Credential, IdentityProvider, PolicySource, Principal, Project, ProjectDirectory, ProjectRole,
    SharedIdentityProvider, SharedPolicySource, SharedProjectDirectory, UserIdentity,
};
pub use error::{ErrorKind, LabelError, LabelResult, Resource};
pub use filter::{FilterParseError, FilterParser, JsonFilterParser, PolicyFilterIndex};
pub use memory::{MemoryDirectory, MemoryPolicySource};
pub use model::{
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE, FILTER_KIND_LABEL, FilterItem, Label, LabelId, LabelPage,
    LabelPatch, LabelQuery, LabelResources, LabelScope, LabelUpdate, MAX_PAGE_SIZE, NewLabel,
    PolicyId, PolicyRecord, ProjectId, ReplicationPolicy, UserId,
};
pub use service::LabelService;
pub use store::{LabelStore, MemoryLabelStore, SharedLabelStore};
