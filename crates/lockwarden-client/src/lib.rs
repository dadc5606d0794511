#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! REST transport for the storage collaborator contracts.
//!
//! Layout: `rest.rs` (reqwest-backed client and streaming notification
//! reader).

/// REST client implementation.
pub mod rest;

pub use rest::{RestClientConfig, RestStorageClient};
