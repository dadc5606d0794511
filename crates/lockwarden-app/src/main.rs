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

//! Binary entrypoint that wires the Lockwarden daemon together and runs the
//! supervision loop until the process is killed.

use lockwarden_app::{AppResult, run_app};

/// Bootstraps the Lockwarden daemon and blocks forever.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
