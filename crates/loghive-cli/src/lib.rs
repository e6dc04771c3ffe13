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
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Management CLI for a Loghive log platform instance.
//!
//! Layout:
//! - `cli.rs`: argument parsing, connection resolution, and dispatch
//! - `commands/`: command handlers grouped by concern
//! - `client.rs`: shared HTTP client, errors, and the GraphQL helper
//! - `jobs.rs`: REST client for asynchronous query jobs
//! - `poll.rs`: poll cadence management for one job
//! - `format.rs`: row format templates for event output
//! - `output.rs`: search-result and management renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod format;
pub(crate) mod jobs;
pub(crate) mod output;
pub(crate) mod poll;

pub use cli::run;
