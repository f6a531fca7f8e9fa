//! # cbtctl – vSphere collaborator
//!
//! Everything cbtctl asks of the control plane lives here: session-based
//! access to the vSphere REST API, VM resolution (exact names and glob
//! patterns), the change-block-tracking reconfigure call, and the snapshot
//! lifecycle used to force the setting to commit.
//!
//! ## Modules
//!
//! - **types** — Shared data structures (config, VM summaries, specs)
//! - **error** — Crate-specific error types
//! - **client** — vSphere REST API HTTP client with session-based auth
//! - **vm** — VM resolution and change-tracking configuration
//! - **snapshot** — Transient snapshot create / delete
//! - **service** — Aggregate facade owning the client

pub mod types;
pub mod error;
pub mod client;
pub mod vm;
pub mod snapshot;
pub mod service;
