//! # cbtctl
//!
//! Operator CLI that applies a change-block-tracking setting to one or more
//! vSphere VMs and forces each change to commit by creating and immediately
//! deleting a transient snapshot, reporting a per-target outcome without
//! aborting the batch.
//!
//! ## Modules
//!
//! - **cli** — clap argument surface
//! - **provider** — collaborator seam over the vSphere service
//! - **apply** — the per-target apply-and-verify workflow

pub mod apply;
pub mod cli;
pub mod provider;
