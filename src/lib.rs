//! # lvlup Core Library
//!
//! This crate contains the core logic of `arkade-lvlup` – a small manager that keeps a
//! declarative list of [arkade](https://github.com/alexellis/arkade) tools and the arkade bin
//! directory in sync.
//!
//! The declared tools live in `~/.arkade/lvlup.yaml`, the installed binaries in `~/.arkade/bin`.
//! The [`reconcile`] module computes the difference between the two and applies it: installing
//! missing tools, re-installing on request, pruning binaries nobody declared, and reporting the
//! sync state.
//!
//! ## Modules Overview
//! - [`manifest`] – Loading, saving and first-run initialization of `lvlup.yaml`
//! - [`inventory`] – Inspecting and deleting binaries in the bin directory
//! - [`installer`] – The `PackageInstaller` capability and its `arkade get` implementation
//! - [`reconcile`] – Requests, the reconciliation operations and their reports
//! - [`paths`] – The fixed `~/.arkade` layout
//! - [`shell`] – The PATH block shown by `config-shell`
//! - [`util`] – Tool-name normalization
//! - [`error`] – Error types


pub mod error;
pub mod paths;
pub mod util;
pub mod manifest;
pub mod inventory;
pub mod installer;
pub mod reconcile;
pub mod shell;

pub use error::*;
pub use paths::*;
pub use util::*;
pub use manifest::*;
pub use inventory::*;
pub use installer::*;
pub use reconcile::*;
