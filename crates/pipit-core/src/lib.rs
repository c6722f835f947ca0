//! # pipit-core
//!
//! Manifest reconciliation for the pipit dependency manager.
//!
//! pipit layers a flat, declarative manifest (`pipit.json`) over an
//! isolated environment's package installer. This crate holds the rules
//! that keep the two in step:
//! - Parse package arguments into `(name, constraint)` pairs
//! - Load, normalize and save the manifest
//! - Filter conditional entries by interpreter version and operating system
//! - Render manifest entries back into installer specifiers
//! - Merge installer results into the manifest without disturbing other entries
//!
//! ## Architecture
//!
//! ```text
//! arguments ──► specifier::parse ──► Reconciler ◄──► ManifestStore
//!                                       │
//!                    condition::is_applicable + specifier::render
//!                                       │
//!                                       ▼
//!                            Installer / Provisioner (traits)
//! ```
//!
//! The installer is not resolved or reimplemented here; it is reached only
//! through the [`Installer`] and [`Provisioner`] traits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pipit_core::{ManifestStore, Section, MANIFEST_FILE};
//!
//! # fn example() -> pipit_core::Result<()> {
//! let store = ManifestStore::new(".", MANIFEST_FILE);
//! let manifest = store.load()?;
//!
//! for (name, entry) in manifest.section(Section::Runtime) {
//!     println!("{}: {}", name, entry.version());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod condition;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod reconcile;
pub mod specifier;
pub mod types;

// Re-export main types and traits
pub use error::{Error, ErrorKind, Result};
pub use installer::{Installer, Provisioner};
pub use manifest::{Entries, Manifest, ManifestStore, MANIFEST_FILE};
pub use reconcile::{Outcome, Reconciler, ENV_DIR};
pub use specifier::{parse, render, ParsedArgs};
pub use types::{
    is_updatable, Entry, Installed, Runtime, Section, Specifier, StructuredEntry, ANY, COMPATIBLE,
};

pub use condition::is_applicable;
