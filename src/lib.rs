//! Competency Validity & Compliance Engine.
//!
//! The core rules for workforce competency tracking: whether a person's
//! proficiency in a skill is still valid or needs renewal (recycling),
//! how evidence of training from three independent sources merges into
//! canonical competency records without duplicates, and whether
//! accumulated continuing-education hours satisfy the rolling regulatory
//! requirement.
//!
//! The engine consumes and produces plain data. The surrounding
//! application (HTTP, auth, uploads, rendering) lives elsewhere and
//! calls in through [`reconcile::Reconciler`], [`recycling`],
//! [`compliance`] and [`report`].

pub mod cli;
pub mod compliance;
pub mod config;
pub mod core;
pub mod error;
pub mod matcher;
pub mod reconcile;
pub mod recycling;
pub mod report;
pub mod storage;

pub use error::{RecertError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
