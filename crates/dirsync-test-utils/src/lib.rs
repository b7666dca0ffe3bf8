//! Shared test utilities for the dirsync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`tree::SyncFixture`], a source/target pair of scratch trees

pub mod tree;
