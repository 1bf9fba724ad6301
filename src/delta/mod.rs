// src/delta/mod.rs

//! Binary-delta capability boundary.
//!
//! The byte-level patch algorithm is an external collaborator; the
//! client only needs "old file + patch blob → new file". Computing
//! patches happens at publish time and never in the client, so the
//! capability carried here is apply-only. Presence of an engine is
//! decided at store construction and drives whether the diff algorithm
//! is allowed to plan delta downloads.

use crate::error::Result;
use std::path::Path;

/// Applies a binary patch to reconstruct a new file revision
pub trait DeltaEngine: Send + Sync {
    /// Produce `new` from `old` and the patch at `patch`
    ///
    /// `old` is the installed copy the patch was computed against;
    /// `new` must be created (parent directories already exist). The
    /// engine is not responsible for checksum verification; the
    /// caller verifies the materialized file.
    fn apply(&self, old: &Path, new: &Path, patch: &Path) -> Result<()>;
}
