// src/manager/mod.rs

//! Update orchestration: check the origin, apply an update, advance
//! pointers, collect stale versions.
//!
//! The manager owns the in-memory current version for its process
//! lifetime. It is re-derived from the store at initialization and
//! kept in sync with every successful update. Operating on an
//! uninitialized manager is a precondition failure, surfaced
//! immediately and never retried.

use crate::cancel::CancelToken;
use crate::chef::Cook;
use crate::error::{Error, Result};
use crate::server::UpdateServer;
use crate::store::VersionStore;
use crate::version::Version;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Result of a single update check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    /// Whether the origin's version differs from the installed one
    pub has_update: bool,
    /// The origin's current version
    pub version: Version,
}

/// The check-and-apply surface the scheduler drives
///
/// Kept as a trait so the scheduler can be exercised against a fake.
pub trait Updater: Send + Sync {
    /// The version this manager believes is installed
    fn current_version(&self) -> Result<Version>;

    /// Ask the origin for its current version; no state change
    fn check_for_update(&self) -> Result<UpdateInfo>;

    /// Move the installation to `info.version`
    fn do_update(&self, info: &UpdateInfo, cancel: &CancelToken) -> Result<()>;
}

/// Production update manager
pub struct UpdateManager {
    server: Arc<dyn UpdateServer>,
    store: Arc<dyn VersionStore>,
    chef: Arc<dyn Cook>,
    current: RwLock<Option<Version>>,
}

impl UpdateManager {
    pub fn new(
        server: Arc<dyn UpdateServer>,
        store: Arc<dyn VersionStore>,
        chef: Arc<dyn Cook>,
    ) -> Self {
        Self {
            server,
            store,
            chef,
            current: RwLock::new(None),
        }
    }

    /// Read the installed version from the store and become ready
    ///
    /// Must be called before any other operation.
    pub fn initialize(&self) -> Result<()> {
        let version = self.store.current_version()?;
        debug!("Current version is {version}");
        *self.current.write() = Some(version);
        Ok(())
    }

    fn current(&self) -> Result<Version> {
        self.current.read().clone().ok_or_else(|| {
            Error::InitError("UpdateManager has not been initialized".to_string())
        })
    }

    /// Delete every installed version except the executing one and the
    /// new current one. Best-effort: each deletion is attempted
    /// independently and failures never escalate.
    fn delete_old_versions(&self) {
        let executing = match self.store.executing_version() {
            Ok(version) => version,
            Err(e) => {
                error!("Skipping old version cleanup, executing version unknown: {e}");
                return;
            }
        };
        let current = self.current.read().clone();

        let installed = match self.store.installed_versions() {
            Ok(versions) => versions,
            Err(e) => {
                error!("Skipping old version cleanup: {e}");
                return;
            }
        };

        for version in installed {
            let in_use = version == executing || Some(&version) == current.as_ref();
            if in_use {
                continue;
            }

            info!("Deleting old version {version}");
            if let Err(e) = self.store.delete_version_dir(&version) {
                error!("Error deleting old version {version}: {e}");
            }
        }
    }
}

impl Updater for UpdateManager {
    fn current_version(&self) -> Result<Version> {
        self.current()
    }

    fn check_for_update(&self) -> Result<UpdateInfo> {
        let current = self.current()?;
        let remote = self.server.current_version()?;

        Ok(UpdateInfo {
            has_update: remote != current,
            version: remote,
        })
    }

    fn do_update(&self, info: &UpdateInfo, cancel: &CancelToken) -> Result<()> {
        let current = self.current()?;
        cancel.err_if_cancelled()?;

        // The local manifest is re-derived from disk, never from a
        // cached document
        let local_manifest = self.store.load_manifest(&current)?;
        let target_manifest = self.server.manifest(&info.version)?;

        let recipe = local_manifest.diff(&target_manifest, self.store.supports_delta());
        info!(
            "Updating {} -> {} ({} files, {} to download)",
            recipe.current_version,
            recipe.new_version,
            recipe.files.len(),
            recipe.downloads().count()
        );

        self.chef.cook(&recipe, cancel)?;

        // The version running before this update becomes the rollback
        // target for an external supervisor
        self.store
            .set_last_valid_version(&self.store.executing_version()?)?;
        self.store.set_current_version(&info.version)?;
        *self.current.write() = Some(info.version.clone());

        self.delete_old_versions();
        Ok(())
    }
}
