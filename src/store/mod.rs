// src/store/mod.rs

//! Local structure store: the on-disk layout of an installation.
//!
//! One store per installation root. The root holds one directory per
//! installed version plus the persisted config document:
//!
//! ```text
//! <root>/<version>/...application files...
//! <root>/config.toml
//! ```
//!
//! The store is the single writer of version directories. Operations
//! propagate filesystem errors to the caller; there is no internal
//! retry.

mod config;

pub use config::{StoreConfig, CONFIG_FILE};

use crate::delta::DeltaEngine;
use crate::error::{Error, Result};
use crate::manifest::VersionManifest;
use crate::version::Version;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Physical version storage plus persisted pointer state
///
/// Kept as a trait so the chef and the update manager can be exercised
/// against in-memory fakes.
pub trait VersionStore: Send + Sync {
    /// Create the directory for a version
    fn create_version_dir(&self, version: &Version) -> Result<()>;

    /// Remove a version's directory subtree
    fn delete_version_dir(&self, version: &Version) -> Result<()>;

    /// Versions with a directory under the installation root
    fn installed_versions(&self) -> Result<Vec<Version>>;

    /// Re-derive a manifest from a version's directory contents
    ///
    /// Hashing the actual files avoids trusting a possibly stale
    /// persisted manifest for the local install.
    fn load_manifest(&self, version: &Version) -> Result<VersionManifest>;

    /// The version the installation should run next
    fn current_version(&self) -> Result<Version>;

    fn set_current_version(&self, version: &Version) -> Result<()>;

    /// The most recent version confirmed running before an update
    fn last_valid_version(&self) -> Result<Option<Version>>;

    fn set_last_valid_version(&self, version: &Version) -> Result<()>;

    /// The version this process is running from, derived from the
    /// executable's install path rather than persisted state
    fn executing_version(&self) -> Result<Version>;

    fn has_version_dir(&self, version: &Version) -> bool;

    /// Byte-for-byte copy of a file across version directories
    fn copy_file(&self, from: &Version, to: &Version, name: &str) -> Result<()>;

    /// Write a fully downloaded, decompressed file into a version
    /// directory, creating parent directories as needed
    fn save_file(&self, version: &Version, name: &str, data: &[u8]) -> Result<()>;

    /// Produce `to/name` from `from/name` plus a binary patch
    fn apply_delta(&self, from: &Version, to: &Version, name: &str, patch: &[u8]) -> Result<()>;

    /// Checksum of a stored file's content
    fn file_checksum(&self, version: &Version, name: &str) -> Result<String>;

    /// The configured remote origin
    fn update_server_url(&self) -> Result<Url>;

    /// Whether a delta engine is available for patch application
    fn supports_delta(&self) -> bool;
}

/// Production store over a real installation root
pub struct FsVersionStore {
    base_dir: PathBuf,
    executable_path: PathBuf,
    delta_engine: Option<Arc<dyn DeltaEngine>>,
}

impl FsVersionStore {
    /// Open a store over an installation root
    ///
    /// The executing version is derived from this process's executable
    /// path.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let executable_path = std::env::current_exe()
            .map_err(|e| Error::InitError(format!("Failed to locate executable: {e}")))?;

        Ok(Self {
            base_dir: base_dir.into(),
            executable_path,
            delta_engine: None,
        })
    }

    /// Override the executable path the executing version is derived
    /// from (supervisors running the client out-of-tree, tests)
    pub fn with_executable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = path.into();
        self
    }

    /// Attach a binary-delta engine, enabling delta downloads
    pub fn with_delta_engine(mut self, engine: Arc<dyn DeltaEngine>) -> Self {
        self.delta_engine = Some(engine);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn version_dir(&self, version: &Version) -> PathBuf {
        self.base_dir.join(version.to_string())
    }

    fn file_path(&self, version: &Version, name: &str) -> PathBuf {
        let mut path = self.version_dir(version);
        // Manifest names are /-separated relative paths
        for part in name.split('/') {
            path.push(part);
        }
        path
    }

    fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    fn load_config(&self) -> Result<StoreConfig> {
        StoreConfig::load(&self.config_path())
    }

    fn update_config(&self, mutate: impl FnOnce(&mut StoreConfig)) -> Result<()> {
        let mut config = self.load_config()?;
        mutate(&mut config);
        config.save(&self.config_path())
    }

    fn ensure_parent_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!("Failed to create directory {}: {e}", parent.display()))
            })?;
        }
        Ok(())
    }
}

impl VersionStore for FsVersionStore {
    fn create_version_dir(&self, version: &Version) -> Result<()> {
        let dir = self.version_dir(version);
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", dir.display())))
    }

    fn delete_version_dir(&self, version: &Version) -> Result<()> {
        let dir = self.version_dir(version);
        std::fs::remove_dir_all(&dir)
            .map_err(|e| Error::IoError(format!("Failed to delete {}: {e}", dir.display())))
    }

    fn installed_versions(&self) -> Result<Vec<Version>> {
        let entries = std::fs::read_dir(&self.base_dir).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {e}", self.base_dir.display()))
        })?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                Error::IoError(format!("Failed to read {}: {e}", self.base_dir.display()))
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            // Subdirectories that do not parse as versions are not ours
            if let Ok(version) = entry.file_name().to_string_lossy().parse::<Version>() {
                versions.push(version);
            }
        }

        Ok(versions)
    }

    fn load_manifest(&self, version: &Version) -> Result<VersionManifest> {
        VersionManifest::generate_from_directory(version.clone(), &self.version_dir(version))
    }

    fn current_version(&self) -> Result<Version> {
        let config = self.load_config()?;
        let version = config
            .version
            .ok_or_else(|| Error::NotFoundError("No current version in config".to_string()))?;
        version.parse()
    }

    fn set_current_version(&self, version: &Version) -> Result<()> {
        self.update_config(|c| c.version = Some(version.to_string()))
    }

    fn last_valid_version(&self) -> Result<Option<Version>> {
        let config = self.load_config()?;
        config.last_version.map(|v| v.parse()).transpose()
    }

    fn set_last_valid_version(&self, version: &Version) -> Result<()> {
        self.update_config(|c| c.last_version = Some(version.to_string()))
    }

    fn executing_version(&self) -> Result<Version> {
        let dir = self.executable_path.parent().ok_or_else(|| {
            Error::NotFoundError(format!(
                "Executable {} has no parent directory",
                self.executable_path.display()
            ))
        })?;
        let name = dir
            .file_name()
            .ok_or_else(|| {
                Error::NotFoundError(format!("No directory name in {}", dir.display()))
            })?
            .to_string_lossy();

        name.parse().map_err(|_| {
            Error::ParseError(format!(
                "Executing directory '{name}' is not a version"
            ))
        })
    }

    fn has_version_dir(&self, version: &Version) -> bool {
        self.version_dir(version).is_dir()
    }

    fn copy_file(&self, from: &Version, to: &Version, name: &str) -> Result<()> {
        let source = self.file_path(from, name);
        let destination = self.file_path(to, name);

        Self::ensure_parent_dir(&destination)?;
        std::fs::copy(&source, &destination).map_err(|e| {
            Error::IoError(format!(
                "Failed to copy {} to {}: {e}",
                source.display(),
                destination.display()
            ))
        })?;
        Ok(())
    }

    fn save_file(&self, version: &Version, name: &str, data: &[u8]) -> Result<()> {
        let destination = self.file_path(version, name);

        Self::ensure_parent_dir(&destination)?;
        std::fs::write(&destination, data).map_err(|e| {
            Error::IoError(format!("Failed to write {}: {e}", destination.display()))
        })
    }

    fn apply_delta(&self, from: &Version, to: &Version, name: &str, patch: &[u8]) -> Result<()> {
        let engine = self
            .delta_engine
            .as_ref()
            .ok_or_else(|| Error::DeltaError("No delta engine configured".to_string()))?;

        let old = self.file_path(from, name);
        let new = self.file_path(to, name);
        Self::ensure_parent_dir(&new)?;

        // Stage the patch through a temp file; the engine works on paths
        let mut patch_file = tempfile::NamedTempFile::new()
            .map_err(|e| Error::IoError(format!("Failed to create patch temp file: {e}")))?;
        patch_file
            .write_all(patch)
            .map_err(|e| Error::IoError(format!("Failed to write patch temp file: {e}")))?;

        debug!("Applying {} byte patch to {name}", patch.len());
        engine.apply(&old, &new, patch_file.path())
    }

    fn file_checksum(&self, version: &Version, name: &str) -> Result<String> {
        crate::hash::sha256_file(&self.file_path(version, name))
    }

    fn update_server_url(&self) -> Result<Url> {
        let config = self.load_config()?;
        let raw = config
            .update_server
            .ok_or_else(|| Error::NotFoundError("No update server in config".to_string()))?;
        Url::parse(&raw)
            .map_err(|e| Error::ParseError(format!("Invalid update server URL '{raw}': {e}")))
    }

    fn supports_delta(&self) -> bool {
        self.delta_engine.is_some()
    }
}
