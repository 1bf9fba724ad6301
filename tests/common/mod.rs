// tests/common/mod.rs

//! Shared fixtures for integration tests: an installation root builder
//! and an in-memory update origin.

use rollout::{
    CancelToken, DeltaEngine, Error, Result, StoreConfig, UpdateRecipe, UpdateServer, Version,
    VersionManifest, CONFIG_FILE,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Write the installation config document into `root`
pub fn write_config(root: &Path, version: &str, server_url: &str) {
    StoreConfig {
        version: Some(version.to_string()),
        last_version: None,
        update_server: Some(server_url.to_string()),
    }
    .save(&root.join(CONFIG_FILE))
    .unwrap();
}

/// Create a version directory under `root` with the given files
pub fn install_version(root: &Path, version: &str, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = root.join(version).join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content.as_bytes()).unwrap();
    }
    // A version directory may exist with no files yet
    std::fs::create_dir_all(root.join(version)).unwrap();
}

/// In-memory update origin serving manifests and payloads
pub struct FakeOrigin {
    latest: Version,
    manifests: HashMap<Version, VersionManifest>,
    /// (version, remote path) -> payload bytes
    payloads: HashMap<(String, String), Vec<u8>>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeOrigin {
    pub fn new(latest: &str) -> Self {
        Self {
            latest: latest.parse().unwrap(),
            manifests: HashMap::new(),
            payloads: HashMap::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn publish_manifest(&mut self, manifest: VersionManifest) {
        self.manifests.insert(manifest.version().clone(), manifest);
    }

    /// Publish a full-file payload (gzip-compressed) at its deploy path
    pub fn publish_full(&mut self, version: &str, name: &str, content: &[u8]) {
        let compressed = rollout::compression::compress(content).unwrap();
        self.payloads
            .insert((version.to_string(), format!("{name}.deploy")), compressed);
    }

    /// Publish a raw patch blob at the given remote path
    pub fn publish_patch(&mut self, version: &str, remote_path: &str, patch: &[u8]) {
        self.payloads
            .insert((version.to_string(), remote_path.to_string()), patch.to_vec());
    }
}

impl UpdateServer for FakeOrigin {
    fn current_version(&self) -> Result<Version> {
        Ok(self.latest.clone())
    }

    fn manifest(&self, version: &Version) -> Result<VersionManifest> {
        self.manifests
            .get(version)
            .cloned()
            .ok_or_else(|| Error::NotFoundError(format!("No manifest for {version}")))
    }

    fn download_file(&self, version: &Version, path: &str) -> Result<Vec<u8>> {
        self.fetched.lock().unwrap().push(path.to_string());
        self.payloads
            .get(&(version.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| Error::DownloadError(format!("404: {version}/{path}")))
    }
}

/// Patch engine whose patch blobs are simply the new file content
///
/// Stands in for the external binary-diff capability: apply ignores
/// the old content and writes the blob. Good enough to exercise the
/// delta path end to end.
pub struct ReplacePatchEngine;

impl DeltaEngine for ReplacePatchEngine {
    fn apply(&self, old: &Path, new: &Path, patch: &Path) -> Result<()> {
        if !old.exists() {
            return Err(Error::DeltaError(format!(
                "Missing patch source {}",
                old.display()
            )));
        }
        let data = std::fs::read(patch).map_err(|e| Error::IoError(e.to_string()))?;
        std::fs::write(new, data).map_err(|e| Error::IoError(e.to_string()))
    }
}

/// Run a recipe-less sanity check that a cook target can be re-cooked
pub fn cook_twice(chef: &dyn rollout::Cook, recipe: &UpdateRecipe) -> Result<()> {
    chef.cook(recipe, &CancelToken::new())?;
    chef.cook(recipe, &CancelToken::new())
}
