// src/manifest/mod.rs

//! Version manifests: the authoritative file listing for one version.
//!
//! A manifest records every file of a published or installed version
//! with its checksum, size, and any precomputed deltas from prior
//! file revisions. Diffing the locally installed manifest against a
//! published one yields the update recipe.
//!
//! Manifests round-trip through a JSON document; every field read is
//! the field last written, and file order is preserved end-to-end.

use crate::error::{Error, Result};
use crate::hash;
use crate::recipe::{FileAction, UpdateRecipe, UpdateRecipeFile};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use walkdir::WalkDir;

/// Suffix appended to a file name to form its canonical remote path
/// (the gzip-compressed full payload published alongside the manifest)
const DEPLOY_SUFFIX: &str = ".deploy";

/// A precomputed binary patch from one prior file revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifestDeltaFile {
    /// Remote path of the patch blob
    #[serde(rename = "file")]
    pub file_name: String,
    /// Checksum of the source content this patch applies from
    #[serde(rename = "from")]
    pub source_checksum: String,
    /// Size of the patch blob in bytes
    pub size: u64,
}

/// One file of a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifestFile {
    /// Path relative to the version directory, `/`-separated
    pub name: String,
    /// SHA-256 of the file content, hex
    pub checksum: String,
    /// Content size in bytes
    pub size: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deltas: Vec<VersionManifestDeltaFile>,
}

impl VersionManifestFile {
    pub fn new(name: impl Into<String>, checksum: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            checksum: checksum.into(),
            size,
            deltas: Vec::new(),
        }
    }

    pub fn with_deltas(mut self, deltas: Vec<VersionManifestDeltaFile>) -> Self {
        self.deltas = deltas;
        self
    }

    /// Canonical remote path of the full-file payload
    pub fn deploy_name(&self) -> String {
        format!("{}{DEPLOY_SUFFIX}", self.name)
    }

    /// Find the delta applying from the given source checksum
    ///
    /// Lookup is exact-match only; there are no nearest-version
    /// heuristics.
    pub fn delta_from(&self, checksum: &str) -> Option<&VersionManifestDeltaFile> {
        self.deltas
            .iter()
            .find(|d| d.source_checksum.eq_ignore_ascii_case(checksum))
    }
}

/// Wire form of the manifest document
#[derive(Serialize, Deserialize)]
struct ManifestDoc {
    files: Vec<VersionManifestFile>,
}

/// The exact content of one version: an ordered list of files
#[derive(Debug, Clone)]
pub struct VersionManifest {
    version: Version,
    files: Vec<VersionManifestFile>,
}

impl VersionManifest {
    /// Build a manifest, validating its invariants
    ///
    /// File names must be unique under case-insensitive comparison, and
    /// each file may carry at most one delta per distinct source
    /// checksum.
    pub fn new(version: Version, files: Vec<VersionManifestFile>) -> Result<Self> {
        for (i, file) in files.iter().enumerate() {
            let duplicate = files[..i]
                .iter()
                .any(|f| f.name.eq_ignore_ascii_case(&file.name));
            if duplicate {
                return Err(Error::ParseError(format!(
                    "Duplicate file name in manifest: {}",
                    file.name
                )));
            }

            for (j, delta) in file.deltas.iter().enumerate() {
                let duplicate = file.deltas[..j]
                    .iter()
                    .any(|d| d.source_checksum.eq_ignore_ascii_case(&delta.source_checksum));
                if duplicate {
                    return Err(Error::ParseError(format!(
                        "Duplicate delta source checksum {} for file {}",
                        delta.source_checksum, file.name
                    )));
                }
            }
        }

        Ok(Self { version, files })
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn files(&self) -> &[VersionManifestFile] {
        &self.files
    }

    /// Look up a file by name, case-insensitive
    pub fn file(&self, name: &str) -> Option<&VersionManifestFile> {
        self.files.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Parse a manifest document
    pub fn from_json(version: Version, data: &str) -> Result<Self> {
        let doc: ManifestDoc = serde_json::from_str(data)
            .map_err(|e| Error::ParseError(format!("Failed to parse manifest: {e}")))?;
        Self::new(version, doc.files)
    }

    /// Serialize to the manifest document format
    pub fn to_json(&self) -> Result<String> {
        let doc = ManifestDoc {
            files: self.files.clone(),
        };
        serde_json::to_string_pretty(&doc)
            .map_err(|e| Error::ParseError(format!("Failed to serialize manifest: {e}")))
    }

    /// Load a manifest document from a file
    pub fn load_file(version: Version, path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_json(version, &data)
    }

    /// Write the manifest document to a file
    pub fn save_file(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data)
            .map_err(|e| Error::IoError(format!("Failed to write {}: {e}", path.display())))
    }

    /// Build a manifest by hashing every file under a directory
    ///
    /// File names are recorded relative to `root` with `/` separators,
    /// in enumeration order.
    pub fn generate_from_directory(version: Version, root: &Path) -> Result<Self> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| {
                Error::IoError(format!("Failed to walk {}: {e}", root.display()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).map_err(|e| {
                Error::IoError(format!("Path {} escapes root: {e}", path.display()))
            })?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let mut file = File::open(path)
                .map_err(|e| Error::IoError(format!("Failed to open {}: {e}", path.display())))?;
            let size = file
                .metadata()
                .map_err(|e| Error::IoError(format!("Failed to stat {}: {e}", path.display())))?
                .len();
            let checksum = hash::sha256_reader(&mut file)
                .map_err(|e| Error::IoError(format!("Failed to hash {}: {e}", path.display())))?;

            files.push(VersionManifestFile::new(name, checksum, size));
        }

        Self::new(version, files)
    }

    /// Compute the recipe that updates an installation at `self` to
    /// `target`
    ///
    /// For every file of the target version: files absent locally are
    /// downloaded in full, files with an unchanged checksum are copied
    /// from the installed version, and changed files are patched when
    /// `deltas_enabled` and the target declares a delta whose source
    /// checksum matches the installed copy, otherwise downloaded in
    /// full.
    pub fn diff(&self, target: &VersionManifest, deltas_enabled: bool) -> UpdateRecipe {
        let mut recipe_files = Vec::with_capacity(target.files.len());

        for file in &target.files {
            let installed = self.file(&file.name);

            let mut action = FileAction::Download;
            let mut file_to_download = Some(file.deploy_name());
            let mut size = file.size;

            if let Some(installed) = installed {
                if installed.checksum.eq_ignore_ascii_case(&file.checksum) {
                    action = FileAction::Copy;
                    file_to_download = None;
                } else if deltas_enabled {
                    if let Some(delta) = file.delta_from(&installed.checksum) {
                        action = FileAction::DownloadDelta;
                        file_to_download = Some(delta.file_name.clone());
                        size = delta.size;
                    }
                }
            }

            recipe_files.push(UpdateRecipeFile {
                name: file.name.clone(),
                checksum: file.checksum.clone(),
                size,
                action,
                file_to_download,
            });
        }

        UpdateRecipe::new(target.version.clone(), self.version.clone(), recipe_files)
    }
}
