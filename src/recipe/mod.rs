// src/recipe/mod.rs

//! Update recipes: the per-file execution plan produced by diffing two
//! version manifests.
//!
//! A recipe is an immutable value object. It is created once per update
//! attempt, handed to the chef, and discarded afterwards; it is never
//! persisted.

use crate::version::Version;

/// How a single file moves from the current version to the new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Byte-for-byte copy from the currently installed version
    Copy,
    /// Download the full gzip-compressed file from the origin
    Download,
    /// Download a binary patch and apply it to the installed copy
    DownloadDelta,
}

/// One file entry in an update recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecipeFile {
    /// Path relative to the version directory
    pub name: String,
    /// Checksum the materialized file must have
    pub checksum: String,
    /// Bytes to transfer: full size for downloads, patch size for deltas
    pub size: u64,
    pub action: FileAction,
    /// Remote path to fetch; `None` for `Copy`
    pub file_to_download: Option<String>,
}

impl UpdateRecipeFile {
    /// Whether executing this entry requires a network fetch
    pub fn is_download(&self) -> bool {
        matches!(self.action, FileAction::Download | FileAction::DownloadDelta)
    }
}

/// The complete plan for moving one installation between two versions
#[derive(Debug, Clone)]
pub struct UpdateRecipe {
    pub new_version: Version,
    pub current_version: Version,
    pub files: Vec<UpdateRecipeFile>,
}

impl UpdateRecipe {
    pub fn new(new_version: Version, current_version: Version, files: Vec<UpdateRecipeFile>) -> Self {
        Self {
            new_version,
            current_version,
            files,
        }
    }

    /// Entries satisfied from the local installation
    pub fn copies(&self) -> impl Iterator<Item = &UpdateRecipeFile> {
        self.files.iter().filter(|f| f.action == FileAction::Copy)
    }

    /// Entries requiring a fetch from the origin
    pub fn downloads(&self) -> impl Iterator<Item = &UpdateRecipeFile> {
        self.files.iter().filter(|f| f.is_download())
    }

    /// Total bytes the recipe will transfer over the network
    pub fn download_size(&self) -> u64 {
        self.downloads().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, action: FileAction, size: u64) -> UpdateRecipeFile {
        UpdateRecipeFile {
            name: name.to_string(),
            checksum: "00".to_string(),
            size,
            action,
            file_to_download: match action {
                FileAction::Copy => None,
                _ => Some(format!("{name}.deploy")),
            },
        }
    }

    #[test]
    fn test_partition_and_sizes() {
        let recipe = UpdateRecipe::new(
            Version::parse("2.0").unwrap(),
            Version::parse("1.0").unwrap(),
            vec![
                entry("a.txt", FileAction::Copy, 100),
                entry("b.txt", FileAction::Download, 2000),
                entry("c.bin", FileAction::DownloadDelta, 30),
            ],
        );

        assert_eq!(recipe.copies().count(), 1);
        assert_eq!(recipe.downloads().count(), 2);
        assert_eq!(recipe.download_size(), 2030);
    }

    #[test]
    fn test_copy_has_no_download_path() {
        let copy = entry("a.txt", FileAction::Copy, 1);
        assert!(!copy.is_download());
        assert!(copy.file_to_download.is_none());
    }
}
