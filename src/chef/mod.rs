// src/chef/mod.rs

//! Recipe executor: materializes a new version directory.
//!
//! Copies run first, sequentially. Downloads and delta downloads then
//! run concurrently, one job per file; full downloads are decompressed
//! and saved, delta payloads are applied against the installed copy.
//! Every materialized file is verified against the recipe checksum.
//!
//! Cooking is idempotent with respect to restart: an existing target
//! directory from an earlier attempt is deleted and rebuilt from
//! scratch; partial progress is never reused.

use crate::cancel::CancelToken;
use crate::compression;
use crate::error::{Error, Result};
use crate::recipe::{FileAction, UpdateRecipe, UpdateRecipeFile};
use crate::server::UpdateServer;
use crate::store::VersionStore;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Executes update recipes against local storage and a remote origin
///
/// Kept as a trait so the update manager can be exercised against a
/// fake executor.
pub trait Cook: Send + Sync {
    /// Materialize the recipe's target version directory
    ///
    /// The first failure fails the whole call; files already written
    /// are not rolled back. The orphaned directory is rebuilt on the
    /// next attempt.
    fn cook(&self, recipe: &UpdateRecipe, cancel: &CancelToken) -> Result<()>;
}

/// Production recipe executor
pub struct Chef {
    store: Arc<dyn VersionStore>,
    server: Arc<dyn UpdateServer>,
}

impl Chef {
    pub fn new(store: Arc<dyn VersionStore>, server: Arc<dyn UpdateServer>) -> Self {
        Self { store, server }
    }

    /// Delete-then-create the target version directory
    fn prepare_target_dir(&self, recipe: &UpdateRecipe) -> Result<()> {
        if self.store.has_version_dir(&recipe.new_version) {
            debug!(
                "Removing partial version directory {}",
                recipe.new_version
            );
            self.store.delete_version_dir(&recipe.new_version)?;
        }
        self.store.create_version_dir(&recipe.new_version)
    }

    fn copy(&self, recipe: &UpdateRecipe, file: &UpdateRecipeFile) -> Result<()> {
        debug!(
            "Copying file \"{}\" from version {}",
            file.name, recipe.current_version
        );
        self.store
            .copy_file(&recipe.current_version, &recipe.new_version, &file.name)
    }

    fn fetch(&self, recipe: &UpdateRecipe, file: &UpdateRecipeFile) -> Result<()> {
        let remote_path = file.file_to_download.as_deref().ok_or_else(|| {
            Error::DownloadError(format!("No remote path recorded for {}", file.name))
        })?;

        debug!(
            "Downloading {}\"{remote_path}\"",
            if file.action == FileAction::DownloadDelta {
                "patch "
            } else {
                ""
            }
        );
        let data = self.server.download_file(&recipe.new_version, remote_path)?;

        match file.action {
            FileAction::DownloadDelta => {
                debug!("Applying patch for \"{}\"", file.name);
                self.store.apply_delta(
                    &recipe.current_version,
                    &recipe.new_version,
                    &file.name,
                    &data,
                )?;
                // The patch size differs from the file size; only the
                // reconstructed content can be verified
                let actual = self.store.file_checksum(&recipe.new_version, &file.name)?;
                if !actual.eq_ignore_ascii_case(&file.checksum) {
                    return Err(Error::ChecksumMismatch {
                        expected: file.checksum.clone(),
                        actual,
                    });
                }
            }
            _ => {
                debug!("Decompressing \"{}\"", file.name);
                let data = compression::decompress(&data)?;
                crate::hash::verify_bytes(&data, &file.checksum)?;
                debug!("Saving \"{}\"", file.name);
                self.store.save_file(&recipe.new_version, &file.name, &data)?;
            }
        }

        Ok(())
    }
}

impl Cook for Chef {
    fn cook(&self, recipe: &UpdateRecipe, cancel: &CancelToken) -> Result<()> {
        cancel.err_if_cancelled()?;
        self.prepare_target_dir(recipe)?;

        for file in recipe.copies() {
            cancel.err_if_cancelled()?;
            self.copy(recipe, file)?;
        }

        let downloads: Vec<&UpdateRecipeFile> = recipe.downloads().collect();
        if !downloads.is_empty() {
            info!(
                "Fetching {} files ({} bytes) for version {}",
                downloads.len(),
                recipe.download_size(),
                recipe.new_version
            );

            // One concurrent job per file; the call resolves once every
            // job has finished, and the first failure wins
            let results: Vec<Result<()>> = downloads
                .par_iter()
                .map(|&file| {
                    cancel.err_if_cancelled()?;
                    self.fetch(recipe, file)
                })
                .collect();

            for result in results {
                result?;
            }
        }

        info!("Version {} materialized", recipe.new_version);
        Ok(())
    }
}
