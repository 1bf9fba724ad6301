// src/store/config.rs

//! Persisted installation config.
//!
//! A single small TOML document co-located with the version
//! directories. Pointer updates are read-modify-write on this document;
//! there is no cross-process coordination (last writer wins).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config document inside the installation root
pub const CONFIG_FILE: &str = "config.toml";

/// The persisted pointer state of one installation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// The version the installation should run next
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The most recent version confirmed to execute successfully,
    /// retained as a rollback target for an external supervisor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_version: Option<String>,

    /// Remote origin serving version documents, manifests, and payloads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_server: Option<String>,
}

impl StoreConfig {
    /// Read the config document
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", path.display())))?;
        toml::from_str(&data)
            .map_err(|e| Error::ParseError(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Write the config document
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = toml::to_string(self)
            .map_err(|e| Error::ParseError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, data)
            .map_err(|e| Error::IoError(format!("Failed to write {}: {e}", path.display())))
    }
}
