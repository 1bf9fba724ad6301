// src/server/mod.rs

//! Remote origin serving version documents, manifests, and payloads.
//!
//! Layout on the origin:
//!
//! ```text
//! <root>/version.json             latest published version
//! <root>/<version>/manifest.json  manifest for that version
//! <root>/<version>/<path>         payload: gzip full file or patch blob
//! ```
//!
//! Payloads carry no content-type signal; the recipe's recorded action
//! decides how fetched bytes are interpreted. Fetch failures propagate
//! to the caller with no internal retry: the polling scheduler is the
//! retry cadence.

use crate::error::{Error, Result};
use crate::manifest::VersionManifest;
use crate::version::Version;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the version document at the origin root
const VERSION_DOC: &str = "version.json";

/// Name of the manifest document inside each version tree
const MANIFEST_DOC: &str = "manifest.json";

/// The remote origin as the update client consumes it
pub trait UpdateServer: Send + Sync {
    /// The latest published version
    fn current_version(&self) -> Result<Version>;

    /// The manifest for a published version
    fn manifest(&self, version: &Version) -> Result<VersionManifest>;

    /// Raw payload bytes for a file of a published version
    fn download_file(&self, version: &Version, path: &str) -> Result<Vec<u8>>;
}

/// Wire form of the version document
#[derive(Deserialize)]
struct VersionDoc {
    version: String,
}

/// HTTP update server
pub struct HttpUpdateServer {
    base_url: Url,
    client: Client,
}

impl HttpUpdateServer {
    /// Create a client for the origin at `base_url`
    pub fn new(base_url: Url) -> Result<Self> {
        let base_url = ensure_trailing_slash(base_url);
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { base_url, client })
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::ParseError(format!("Invalid remote path '{path}': {e}")))
    }

    fn version_path(version: &Version, path: &str) -> String {
        format!("{version}/{path}")
    }

    fn fetch_bytes(&self, url: Url) -> Result<Vec<u8>> {
        debug!("Downloading from {url}");

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "Failed to fetch {url}: HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| Error::DownloadError(format!("Failed to read response from {url}: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn fetch_text(&self, url: Url) -> Result<String> {
        let bytes = self.fetch_bytes(url.clone())?;
        String::from_utf8(bytes)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in response from {url}: {e}")))
    }
}

impl UpdateServer for HttpUpdateServer {
    fn current_version(&self) -> Result<Version> {
        let data = self.fetch_text(self.join(VERSION_DOC)?)?;
        let doc: VersionDoc = serde_json::from_str(&data)
            .map_err(|e| Error::ParseError(format!("Failed to parse version document: {e}")))?;
        doc.version.parse()
    }

    fn manifest(&self, version: &Version) -> Result<VersionManifest> {
        let path = Self::version_path(version, MANIFEST_DOC);
        let data = self.fetch_text(self.join(&path)?)?;
        VersionManifest::from_json(version.clone(), &data)
    }

    fn download_file(&self, version: &Version, path: &str) -> Result<Vec<u8>> {
        let path = Self::version_path(version, path);
        self.fetch_bytes(self.join(&path)?)
    }
}

fn ensure_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(base: &str) -> HttpUpdateServer {
        HttpUpdateServer::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_join_version_document() {
        let server = server("http://updates.example.com/app");
        let url = server.join(VERSION_DOC).unwrap();
        assert_eq!(url.as_str(), "http://updates.example.com/app/version.json");
    }

    #[test]
    fn test_join_versioned_file() {
        let server = server("http://updates.example.com/app/");
        let path = HttpUpdateServer::version_path(&"1.2.3".parse().unwrap(), "bin/app.deploy");
        let url = server.join(&path).unwrap();
        assert_eq!(
            url.as_str(),
            "http://updates.example.com/app/1.2.3/bin/app.deploy"
        );
    }

    #[test]
    fn test_version_path_uses_display_form() {
        let path = HttpUpdateServer::version_path(&"3.1".parse().unwrap(), MANIFEST_DOC);
        assert_eq!(path, "3.1/manifest.json");
    }
}
