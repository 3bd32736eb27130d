//! Fixed table of scripts offered for download.
//!
//! Each entry pairs a public route name with a file name inside the
//! configured scripts directory. Request data only ever selects an entry by
//! name; it never contributes to the file path.

use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// A single downloadable script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptAsset {
    /// Route segment the script is served under (e.g. `init_nginx`).
    pub name: String,
    /// File name inside the scripts directory, also used in
    /// `Content-Disposition`.
    pub file_name: String,
}

/// Downloadable scripts rooted at a single directory.
#[derive(Debug, Clone)]
pub struct ScriptCatalog {
    root: PathBuf,
    assets: Vec<ScriptAsset>,
}

impl ScriptCatalog {
    /// Build a catalog from explicit `(name, file_name)` pairs.
    pub fn new<I, N, F>(root: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = (N, F)>,
        N: Into<String>,
        F: Into<String>,
    {
        let assets = entries
            .into_iter()
            .map(|(name, file_name)| ScriptAsset {
                name: name.into(),
                file_name: file_name.into(),
            })
            .collect();

        Self {
            root: root.into(),
            assets,
        }
    }

    /// The provisioning scripts served by the host.
    pub fn standard(root: impl Into<PathBuf>) -> Self {
        Self::new(
            root,
            [
                ("setup_agent_vm", "agent_vm_ulm.ps1"),
                ("init_nginx", "init_nginx.sh"),
                ("update_srv_ip", "update_srv_ip.sh"),
            ],
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assets(&self) -> &[ScriptAsset] {
        &self.assets
    }

    /// Look up a script by route name.
    pub fn get(&self, name: &str) -> Result<&ScriptAsset, CoreError> {
        self.assets
            .iter()
            .find(|asset| asset.name == name)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Script",
                id: name.to_string(),
            })
    }

    /// Absolute (or root-relative) path of a catalog entry on disk.
    pub fn path_of(&self, asset: &ScriptAsset) -> PathBuf {
        self.root.join(&asset.file_name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
