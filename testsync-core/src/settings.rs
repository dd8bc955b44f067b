//! Synchronization settings and wire constants

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Separates a tag from its sync file path inside one payload segment
pub const TAG_SEPARATOR: &str = "_:_:_";

/// Separates payload segments
pub const PROPERTY_SEPARATOR: &str = ":___:";

/// Prefix of the per-build folder created under the temp directory
pub const SYNC_FOLDER_PREFIX: &str = "testsync_";

/// Prefix of every sync file name
pub const SYNC_FILE_BASE: &str = "syncfile_";

/// Default name of the variable carrying the payload into worker processes
pub const DEFAULT_PROPERTY_NAME: &str = "TESTSYNC_SYNC_PROPERTY";

/// Settings shared by the coordinator and the worker listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Shared temporary directory; the system temp dir when unset
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Environment variable used to pass the payload to workers
    #[serde(default = "default_property_name")]
    pub property_name: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            temp_dir: None,
            property_name: default_property_name(),
        }
    }
}

impl SyncSettings {
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    pub fn with_property_name(mut self, name: impl Into<String>) -> Self {
        self.property_name = name.into();
        self
    }

    /// Resolve the shared temporary directory
    ///
    /// Fails with [`Error::Configuration`] unless the result is an existing
    /// directory.
    pub fn resolve_temp_dir(&self) -> Result<PathBuf> {
        let dir = match &self.temp_dir {
            Some(dir) => dir.clone(),
            None => std::env::temp_dir(),
        };

        if dir.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "no temporary directory is configured; test synchronization requires a shared temp folder"
                    .to_string(),
            ));
        }
        if !dir.is_dir() {
            return Err(Error::Configuration(format!(
                "temporary directory [{}] does not exist or is not a directory",
                dir.display()
            )));
        }

        Ok(dir)
    }
}

fn default_property_name() -> String {
    DEFAULT_PROPERTY_NAME.to_string()
}
