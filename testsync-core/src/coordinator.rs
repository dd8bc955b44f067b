//! Build-scoped registry of sync files
//!
//! One [`Coordinator`] lives in the controlling process for the duration of a
//! build. It maps every requested tag to a zero-length file under a
//! seed-namespaced folder and hands out the encoded mapping to workers.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol;
use crate::settings::{SyncSettings, SYNC_FILE_BASE, SYNC_FOLDER_PREFIX};
use crate::types::SyncProperty;

/// Per-tag registry entry
///
/// `state` doubles as the creation guard: it is only ever locked for this tag,
/// so first use of unrelated tags never serializes.
struct RegistryEntry {
    tag: String,
    seed: u64,
    state: Mutex<Option<EntryState>>,
}

#[derive(Debug, Clone)]
struct EntryState {
    file_path: PathBuf,
}

impl RegistryEntry {
    fn new(tag: &str, seed: u64) -> Self {
        Self {
            tag: tag.to_string(),
            seed,
            state: Mutex::new(None),
        }
    }

    /// Create the sync file on first call, reuse it afterwards
    fn get_or_create(&self, folder: &Path) -> Result<PathBuf> {
        let mut state = self.state.lock();
        if let Some(existing) = state.as_ref() {
            return Ok(existing.file_path.clone());
        }

        let file_path = folder.join(format!("{}{}", SYNC_FILE_BASE, self.tag));
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&file_path)?;
        log::debug!(
            "Created sync file [{}] for tag [{}] (seed {})",
            file_path.display(),
            self.tag,
            self.seed
        );

        *state = Some(EntryState {
            file_path: file_path.clone(),
        });
        Ok(file_path)
    }

    fn state(&self) -> Option<EntryState> {
        self.state.lock().clone()
    }
}

/// Owner of the tag to sync file registry for one build
pub struct Coordinator {
    seed: u64,
    sync_folder: PathBuf,
    registry: DashMap<String, Arc<RegistryEntry>>,
}

impl Coordinator {
    /// Create a coordinator with a fresh random seed
    ///
    /// Fails with [`Error::Configuration`] when no usable shared temp
    /// directory is available.
    pub fn new(settings: &SyncSettings) -> Result<Self> {
        Self::with_seed(settings, fastrand::u64(..))
    }

    /// Create a coordinator with an explicit seed
    pub fn with_seed(settings: &SyncSettings, seed: u64) -> Result<Self> {
        let temp_dir = settings.resolve_temp_dir()?;
        let sync_folder = temp_dir.join(format!("{}{}", SYNC_FOLDER_PREFIX, seed));
        log::debug!(
            "Coordinator ready: seed -> [{}], sync folder -> [{}]",
            seed,
            sync_folder.display()
        );

        Ok(Self {
            seed,
            sync_folder,
            registry: DashMap::new(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Folder holding this build's sync files (created lazily)
    pub fn sync_folder(&self) -> &Path {
        &self.sync_folder
    }

    /// Sync file of a tag, if it has been created
    pub fn sync_file(&self, tag: &str) -> Option<PathBuf> {
        let entry = self.registry.get(tag).map(|e| Arc::clone(e.value()))?;
        entry.state().map(|s| s.file_path)
    }

    /// Tags that currently own a sync file
    pub fn registered_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .registry
            .iter()
            .filter(|e| e.value().state().is_some())
            .map(|e| e.key().clone())
            .collect();
        tags.sort();
        tags
    }

    /// Resolve the sync file of every tag and encode the mapping
    ///
    /// An empty tag list yields an empty payload without touching the
    /// filesystem. Safe to call from many threads at once.
    pub fn request_sync_property<S: AsRef<str>>(&self, tags: &[S]) -> Result<SyncProperty> {
        if tags.is_empty() {
            return Ok(SyncProperty::empty(self.seed));
        }

        let mut seen = HashSet::with_capacity(tags.len());
        for tag in tags {
            let tag = tag.as_ref();
            protocol::validate_tag(tag)?;
            if !seen.insert(tag) {
                return Err(Error::InvalidTag(format!(
                    "tag [{}] was requested more than once",
                    tag
                )));
            }
        }

        fs::create_dir_all(&self.sync_folder)?;

        let mut resolved = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag = tag.as_ref();
            // clone the Arc so the shard lock is released before file creation
            let entry = Arc::clone(
                self.registry
                    .entry(tag.to_string())
                    .or_insert_with(|| Arc::new(RegistryEntry::new(tag, self.seed)))
                    .value(),
            );
            let path = entry.get_or_create(&self.sync_folder)?;
            resolved.push((tag, path));
        }

        let payload = protocol::encode(resolved.iter().map(|(tag, path)| (*tag, path)));
        log::debug!(
            "Initialized state: seed -> [{}], sync property -> [{}]",
            self.seed,
            payload
        );
        Ok(SyncProperty::new(self.seed, payload))
    }

    /// Delete every sync file, then the shared folder
    ///
    /// Never fails: each problem is logged and returned for inspection.
    /// Calling it before the folder exists is a no-op.
    pub fn close(&self) -> Vec<Error> {
        let mut errors = Vec::new();

        let tags: Vec<String> = self.registry.iter().map(|e| e.key().clone()).collect();
        for tag in tags {
            let Some((_, entry)) = self.registry.remove(&tag) else {
                continue;
            };
            let Some(state) = entry.state() else {
                continue;
            };

            match fs::remove_file(&state.file_path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    log::error!(
                        "Failed to delete sync file [{}] - {}",
                        state.file_path.display(),
                        source
                    );
                    errors.push(Error::Cleanup {
                        path: state.file_path.clone(),
                        source,
                    });
                }
            }
        }

        // the folder may exist even when no file creation succeeded
        let folder = &self.sync_folder;
        if folder.exists() {
            match fs::remove_dir(folder) {
                Ok(()) => log::debug!("Removed sync folder [{}]", folder.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    log::error!(
                        "Failed to delete sync folder [{}] - {}",
                        folder.display(),
                        source
                    );
                    errors.push(Error::Cleanup {
                        path: folder.clone(),
                        source,
                    });
                }
            }
        }

        errors
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("seed", &self.seed)
            .field("sync_folder", &self.sync_folder)
            .field("tags", &self.registered_tags())
            .finish()
    }
}
