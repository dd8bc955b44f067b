#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use testsync_core::*;

/// Coordinator rooted in a private temp directory
pub struct TestFixture {
    pub coordinator: Coordinator,
    pub dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(&Self::settings_for(dir.path())).unwrap();
        Self { coordinator, dir }
    }

    pub fn settings_for(path: &Path) -> SyncSettings {
        SyncSettings::default().with_temp_dir(path)
    }

    pub fn settings(&self) -> SyncSettings {
        Self::settings_for(self.dir.path())
    }

    /// Every file currently inside the sync folder
    pub fn sync_files(&self) -> Vec<PathBuf> {
        match fs::read_dir(self.coordinator.sync_folder()) {
            Ok(entries) => {
                let mut files: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
                files.sort();
                files
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn listener_for(&self, tags: &[&str]) -> SyncListener {
        let property = self.coordinator.request_sync_property(tags).unwrap();
        SyncListener::from_raw(Some(property.payload()))
    }
}

/// Build a raw payload by hand, bypassing the encoder
pub fn raw_payload(entries: &[(&str, &PathBuf)]) -> String {
    entries
        .iter()
        .map(|(tag, path)| format!("{}{}{}", tag, TAG_SEPARATOR, path.display()))
        .collect::<Vec<_>>()
        .join(PROPERTY_SEPARATOR)
}

pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::File::create(&path).unwrap();
    path
}
