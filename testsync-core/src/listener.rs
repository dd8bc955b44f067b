//! Worker-side lock listener
//!
//! Runs inside every test-execution process. The payload produced by the
//! [`Coordinator`](crate::Coordinator) is parsed once at startup; afterwards
//! every leaf test that declares a synchronized tag holds the matching file
//! lock from its start event until its finish event.
//!
//! Failures here never fail a test. A broken payload disables synchronization
//! for the whole process, and a failed acquisition skips only that one lock.

use fs2::FileExt;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::protocol;
use crate::settings::SyncSettings;
use crate::types::{TestDescriptor, TestOutcome};

/// Blocking in-process gate
///
/// An advisory lock taken through one shared handle does not exclude other
/// threads of the same process, so each tag is gated here first.
#[derive(Default)]
struct ProcessGate {
    held: Mutex<bool>,
    released: Condvar,
}

impl ProcessGate {
    fn acquire(&self) {
        let mut held = self.held.lock();
        while *held {
            self.released.wait(&mut held);
        }
        *held = true;
    }

    fn release(&self) {
        *self.held.lock() = false;
        self.released.notify_one();
    }
}

/// One synchronized tag with its persistent sync file handle
pub struct SyncTag {
    tag: String,
    path: PathBuf,
    file: File,
    gate: ProcessGate,
    #[cfg(test)]
    refuse_lock: std::sync::atomic::AtomicBool,
}

impl SyncTag {
    /// Open the sync file read/write; it must already exist
    pub fn open(tag: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(Self {
            tag: tag.into(),
            path,
            file,
            gate: ProcessGate::default(),
            #[cfg(test)]
            refuse_lock: std::sync::atomic::AtomicBool::new(false),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until this process and every other one have let go of the tag
    fn lock(&self) -> Result<()> {
        self.gate.acquire();
        if let Err(source) = self.lock_file() {
            self.gate.release();
            return Err(Error::LockAcquisition {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn lock_file(&self) -> std::io::Result<()> {
        FileExt::lock_exclusive(&self.file)
    }

    #[cfg(test)]
    fn lock_file(&self) -> std::io::Result<()> {
        if self.refuse_lock.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "lock refused",
            ));
        }
        FileExt::lock_exclusive(&self.file)
    }

    fn unlock(&self) -> std::io::Result<()> {
        let result = FileExt::unlock(&self.file);
        self.gate.release();
        result
    }
}

impl std::fmt::Debug for SyncTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncTag")
            .field("tag", &self.tag)
            .field("path", &self.path)
            .finish()
    }
}

/// Parse a raw sync property and open a handle per tag
///
/// Returns an empty list when the input is absent or blank, and also when any
/// segment is malformed, duplicated, or names a missing file: either every
/// declared tag is protected or none is.
pub fn parse(raw: Option<&str>) -> Vec<SyncTag> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match try_parse(raw) {
        Ok(tags) => tags,
        Err(e) => {
            log::warn!(
                "Test synchronization will be disabled, failed to parse sync tags [{}] - {}",
                raw,
                e
            );
            Vec::new()
        }
    }
}

fn try_parse(raw: &str) -> Result<Vec<SyncTag>> {
    let entries = protocol::decode(raw)?;

    let mut seen = HashSet::with_capacity(entries.len());
    for (tag, _) in &entries {
        if !seen.insert(tag.as_str()) {
            return Err(Error::Parse(format!("tag [{}] appears more than once", tag)));
        }
    }

    entries
        .into_iter()
        .map(|(tag, path)| SyncTag::open(tag, path))
        .collect()
}

/// Reacts to test start/finish events by taking and releasing tag locks
pub struct SyncListener {
    tags: Vec<SyncTag>,
    held: Mutex<HashMap<String, Vec<usize>>>,
}

impl SyncListener {
    /// Tags are locked in name order, whatever order the payload lists them in
    pub fn new(mut tags: Vec<SyncTag>) -> Self {
        tags.sort_by(|a, b| a.tag.cmp(&b.tag));
        Self {
            tags,
            held: Mutex::new(HashMap::new()),
        }
    }

    /// Listener whose handlers do nothing
    pub fn disabled() -> Self {
        Self::new(Vec::new())
    }

    pub fn from_raw(raw: Option<&str>) -> Self {
        Self::new(parse(raw))
    }

    /// Build from the payload variable named in `settings`
    pub fn from_env(settings: &SyncSettings) -> Self {
        let raw = std::env::var_os(&settings.property_name);
        let raw = match raw.as_ref().map(|v| v.to_str()) {
            None => None,
            Some(Some(value)) => Some(value),
            Some(None) => {
                log::warn!(
                    "Test synchronization will be disabled, [{}] is not valid UTF-8",
                    settings.property_name
                );
                None
            }
        };
        Self::from_raw(raw)
    }

    pub fn is_enabled(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Synchronized tags, sorted by name
    pub fn tags(&self) -> &[SyncTag] {
        &self.tags
    }

    /// Tags currently held for a test id
    pub fn held_tags(&self, unique_id: &str) -> Vec<&str> {
        self.held
            .lock()
            .get(unique_id)
            .map(|indices| indices.iter().map(|&i| self.tags[i].tag()).collect())
            .unwrap_or_default()
    }

    /// Number of test ids with recorded locks
    pub fn active_tests(&self) -> usize {
        self.held.lock().len()
    }

    /// Acquire every synchronized tag the test declares
    ///
    /// Blocks until all of them are granted. Containers are ignored.
    pub fn on_test_started<T: TestDescriptor + ?Sized>(&self, test: &T) {
        if self.tags.is_empty() || !test.is_test() || test.tags().is_empty() {
            return;
        }

        let id = test.unique_id();
        let stale = self.held.lock().remove(id);
        if let Some(stale) = stale {
            log::warn!(
                "Test [{}] started again while still holding locks, releasing them first",
                id
            );
            self.release_all(id, &stale);
        }

        let mut acquired = Vec::new();
        for (index, sync_tag) in self.tags.iter().enumerate() {
            if !test.has_tag(sync_tag.tag()) {
                continue;
            }
            match sync_tag.lock() {
                Ok(()) => {
                    log::debug!("Test [{}] acquired lock [{}]", id, sync_tag.tag());
                    acquired.push(index);
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        if !acquired.is_empty() {
            self.held.lock().insert(id.to_string(), acquired);
        }
    }

    /// Release whatever was recorded for the test, whatever its outcome
    pub fn on_test_finished<T: TestDescriptor + ?Sized>(&self, test: &T, outcome: TestOutcome) {
        if self.tags.is_empty() || !test.is_test() {
            return;
        }

        let id = test.unique_id();
        let recorded = self.held.lock().remove(id);
        if let Some(recorded) = recorded {
            log::debug!("Test [{}] finished ({:?}), releasing locks", id, outcome);
            self.release_all(id, &recorded);
        }
    }

    /// Fire the start event now and the finish event when the guard drops
    pub fn guard<'a, T: TestDescriptor + ?Sized>(&'a self, test: &'a T) -> TestGuard<'a, T> {
        self.on_test_started(test);
        TestGuard {
            listener: self,
            test,
            outcome: None,
        }
    }

    fn release_all(&self, id: &str, indices: &[usize]) {
        for &index in indices {
            let sync_tag = &self.tags[index];
            if let Err(e) = sync_tag.unlock() {
                log::warn!(
                    "Failed to release file lock for file [{}] held by test [{}] - {}",
                    sync_tag.path().display(),
                    id,
                    e
                );
            }
        }
    }
}

impl Default for SyncListener {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for SyncListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncListener")
            .field("tags", &self.tags)
            .field("active_tests", &self.active_tests())
            .finish()
    }
}

/// Holds a test's locks until dropped
///
/// The finish outcome defaults to `Passed`, or `Failed` when dropped during a
/// panic.
#[must_use = "locks are released as soon as the guard is dropped"]
pub struct TestGuard<'a, T: TestDescriptor + ?Sized> {
    listener: &'a SyncListener,
    test: &'a T,
    outcome: Option<TestOutcome>,
}

impl<'a, T: TestDescriptor + ?Sized> TestGuard<'a, T> {
    pub fn finish(mut self, outcome: TestOutcome) {
        self.outcome = Some(outcome);
    }
}

impl<'a, T: TestDescriptor + ?Sized> Drop for TestGuard<'a, T> {
    fn drop(&mut self) {
        let outcome = self.outcome.unwrap_or(if std::thread::panicking() {
            TestOutcome::Failed
        } else {
            TestOutcome::Passed
        });
        self.listener.on_test_finished(self.test, outcome);
    }
}
