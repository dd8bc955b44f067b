//! TestSync Core
//!
//! This crate keeps tests that share a tag from running at the same time, even
//! when they execute in different worker processes, while every other test
//! stays fully parallel.
//!
//! # Design Principles
//!
//! - **Cross-process**: Exclusion is backed by OS advisory locks on shared files
//! - **Fine-grained**: First use of one tag never waits on another tag
//! - **Fail-open**: A broken payload or lock never fails a test, it only logs
//! - **Explicit lifecycle**: Construct, use, close; no global registry
//!
//! # Architecture
//!
//! 1. The controlling process builds a [`Coordinator`] for the build
//! 2. [`Coordinator::request_sync_property`] creates one sync file per tag and
//!    encodes the mapping into a [`SyncProperty`]
//! 3. The payload travels into each worker (usually an environment variable)
//! 4. A [`SyncListener`] in the worker parses it once and locks the sync files
//!    of each tagged test between its start and finish events
//! 5. [`Coordinator::close`] removes the files when the build ends
//!
//! # Example
//!
//! ```rust
//! use testsync_core::*;
//!
//! # fn main() -> testsync_core::Result<()> {
//! let coordinator = Coordinator::new(&SyncSettings::default())?;
//! let property = coordinator.request_sync_property(&["db"])?;
//!
//! // in the worker process
//! let listener = SyncListener::from_raw(Some(property.payload()));
//! let test = TestCase::new("suite::writes_rows").tag("db");
//! {
//!     let _guard = listener.guard(&test);
//!     // test body runs while holding the "db" lock
//! }
//!
//! coordinator.close();
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod error;
pub mod listener;
pub mod protocol;
pub mod settings;
#[cfg(test)]
mod test_utils;
pub mod types;

pub use coordinator::Coordinator;
pub use error::{Error, Result};
pub use listener::{parse, SyncListener, SyncTag, TestGuard};
pub use settings::{
    SyncSettings, DEFAULT_PROPERTY_NAME, PROPERTY_SEPARATOR, SYNC_FILE_BASE, SYNC_FOLDER_PREFIX,
    TAG_SEPARATOR,
};
pub use types::{SyncProperty, TestCase, TestDescriptor, TestOutcome};
