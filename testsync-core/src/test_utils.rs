//! Shared test utilities
//!
//! This module provides shared resources for tests to prevent race conditions.

lazy_static::lazy_static! {
    /// Serializes tests that read or write process environment variables
    pub static ref ENV_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());
}
