//! Shared data types

use serde::{Deserialize, Serialize};

/// Encoded tag to sync file mapping handed to worker processes
///
/// The payload is empty when no tags were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProperty {
    seed: u64,
    payload: String,
}

impl SyncProperty {
    pub(crate) fn new(seed: u64, payload: String) -> Self {
        Self { seed, payload }
    }

    pub(crate) fn empty(seed: u64) -> Self {
        Self::new(seed, String::new())
    }

    /// Build-unique seed of the coordinator that produced this property
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Encoded payload
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Final status of one test execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Passed,
    Failed,
    Aborted,
    Skipped,
}

impl TestOutcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            TestOutcome::Passed
        } else {
            TestOutcome::Failed
        }
    }
}

/// What the host test framework tells the listener about one execution
pub trait TestDescriptor {
    /// Identifier stable for the lifetime of this execution
    fn unique_id(&self) -> &str;

    /// Tags declared on the test
    fn tags(&self) -> &[String];

    /// `false` for containers and groups, which are never synchronized
    fn is_test(&self) -> bool {
        true
    }

    fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t == tag)
    }
}

/// Plain [`TestDescriptor`] for hosts without their own identifier type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub container: bool,
}

impl TestCase {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tags: Vec::new(),
            container: false,
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn container(mut self) -> Self {
        self.container = true;
        self
    }
}

impl TestDescriptor for TestCase {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn is_test(&self) -> bool {
        !self.container
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_property() {
        let property = SyncProperty::empty(42);
        assert_eq!(property.seed(), 42);
        assert!(property.is_empty());
        assert_eq!(property.payload(), "");
    }

    #[test]
    fn test_case_builder() {
        let case = TestCase::new("suite::a").tag("db").tags(["net", "fs"]);
        assert_eq!(case.unique_id(), "suite::a");
        assert!(case.is_test());
        assert!(case.has_tag("net"));
        assert!(!case.has_tag("cache"));

        let group = TestCase::new("suite").container();
        assert!(!group.is_test());
    }

    #[test]
    fn test_outcome_from_success() {
        assert_eq!(TestOutcome::from_success(true), TestOutcome::Passed);
        assert_eq!(TestOutcome::from_success(false), TestOutcome::Failed);
    }
}
