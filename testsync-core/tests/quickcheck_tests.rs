mod common;

use common::{raw_payload, touch};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use std::path::PathBuf;
use tempfile::TempDir;
use testsync_core::*;

// ============================================================================
// Custom Arbitrary Types
// ============================================================================

/// A segment that can never decode to a valid `(tag, path)` pair
#[derive(Clone, Debug)]
enum BrokenSegment {
    NoSeparator,
    EmptyTag,
    EmptyPath,
    ExtraField,
    RelativePath,
}

impl Arbitrary for BrokenSegment {
    fn arbitrary(g: &mut Gen) -> Self {
        match u8::arbitrary(g) % 5 {
            0 => BrokenSegment::NoSeparator,
            1 => BrokenSegment::EmptyTag,
            2 => BrokenSegment::EmptyPath,
            3 => BrokenSegment::ExtraField,
            _ => BrokenSegment::RelativePath,
        }
    }
}

impl BrokenSegment {
    fn render(&self) -> String {
        match self {
            BrokenSegment::NoSeparator => "justatag".to_string(),
            BrokenSegment::EmptyTag => format!("{}/tmp/x", TAG_SEPARATOR),
            BrokenSegment::EmptyPath => format!("tag{}", TAG_SEPARATOR),
            BrokenSegment::ExtraField => format!("a{0}/tmp/x{0}b", TAG_SEPARATOR),
            BrokenSegment::RelativePath => format!("a{}relative/x", TAG_SEPARATOR),
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

#[quickcheck]
fn one_broken_segment_poisons_the_batch(valid: u8, position: u8, broken: BrokenSegment) -> bool {
    let dir = TempDir::new().unwrap();
    let count = (valid % 5) as usize + 1;
    let files: Vec<PathBuf> = (0..count)
        .map(|i| touch(dir.path(), &format!("syncfile_t{}", i)))
        .collect();
    let tags: Vec<String> = (0..count).map(|i| format!("t{}", i)).collect();

    let mut segments: Vec<String> = tags
        .iter()
        .zip(&files)
        .map(|(tag, path)| raw_payload(&[(tag.as_str(), path)]))
        .collect();
    let at = position as usize % (segments.len() + 1);
    // a trailing empty segment is tolerated, so only insert non-empty breakage
    segments.insert(at, broken.render());

    let raw = segments.join(PROPERTY_SEPARATOR);
    parse(Some(&raw)).is_empty()
}

#[quickcheck]
fn valid_batches_parse_completely(valid: u8) -> bool {
    let dir = TempDir::new().unwrap();
    let count = (valid % 5) as usize + 1;
    let segments: Vec<String> = (0..count)
        .map(|i| {
            let path = touch(dir.path(), &format!("syncfile_t{}", i));
            raw_payload(&[(format!("t{}", i).as_str(), &path)])
        })
        .collect();

    parse(Some(&segments.join(PROPERTY_SEPARATOR))).len() == count
}
