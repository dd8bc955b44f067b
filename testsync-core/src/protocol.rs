//! Wire format of the sync property
//!
//! ```text
//! tag1<TAG_SEPARATOR>absPath1<PROPERTY_SEPARATOR>tag2<TAG_SEPARATOR>absPath2...
//! ```
//!
//! Neither tags nor paths may contain a separator literal. Decoding is all or
//! nothing: one malformed segment rejects the whole payload.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::settings::{PROPERTY_SEPARATOR, TAG_SEPARATOR};

/// Check that a tag can be used both on the wire and as a file name suffix
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(Error::InvalidTag("tag must not be empty".to_string()));
    }
    if tag.contains(TAG_SEPARATOR) || tag.contains(PROPERTY_SEPARATOR) {
        return Err(Error::InvalidTag(format!(
            "tag [{}] contains a reserved separator",
            tag
        )));
    }
    if tag.contains('/') || tag.contains('\\') || tag == "." || tag == ".." {
        return Err(Error::InvalidTag(format!(
            "tag [{}] cannot be used as a file name",
            tag
        )));
    }
    Ok(())
}

/// Encode `(tag, path)` pairs into a single payload string
pub fn encode<'a, I, P>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, P)>,
    P: AsRef<Path>,
{
    entries
        .into_iter()
        .map(|(tag, path)| format!("{}{}{}", tag, TAG_SEPARATOR, path.as_ref().display()))
        .collect::<Vec<_>>()
        .join(PROPERTY_SEPARATOR)
}

/// Decode a payload into `(tag, path)` pairs
///
/// Blank input decodes to an empty list. Trailing empty segments are ignored.
pub fn decode(raw: &str) -> Result<Vec<(String, PathBuf)>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut segments: Vec<&str> = raw.split(PROPERTY_SEPARATOR).collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    segments.into_iter().map(decode_segment).collect()
}

fn decode_segment(segment: &str) -> Result<(String, PathBuf)> {
    let fields: Vec<&str> = segment.split(TAG_SEPARATOR).collect();
    let [tag, path] = fields.as_slice() else {
        return Err(Error::Parse(format!(
            "segment [{}] does not have exactly two fields",
            segment
        )));
    };

    if tag.is_empty() || path.is_empty() {
        return Err(Error::Parse(format!(
            "segment [{}] has an empty tag or path",
            segment
        )));
    }

    let path = PathBuf::from(path);
    if !path.is_absolute() {
        return Err(Error::Parse(format!(
            "sync file path [{}] is not absolute",
            path.display()
        )));
    }

    Ok((tag.to_string(), path))
}
