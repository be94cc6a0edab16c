//! Root-relative store paths

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// A path relative to the project root, normalized to forward slashes.
///
/// Never absolute, never empty, and never escapes the root through `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorePath(String);

impl StorePath {
    /// Normalize and check a user-supplied path.
    ///
    /// `\` is treated as a separator, empty and `.` segments are dropped and
    /// inner `..` segments are collapsed against their parent.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let unified = raw.replace('\\', "/");
        if unified.trim().is_empty() {
            return Err("path cannot be empty".to_string());
        }
        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err("path must be relative to the project root".to_string());
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err("path escapes the project root".to_string());
                    }
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err("path does not name a file".to_string());
        }
        Ok(StorePath(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased extension of the final segment, without the dot.
    pub fn extension(&self) -> Option<String> {
        let file_name = self.0.rsplit('/').next()?;
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Absolute location of the store under `root`.
    pub fn under(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StorePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}
