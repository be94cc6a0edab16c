//! Write backends used by the engine's commit phase.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Persists the final content of one store file.
pub trait StoreWriter: fmt::Debug + Send + Sync {
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;
}

/// Overwrites the file in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectWriter;

impl StoreWriter for DirectWriter {
    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        fs::write(path, content)
    }
}

/// Writes to a temporary file next to the target, then renames it over the
/// target, so a crash never leaves a half-written store behind.
///
/// The original file's permissions are carried over. A symlinked store is
/// resolved first, so the link survives and its target is replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicRenameWriter;

impl StoreWriter for AtomicRenameWriter {
    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        let resolved = fs::canonicalize(path).ok();
        let path = resolved.as_deref().unwrap_or(path);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.persist(path).map_err(|err| err.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_writer_replaces_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("VERSION");
        fs::write(&path, "0.1.0").unwrap();

        AtomicRenameWriter.write(&path, "0.2.0").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0.2.0");

        let leftovers = fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary file should be renamed away");
    }

    #[cfg(unix)]
    #[test]
    fn atomic_writer_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("version.sh");
        fs::write(&path, "echo 1").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        AtomicRenameWriter.write(&path, "echo 2").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn atomic_writer_follows_symlinks() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("real-version.txt");
        let link = temp.path().join("VERSION");
        fs::write(&target, "0.1.0").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        AtomicRenameWriter.write(&link, "0.2.0").unwrap();
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&target).unwrap(), "0.2.0");
    }

    #[test]
    fn atomic_writer_creates_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("NEW");
        AtomicRenameWriter.write(&path, "1.0.0").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1.0.0");
    }

    #[test]
    fn direct_writer_fails_for_missing_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("VERSION");
        assert!(DirectWriter.write(&path, "1.0.0").is_err());
    }
}
