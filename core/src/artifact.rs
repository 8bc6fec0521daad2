#![deny(missing_docs)]

//! # Target Artifact
//!
//! Loading a text file into a working buffer and persisting it back.
//!
//! The file is read completely before any stage runs and is written back in one
//! step at the end: a temp file in the same directory is filled, fsynced and
//! renamed over the target.

use crate::error::{AppError, AppResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A text file loaded fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    content: String,
}

impl Artifact {
    /// Reads the whole file at `path`.
    ///
    /// Fails with [`AppError::ArtifactNotFound`] if the path is missing or is not a
    /// regular file. Symlinks are resolved, so a later [`Artifact::persist`]
    /// replaces the link target and leaves the link in place.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let requested = path.as_ref();
        let not_found = |e: std::io::Error| match e.kind() {
            ErrorKind::NotFound => AppError::ArtifactNotFound(requested.to_path_buf()),
            _ => AppError::Io(e),
        };

        let path = fs::canonicalize(requested).map_err(not_found)?;
        if !path.is_file() {
            return Err(AppError::ArtifactNotFound(requested.to_path_buf()));
        }

        let content = fs::read_to_string(&path).map_err(not_found)?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "loaded artifact");

        Ok(Self { path, content })
    }

    /// The resolved path the artifact was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The buffer as read from disk.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replaces the file on disk with `content`.
    ///
    /// The bytes are written verbatim, no line-ending normalization.
    pub fn persist(&self, content: &str) -> AppResult<()> {
        write_atomic(&self.path, content)?;
        tracing::info!(path = %self.path.display(), bytes = content.len(), "artifact written");
        Ok(())
    }
}

fn write_atomic(path: &Path, content: &str) -> AppResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;

    // Keep the original permission bits, a fresh temp file is 0600.
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(temp.path(), meta.permissions())?;
    }

    temp.persist(path).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let res = Artifact::load(dir.path().join("proxy_server.py"));
        assert!(matches!(res, Err(AppError::ArtifactNotFound(_))));
    }

    #[test]
    fn test_load_directory_is_not_an_artifact() {
        let dir = tempdir().unwrap();
        let res = Artifact::load(dir.path());
        assert!(matches!(res, Err(AppError::ArtifactNotFound(_))));
    }

    #[test]
    fn test_persist_overwrites_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server.py");
        fs::write(&path, "old\r\nline\n").unwrap();

        let artifact = Artifact::load(&path).unwrap();
        assert_eq!(artifact.content(), "old\r\nline\n");

        artifact.persist("new\r\ncontent\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\r\ncontent\n");

        // No temp files left behind
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_persist_through_symlink_keeps_link() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("proxy_server.py");
        let link = dir.path().join("linked.py");
        fs::write(&real, "before\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let artifact = Artifact::load(&link).unwrap();
        assert_eq!(artifact.path(), fs::canonicalize(&real).unwrap());
        artifact.persist("after\n").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "after\n");
        assert_eq!(fs::read_to_string(&link).unwrap(), "after\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_not_found() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("linked.py");
        std::os::unix::fs::symlink(dir.path().join("gone.py"), &link).unwrap();
        let res = Artifact::load(&link);
        assert!(matches!(res, Err(AppError::ArtifactNotFound(ref p)) if p == &link));
    }
}
