//! Pre-order tree replication.
//!
//! Directories are recreated before anything inside them, so by the time a
//! file is written its destination parent already exists. The first error
//! aborts the whole copy; entries finished earlier stay in place.

use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{FsOpsError, FsOpsResult};

/// Reproduce the file/directory tree rooted at `source` under `destination`,
/// preserving permission bits and file contents.
///
/// Existing destination directories are reused; existing destination files
/// are truncated and rewritten. There is no rollback: a mid-copy failure
/// leaves the destination partially populated.
///
/// # Errors
///
/// Returns an error if the source cannot be traversed, a destination
/// directory cannot be created, or any read/write fails. The underlying
/// cause is preserved on the returned error.
pub fn replicate(source: &Path, destination: &Path) -> FsOpsResult<()> {
    if source.is_file() {
        copy_file_into(source, destination)?;
        debug!(
            source = %source.display(),
            destination = %destination.display(),
            "replicated single file"
        );
        return Ok(());
    }

    for entry in WalkDir::new(source) {
        let entry =
            entry.map_err(|source_err| FsOpsError::walkdir("replicate.walk", source, source_err))?;
        let relative =
            entry
                .path()
                .strip_prefix(source)
                .map_err(|_| FsOpsError::InvalidInput {
                    field: "source_path",
                    reason: "strip_prefix",
                    value: Some(entry.path().to_string_lossy().into_owned()),
                })?;
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            mirror_directory(&entry, &target)?;
        } else {
            copy_file_into(entry.path(), &target)?;
        }
    }

    debug!(
        source = %source.display(),
        destination = %destination.display(),
        "replicated tree"
    );
    Ok(())
}

fn mirror_directory(entry: &DirEntry, target: &Path) -> FsOpsResult<()> {
    fs::create_dir_all(target)
        .map_err(|source_err| FsOpsError::io("replicate.create_dir", target, source_err))?;

    #[cfg(unix)]
    {
        let metadata = entry.metadata().map_err(|source_err| {
            FsOpsError::walkdir("replicate.stat_dir", entry.path(), source_err)
        })?;
        fs::set_permissions(target, metadata.permissions()).map_err(|source_err| {
            FsOpsError::io("replicate.set_dir_permissions", target, source_err)
        })?;
    }
    #[cfg(not(unix))]
    let _ = entry;

    Ok(())
}

fn copy_file_into(origin: &Path, target: &Path) -> FsOpsResult<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|source_err| FsOpsError::io("replicate.create_parent", parent, source_err))?;
    }
    fs::copy(origin, target)
        .map_err(|source_err| FsOpsError::io("replicate.copy_file", target, source_err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fn collect_tree(root: &Path) -> Result<BTreeMap<PathBuf, Option<Vec<u8>>>> {
        let mut entries = BTreeMap::new();
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if entry.path() == root {
                continue;
            }
            let relative = entry.path().strip_prefix(root)?.to_path_buf();
            let contents = if entry.file_type().is_dir() {
                None
            } else {
                Some(fs::read(entry.path())?)
            };
            entries.insert(relative, contents);
        }
        Ok(entries)
    }

    #[test]
    fn round_trip_preserves_paths_and_contents() -> Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("source");
        fs::create_dir_all(source.join("season1").join("extras"))?;
        fs::write(source.join("episode.mkv"), b"video-bytes")?;
        fs::write(source.join("season1").join("notes.txt"), b"notes")?;
        fs::write(
            source.join("season1").join("extras").join("art.png"),
            b"pixels",
        )?;

        let destination = temp.path().join("library").join("title");
        replicate(&source, &destination)?;

        assert_eq!(collect_tree(&source)?, collect_tree(&destination)?);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn round_trip_preserves_permission_bits() -> Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("source");
        fs::create_dir_all(source.join("private"))?;
        fs::write(source.join("private").join("keys.txt"), b"secret")?;
        fs::set_permissions(source.join("private"), fs::Permissions::from_mode(0o750))?;
        fs::set_permissions(
            source.join("private").join("keys.txt"),
            fs::Permissions::from_mode(0o640),
        )?;

        let destination = temp.path().join("copy");
        replicate(&source, &destination)?;

        let dir_mode = fs::metadata(destination.join("private"))?.permissions().mode();
        let file_mode = fs::metadata(destination.join("private").join("keys.txt"))?
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o750);
        assert_eq!(file_mode & 0o777, 0o640);
        Ok(())
    }

    #[test]
    fn single_file_source_is_copied_directly() -> Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("payload.bin");
        fs::write(&source, b"blob")?;

        let destination = temp.path().join("out").join("payload.bin");
        replicate(&source, &destination)?;
        assert_eq!(fs::read(destination)?, b"blob");
        Ok(())
    }

    #[test]
    fn rerunning_over_an_existing_destination_overwrites_files() -> Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("source");
        fs::create_dir_all(&source)?;
        fs::write(source.join("movie.mkv"), b"version-1")?;

        let destination = temp.path().join("destination");
        replicate(&source, &destination)?;
        fs::write(source.join("movie.mkv"), b"version-2")?;
        replicate(&source, &destination)?;

        assert_eq!(fs::read(destination.join("movie.mkv"))?, b"version-2");
        Ok(())
    }

    #[test]
    fn missing_source_propagates_the_underlying_cause() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("absent");
        let destination = temp.path().join("destination");

        let err = replicate(&missing, &destination).expect_err("missing source should fail");
        assert!(matches!(err, FsOpsError::Walkdir { .. }));
        assert!(
            !destination.exists(),
            "no destination should be created for a missing source"
        );
    }

    #[test]
    fn first_error_aborts_without_rollback() -> Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("source");
        fs::create_dir_all(source.join("sub"))?;
        fs::write(source.join("top.txt"), b"top")?;
        fs::write(source.join("sub").join("inner.txt"), b"inner")?;

        // A file squatting on the destination's "sub" path makes the
        // directory step fail partway through the walk.
        let destination = temp.path().join("destination");
        fs::create_dir_all(&destination)?;
        fs::write(destination.join("sub"), b"blocker")?;

        let err = replicate(&source, &destination).expect_err("blocked subtree should fail");
        assert!(matches!(err, FsOpsError::Io { .. }));
        assert!(destination.exists(), "earlier work is left in place");
        assert_eq!(
            fs::read(destination.join("sub"))?,
            b"blocker",
            "the blocking entry is not replaced"
        );
        assert!(!destination.join("sub").join("inner.txt").exists());
        Ok(())
    }
}
