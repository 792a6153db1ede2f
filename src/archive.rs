// Archiver: moves an original image into a sibling `originals` folder
// before anything is derived from it. The folder is created on demand and
// the move is a plain `fs::rename`, so on one file system it is atomic.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the folder originals are moved into, next to each picked file.
pub const ORIGINALS_DIR: &str = "originals";

/// What to do when `originals/<name>` already exists.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Leave the source where it is and the archived copy untouched.
    #[default]
    Skip,
    /// Stop the batch with an error.
    Fail,
    /// Archive under the first free `<stem>-<n>.<ext>` name.
    Rename,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            "rename" => Ok(Self::Rename),
            other => Err(format!(
                "unknown collision policy `{other}`; expected skip|fail|rename"
            )),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Skip => "skip",
            Self::Fail => "fail",
            Self::Rename => "rename",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Invalid path (no file name): {path}")]
    InvalidPath { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Already archived: {existing} (source left at {source_path})")]
    Collision {
        source_path: PathBuf,
        existing: PathBuf,
    },

    #[error("Failed to create {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Result of archiving one file.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArchiveOutcome {
    Moved { to: PathBuf },
    Skipped { existing: PathBuf },
    Renamed { to: PathBuf },
}

impl ArchiveOutcome {
    /// The archived original the shadow is rendered from. On a skip this
    /// is the copy already in `originals`, so re-runs never read an output.
    pub fn archived_path(&self) -> &Path {
        match self {
            Self::Moved { to } | Self::Renamed { to } => to.as_path(),
            Self::Skipped { existing } => existing.as_path(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Location split of a picked file: its folder and its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceParts {
    pub dir: PathBuf,
    pub file_name: OsString,
}

impl SourceParts {
    pub fn of(path: &Path) -> Result<Self, ArchiveError> {
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| ArchiveError::InvalidPath {
                path: path.to_path_buf(),
            })?;
        // `a.jpg` has parent `""`; joining onto it stays relative to cwd.
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self { dir, file_name })
    }

    pub fn originals_dir(&self) -> PathBuf {
        self.dir.join(ORIGINALS_DIR)
    }
}

/// Creates `dir/originals` if it does not exist yet. Single level only:
/// fails when `dir` itself is missing.
pub fn ensure_originals_dir(dir: &Path) -> Result<PathBuf, ArchiveError> {
    let originals = dir.join(ORIGINALS_DIR);
    if originals.exists() {
        if !originals.is_dir() {
            return Err(ArchiveError::NotADirectory { path: originals });
        }
        return Ok(originals);
    }
    fs::create_dir(&originals).map_err(|source| ArchiveError::CreateDir {
        path: originals.clone(),
        source,
    })?;
    info!("event=originals_created dir={}", originals.display());
    Ok(originals)
}

/// Moves `path` into its sibling `originals` folder, honoring `policy` when
/// a file of the same name is already archived there.
pub fn archive_original(
    path: &Path,
    policy: CollisionPolicy,
) -> Result<ArchiveOutcome, ArchiveError> {
    let parts = SourceParts::of(path)?;
    let originals = ensure_originals_dir(&parts.dir)?;
    let target = originals.join(&parts.file_name);

    if !target.exists() {
        move_file(path, &target)?;
        info!(
            "event=archive_moved from={} to={}",
            path.display(),
            target.display()
        );
        return Ok(ArchiveOutcome::Moved { to: target });
    }

    match policy {
        CollisionPolicy::Skip => {
            warn!(
                "event=archive_skipped source={} existing={}",
                path.display(),
                target.display()
            );
            Ok(ArchiveOutcome::Skipped { existing: target })
        }
        CollisionPolicy::Fail => Err(ArchiveError::Collision {
            source_path: path.to_path_buf(),
            existing: target,
        }),
        CollisionPolicy::Rename => {
            let free = first_free_name(&originals, &parts.file_name);
            move_file(path, &free)?;
            info!(
                "event=archive_renamed from={} to={}",
                path.display(),
                free.display()
            );
            Ok(ArchiveOutcome::Renamed { to: free })
        }
    }
}

fn move_file(from: &Path, to: &Path) -> Result<(), ArchiveError> {
    fs::rename(from, to).map_err(|source| ArchiveError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// First `<stem>-<n>[.<ext>]` in `dir` that does not exist, n starting at 1.
/// Works on raw OS names so non-UTF-8 file names survive unchanged.
fn first_free_name(dir: &Path, file_name: &OsStr) -> PathBuf {
    let name = Path::new(file_name);
    let stem = name.file_stem().unwrap_or(file_name);
    let ext = name.extension();

    let mut n: u32 = 1;
    loop {
        let mut candidate_name = stem.to_os_string();
        candidate_name.push(format!("-{n}"));
        if let Some(ext) = ext {
            candidate_name.push(".");
            candidate_name.push(ext);
        }
        let candidate = dir.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn source_parts_splits_dir_and_name() {
        let parts = SourceParts::of(Path::new("/photos/board.jpg")).unwrap();
        assert_eq!(parts.dir, PathBuf::from("/photos"));
        assert_eq!(parts.file_name.as_os_str(), OsStr::new("board.jpg"));
        assert_eq!(parts.originals_dir(), PathBuf::from("/photos/originals"));
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        let parts = SourceParts::of(Path::new("board.jpg")).unwrap();
        assert_eq!(parts.originals_dir(), PathBuf::from("originals"));
    }

    #[test]
    fn path_without_file_name_is_invalid() {
        let err = SourceParts::of(Path::new("/")).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidPath { .. }));
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Rename".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Rename));
        assert_eq!(" skip ".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Skip));
        assert!("overwrite".parse::<CollisionPolicy>().is_err());
    }

    #[test]
    fn originals_dir_that_is_a_file_is_rejected() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join(ORIGINALS_DIR), b"oops").unwrap();
        let err = ensure_originals_dir(tmp.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::NotADirectory { .. }));
    }

    #[test]
    fn missing_parent_dir_fails_to_create_originals() {
        let tmp = tempdir().unwrap();
        let err = ensure_originals_dir(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, ArchiveError::CreateDir { .. }));
    }

    #[test]
    fn first_free_name_skips_taken_suffixes() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a-1.jpg"), b"").unwrap();
        fs::write(tmp.path().join("a-2.jpg"), b"").unwrap();
        assert_eq!(
            first_free_name(tmp.path(), OsStr::new("a.jpg")),
            tmp.path().join("a-3.jpg")
        );
        assert_eq!(
            first_free_name(tmp.path(), OsStr::new("README")),
            tmp.path().join("README-1")
        );
    }

    #[test]
    fn archived_path_is_inside_originals_for_every_outcome() {
        let moved = ArchiveOutcome::Moved {
            to: PathBuf::from("/p/originals/a.jpg"),
        };
        let skipped = ArchiveOutcome::Skipped {
            existing: PathBuf::from("/p/originals/a.jpg"),
        };
        let renamed = ArchiveOutcome::Renamed {
            to: PathBuf::from("/p/originals/a-1.jpg"),
        };
        assert_eq!(moved.archived_path(), Path::new("/p/originals/a.jpg"));
        assert_eq!(skipped.archived_path(), Path::new("/p/originals/a.jpg"));
        assert_eq!(renamed.archived_path(), Path::new("/p/originals/a-1.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_archived_byte_for_byte() {
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempdir().unwrap();
        let name = OsStr::from_bytes(b"caf\xE9.jpg");
        let src = tmp.path().join(name);
        fs::write(&src, b"img").unwrap();

        let outcome = archive_original(&src, CollisionPolicy::Skip).unwrap();
        let expected = tmp.path().join(ORIGINALS_DIR).join(name);
        assert_eq!(outcome, ArchiveOutcome::Moved { to: expected.clone() });
        assert!(expected.is_file());

        fs::write(&src, b"again").unwrap();
        let renamed = archive_original(&src, CollisionPolicy::Rename).unwrap();
        let expected = tmp
            .path()
            .join(ORIGINALS_DIR)
            .join(OsStr::from_bytes(b"caf\xE9-1.jpg"));
        assert_eq!(renamed, ArchiveOutcome::Renamed { to: expected.clone() });
        assert!(expected.is_file());
    }
}
