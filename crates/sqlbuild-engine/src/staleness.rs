//! Staleness detection
//!
//! A unit needs rebuilding when its artifact is missing or not strictly newer
//! than its SQL source. The check looks at one unit only: an upstream unit
//! being rebuilt does not make its dependents stale.

use std::io::ErrorKind;
use std::path::Path;

/// Whether an artifact reflects its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// No artifact on disk
    Missing,

    /// Artifact modified at or before the source
    OutOfDate,

    /// Artifact strictly newer than the source
    UpToDate,
}

impl Staleness {
    pub fn needs_rebuild(self) -> bool {
        !matches!(self, Staleness::UpToDate)
    }
}

impl std::fmt::Display for Staleness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::OutOfDate => write!(f, "out of date"),
            Self::UpToDate => write!(f, "up to date"),
        }
    }
}

/// Compare modification times of `source` and `artifact`
///
/// Errors other than a missing artifact (e.g. unreadable source) propagate.
pub fn check_staleness(source: &Path, artifact: &Path) -> std::io::Result<Staleness> {
    let artifact_modified = match std::fs::metadata(artifact) {
        Ok(metadata) => metadata.modified()?,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Staleness::Missing),
        Err(e) => return Err(e),
    };

    let source_modified = std::fs::metadata(source)?.modified()?;

    if artifact_modified > source_modified {
        Ok(Staleness::UpToDate)
    } else {
        Ok(Staleness::OutOfDate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    fn touch(path: &Path, modified: SystemTime) {
        let file = File::options().create(true).append(true).open(path).unwrap();
        file.set_modified(modified).unwrap();
    }

    #[test]
    fn missing_artifact_needs_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.sql");
        touch(&source, SystemTime::now());

        let staleness = check_staleness(&source, &dir.path().join("a")).unwrap();
        assert_eq!(staleness, Staleness::Missing);
        assert!(staleness.needs_rebuild());
    }

    #[test]
    fn newer_artifact_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let (source, artifact) = (dir.path().join("a.sql"), dir.path().join("a"));
        let base = SystemTime::now() - Duration::from_secs(60);
        touch(&source, base);
        touch(&artifact, base + Duration::from_secs(1));

        let staleness = check_staleness(&source, &artifact).unwrap();
        assert_eq!(staleness, Staleness::UpToDate);
        assert!(!staleness.needs_rebuild());
    }

    #[test]
    fn equal_timestamps_are_stale() {
        let dir = tempfile::tempdir().unwrap();
        let (source, artifact) = (dir.path().join("a.sql"), dir.path().join("a"));
        let at = SystemTime::now() - Duration::from_secs(60);
        touch(&source, at);
        touch(&artifact, at);

        assert_eq!(check_staleness(&source, &artifact).unwrap(), Staleness::OutOfDate);
    }

    #[test]
    fn edited_source_makes_artifact_stale() {
        let dir = tempfile::tempdir().unwrap();
        let (source, artifact) = (dir.path().join("a.sql"), dir.path().join("a"));
        let base = SystemTime::now() - Duration::from_secs(60);
        touch(&artifact, base);
        touch(&source, base + Duration::from_secs(30));

        assert_eq!(check_staleness(&source, &artifact).unwrap(), Staleness::OutOfDate);
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("a");
        touch(&artifact, SystemTime::now());

        assert!(check_staleness(&dir.path().join("a.sql"), &artifact).is_err());
    }
}
