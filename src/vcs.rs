//! Repository state for `$commitId` and `$git`.

use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::diagnostics::TransformError;
use crate::err_msg;

/// Metadata of the checked out commit. Field names match the `GitMetadata` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GitMetadata {
    pub branch: String,
    /// Abbreviated hash.
    pub commit: String,
    pub commit_hash: String,
    pub author: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "ISODate")]
    pub iso_date: String,
}

/// Supplies repository metadata at expansion time.
pub trait VcsProvider {
    fn metadata(&self) -> Result<GitMetadata, TransformError>;

    fn commit_id(&self) -> Result<String, TransformError> {
        Ok(self.metadata()?.commit_hash)
    }
}

/// Queries the `git` executable once per provider and caches the answer.
#[derive(Debug)]
pub struct GitCli {
    dir: PathBuf,
    cache: OnceCell<GitMetadata>,
}

impl GitCli {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            cache: OnceCell::new(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<String, TransformError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .output()
            .map_err(|e| err_msg!(Vcs, "failed to run git: {}", e).with_cause(e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(err_msg!(
                Vcs,
                "`git {}` failed in {}: {}",
                args.join(" "),
                self.dir.display(),
                stderr.trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn query(&self) -> Result<GitMetadata, TransformError> {
        let timestamp = self.git(&["log", "-1", "--format=%ct"])?;
        let timestamp = timestamp.parse::<i64>().map_err(|e| {
            err_msg!(Vcs, "unexpected commit timestamp `{}`", timestamp).with_cause(e)
        })?;
        Ok(GitMetadata {
            branch: self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?,
            commit: self.git(&["rev-parse", "--short", "HEAD"])?,
            commit_hash: self.git(&["rev-parse", "HEAD"])?,
            author: self.git(&["log", "-1", "--format=%an"])?,
            timestamp,
            iso_date: self.git(&["log", "-1", "--format=%cI"])?,
        })
    }
}

impl VcsProvider for GitCli {
    fn metadata(&self) -> Result<GitMetadata, TransformError> {
        self.cache.get_or_try_init(|| self.query()).cloned()
    }
}

/// Fixed metadata, for hosts that already know it and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticVcs {
    metadata: GitMetadata,
}

impl StaticVcs {
    pub fn new(metadata: GitMetadata) -> Self {
        Self { metadata }
    }
}

impl VcsProvider for StaticVcs {
    fn metadata(&self) -> Result<GitMetadata, TransformError> {
        Ok(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> GitMetadata {
        GitMetadata {
            branch: "main".to_string(),
            commit: "abc1234".to_string(),
            commit_hash: "abc1234def5678".to_string(),
            author: "Dev".to_string(),
            timestamp: 1_700_000_000,
            iso_date: "2023-11-14T22:13:20+00:00".to_string(),
        }
    }

    #[test]
    fn test_static_commit_id() {
        let vcs = StaticVcs::new(metadata());
        assert_eq!(vcs.commit_id().expect("commit"), "abc1234def5678");
    }

    #[test]
    fn test_metadata_serializes_with_declared_names() {
        let json = serde_json::to_value(metadata()).expect("json");
        for key in ["Branch", "Commit", "CommitHash", "Author", "Timestamp", "ISODate"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_git_outside_repository_is_vcs_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vcs = GitCli::new(dir.path());
        // Either git is missing or the directory is not a repository.
        let err = vcs.metadata().unwrap_err();
        assert_eq!(err.kind(), crate::diagnostics::ErrorKind::Vcs);
    }
}
