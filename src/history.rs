//! Thin wrapper around `git filter-repo`: rewrites the repository in the
//! current directory with a single commit callback loaded from a file. Every
//! other callback stays unset.

use crate::errors::{BootError, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

pub const COMMIT_CALLBACK_FILE: &str = "commit_callback.py";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRepo {
    /// Repository to rewrite; the tool runs with this as its working directory
    pub repo: PathBuf,
    /// Python file holding the commit callback body
    pub commit_callback: PathBuf,
}

impl Default for FilterRepo {
    fn default() -> Self {
        FilterRepo {
            repo: PathBuf::from("."),
            commit_callback: PathBuf::from(COMMIT_CALLBACK_FILE),
        }
    }
}

impl FilterRepo {
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "filter-repo".into(),
            "--commit-callback".into(),
            self.commit_callback.clone().into_os_string(),
        ]
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new("git");
        command.args(self.args()).current_dir(&self.repo);
        command
    }

    /// Runs the tool with inherited stdio and returns its exit status as-is.
    pub fn run(&self) -> Result<ExitStatus> {
        tracing::info!(
            "running git filter-repo in {} with commit callback {}",
            self.repo.display(),
            self.commit_callback.display()
        );
        self.command().status().map_err(|source| BootError::Spawn {
            program: "git filter-repo".to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_commit_callback_is_passed() {
        let args: Vec<String> = FilterRepo::default()
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["filter-repo", "--commit-callback", "commit_callback.py"]);
    }

    #[test]
    fn targets_the_current_directory() {
        let filter = FilterRepo::default();
        let command = filter.command();
        assert_eq!(command.get_program(), "git");
        assert_eq!(command.get_current_dir(), Some(std::path::Path::new(".")));
    }

    #[test]
    fn missing_repo_dir_is_a_spawn_error() {
        let filter = FilterRepo {
            repo: PathBuf::from("/definitely/not/a/repo"),
            ..FilterRepo::default()
        };
        assert!(matches!(filter.run(), Err(BootError::Spawn { .. })));
    }
}
