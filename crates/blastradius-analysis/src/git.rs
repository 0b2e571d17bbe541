//! Thin async wrapper around the `git` CLI subprocess (spec §4.2, §6).
//!
//! Grounded on `other_examples/84cd86d0_stackmuncher-stm_app__git.rs`'s
//! `execute_git_command`, which shells out via `tokio::process::Command`
//! and treats a non-zero exit as an absorbable error rather than a panic.
//! The teacher crate (`drift-analysis`) instead talks to the repository
//! through `git2` (`src/advanced/decisions/git_analysis.rs`), a bound
//! library. Spec §6 "Version-control commands consumed" names literal CLI
//! flags (`--grep`, `-S`, `-L`, `-E`, `-F`, `-i`, a no-optional-locks hint)
//! that only make sense against the `git` binary itself, so this module
//! shells out instead of linking `git2` — see DESIGN.md for the explicit
//! dependency-swap rationale.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct GitError(pub String);

impl std::fmt::Display for GitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A handle to the version-control subprocess, bound to a resolved
/// repository root (spec §3 "AnalysisContext"). Cheap to clone; every
/// engine receives the same context and therefore the same root, never
/// re-resolving it.
#[derive(Clone, Debug)]
pub struct GitRunner {
    root: PathBuf,
}

impl GitRunner {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the repository top-level directory for an arbitrary path
    /// inside it. Failure here is fatal for the whole request (spec
    /// §4.2).
    pub async fn resolve_root(start_dir: &Path) -> Result<PathBuf, GitError> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(start_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GitError(format!("failed to spawn git: {e}")))?;

        if !output.status.success() {
            return Err(GitError("not a git repository".to_string()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(PathBuf::from(stdout.trim()))
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        debug!(args = ?args, "git");
        let output = Command::new("git")
            .arg("--no-optional-locks")
            .args(args)
            .current_dir(&self.root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GitError(format!("failed to spawn git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(stderr = %stderr, args = ?args, "git command failed");
            return Err(GitError(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `git log` for a single file, most recent first, formatted as
    /// `%H|%ai|%an|%ae|%s`.
    pub async fn log_for_file(
        &self,
        file: &str,
        max_count: u32,
    ) -> Result<String, GitError> {
        self.run(&[
            "log",
            &format!("--max-count={max_count}"),
            "--pretty=format:%H|%ai|%an|%ae|%s",
            "--",
            file,
        ])
        .await
    }

    /// Commit hashes over the whole repository within a recency window,
    /// used by the project-metrics probe (spec §4.2).
    pub async fn recent_commit_hashes(
        &self,
        since: &str,
        max_count: u32,
    ) -> Result<String, GitError> {
        self.run(&[
            "log",
            &format!("--since={since}"),
            &format!("--max-count={max_count}"),
            "--pretty=format:%H",
        ])
        .await
    }

    /// Changed-file paths for a single commit (`--name-only`).
    pub async fn show_name_only(&self, commit: &str) -> Result<String, GitError> {
        self.run(&["show", "--name-only", "--pretty=format:", commit])
            .await
    }

    /// A commit's diff, optionally restricted to a single path, truncated
    /// by the caller (the cache stores the truncated copy, spec §4.3.1).
    pub async fn show_diff(&self, commit: &str, path: Option<&str>) -> Result<String, GitError> {
        match path {
            Some(p) => self.run(&["show", commit, "--", p]).await,
            None => self.run(&["show", commit]).await,
        }
    }

    /// List files matching a pattern (`-l`); `fixed` selects `-F` (literal)
    /// over `-E` (extended regex).
    pub async fn grep_files(
        &self,
        pattern: &str,
        glob: Option<&str>,
        fixed: bool,
        case_insensitive: bool,
    ) -> Result<String, GitError> {
        let mut args: Vec<&str> = vec!["grep", "-l"];
        if fixed {
            args.push("-F");
        } else {
            args.push("-E");
        }
        if case_insensitive {
            args.push("-i");
        }
        args.push(pattern);
        if let Some(g) = glob {
            args.push("--");
            args.push(g);
        }
        // `git grep` exits 1 when nothing matches; that is not a failure.
        match self.run(&args).await {
            Ok(s) => Ok(s),
            Err(_) => Ok(String::new()),
        }
    }

    /// Commit log filtered by message (`--grep -i`), formatted as
    /// `%H|%ai|%an|%s`.
    pub async fn log_by_message(
        &self,
        query: &str,
        filters: &HistoryFilters<'_>,
    ) -> Result<String, GitError> {
        let mut args: Vec<String> = vec![
            "log".into(),
            "--grep".into(),
            query.into(),
            "-i".into(),
            "--pretty=format:%H|%ai|%an|%s".into(),
        ];
        filters.push_into(&mut args);
        let owned: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&owned).await
    }

    /// Pickaxe search: commits whose diff changes the occurrence count of
    /// `query` (`-S`).
    pub async fn log_by_pickaxe(
        &self,
        query: &str,
        filters: &HistoryFilters<'_>,
    ) -> Result<String, GitError> {
        let mut args: Vec<String> = vec![
            "log".into(),
            format!("-S{query}"),
            "--pretty=format:%H|%ai|%an|%s".into(),
        ];
        filters.push_into(&mut args);
        let owned: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&owned).await
    }

    /// Commits touching a line range in a file (`-L start,end:path`).
    pub async fn log_line_range(
        &self,
        path: &str,
        start: u32,
        end: u32,
    ) -> Result<String, GitError> {
        self.run(&[
            "log",
            &format!("-L{start},{end}:{path}"),
            "--pretty=format:%H|%ai|%an|%s",
        ])
        .await
    }

    /// `stat`-equivalent for on-disk mtime, used by the drift engine
    /// (spec §4.5). Not a git operation, but colocated here since the
    /// analysis context owns the same filesystem root.
    pub async fn mtime_millis(&self, relative_path: &str) -> Option<i64> {
        let full = self.root.join(relative_path);
        let meta = tokio::fs::metadata(&full).await.ok()?;
        let modified = meta.modified().ok()?;
        let millis = modified
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?
            .as_millis();
        i64::try_from(millis).ok()
    }
}

/// `--since`/`--until`/`--author` filters shared by every history-search
/// mode (spec §4.8).
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoryFilters<'a> {
    pub since: Option<&'a str>,
    pub until: Option<&'a str>,
    pub author: Option<&'a str>,
}

impl<'a> HistoryFilters<'a> {
    fn push_into(&self, args: &mut Vec<String>) {
        if let Some(since) = self.since {
            args.push(format!("--since={since}"));
        }
        if let Some(until) = self.until {
            args.push(format!("--until={until}"));
        }
        if let Some(author) = self.author {
            args.push(format!("--author={author}"));
        }
    }
}
