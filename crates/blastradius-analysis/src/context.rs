//! Analysis context factory, project-metrics probe, and adaptive
//! thresholds (spec §4.2).
//!
//! Grounded on `drift-core::config::ScanConfig`'s "every field optional,
//! `effective_*` supplies the default" idiom, generalised here into a
//! two-stage resolve: a project-metrics probe first estimates velocity,
//! then adaptive thresholds derive from that estimate, then any explicit
//! configuration field overrides the computed value (spec §4.2).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use blastradius_core::{AnalysisError, Configuration, Thresholds};
use tracing::{instrument, warn};

use crate::cache::{cache_key, Cache};
use crate::git::GitRunner;
use crate::ignore_filter::{ignore_filter_for, IgnoreFilter};
use crate::limiter::bounded_map;

const CONFIG_FILE_NAME: &str = ".blastradius.json";
const METRICS_SAMPLE_SIZE: usize = 10;
const METRICS_CONCURRENCY: usize = 5;
const METRICS_WINDOW_COMMITS: u32 = 500;

/// Sampled repository velocity (spec §3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectMetrics {
    pub total_commits: u32,
    pub commits_per_week: f64,
    pub avg_files_per_commit: f64,
}

impl ProjectMetrics {
    /// "a defensible default" returned when the probe itself fails (spec
    /// §4.2).
    pub fn defensible_default() -> Self {
        Self {
            total_commits: 0,
            commits_per_week: 10.0,
            avg_files_per_commit: 3.0,
        }
    }
}

/// The one-shot, per-request record shared by every engine (spec §3
/// "AnalysisContext"). Every engine receives the same context; none
/// re-resolves the repository root.
#[derive(Clone)]
pub struct AnalysisContext {
    /// Absolute target path.
    pub target_absolute: PathBuf,
    /// Target path relative to `repo_root`, forward-slash separated.
    pub target_relative: String,
    pub repo_root: PathBuf,
    pub git: GitRunner,
    pub config: Option<Configuration>,
    pub ignore: Arc<IgnoreFilter>,
    pub metrics: ProjectMetrics,
    pub thresholds: Thresholds,
}

impl AnalysisContext {
    /// Resolve the repository root first (everything else depends on it),
    /// then load configuration and fetch project metrics in parallel,
    /// and build the ignore filter (which depends only on root and
    /// configuration) — spec §4.2.
    #[instrument(skip_all, fields(target = %target_absolute.display()))]
    pub async fn build(target_absolute: &Path) -> Result<Self, AnalysisError> {
        if !target_absolute.is_absolute() {
            return Err(AnalysisError::InputError(
                "target path must be absolute; retry with an absolute path".to_string(),
            ));
        }

        if !target_absolute.exists() {
            return Err(AnalysisError::InputError(format!(
                "target path does not exist: {}; retry with a path to an existing file",
                target_absolute.display()
            )));
        }

        let start_dir = target_absolute
            .parent()
            .unwrap_or(target_absolute)
            .to_path_buf();
        let repo_root = GitRunner::resolve_root(&start_dir)
            .await
            .map_err(|_| AnalysisError::NotARepository)?;

        let git = GitRunner::new(repo_root.clone());

        let target_relative = pathdiff(&repo_root, target_absolute);

        let (config, metrics) =
            tokio::join!(load_config(&repo_root), probe_metrics(&git));

        let ignore = ignore_filter_for(&repo_root, config.as_ref());
        let thresholds = adaptive_thresholds(&metrics, config.as_ref());

        Ok(Self {
            target_absolute: target_absolute.to_path_buf(),
            target_relative,
            repo_root,
            git,
            config,
            ignore,
            metrics,
            thresholds,
        })
    }

    pub fn config_fingerprint(&self) -> String {
        self.config
            .as_ref()
            .map(Configuration::fingerprint)
            .unwrap_or_else(|| "none".to_string())
    }
}

fn pathdiff(root: &Path, target: &Path) -> String {
    target
        .strip_prefix(root)
        .unwrap_or(target)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Read and validate `.blastradius.json` at the repository root. A
/// malformed document — or one with an unknown top-level field — is
/// treated as absent, never aborting the request (spec §3, §7). The
/// loader caches `None` under the configuration key too, so a broken
/// config file is not re-parsed on every request (spec §7).
async fn load_config(repo_root: &Path) -> Option<Configuration> {
    let key = cache_key(&["config", &repo_root.to_string_lossy()]);
    if let Some(cached) = Cache::global().get::<Option<Configuration>>(&key) {
        return cached;
    }

    let path = repo_root.join(CONFIG_FILE_NAME);
    let parsed = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => match serde_json::from_str::<Configuration>(&raw) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(error = %e, "configuration file is malformed, treating as absent");
                None
            }
        },
        Err(_) => None,
    };

    Cache::global().insert(key, &parsed);
    parsed
}

/// Sample recent commits to estimate velocity (spec §4.2).
async fn probe_metrics(git: &GitRunner) -> ProjectMetrics {
    let log = match git
        .recent_commit_hashes("30.days", METRICS_WINDOW_COMMITS)
        .await
    {
        Ok(s) => s,
        Err(_) => return ProjectMetrics::defensible_default(),
    };

    let hashes: Vec<String> = log
        .lines()
        .filter(|h| !h.is_empty())
        .take(METRICS_WINDOW_COMMITS as usize)
        .map(str::to_string)
        .collect();

    let total_commits = hashes.len() as u32;
    if total_commits == 0 {
        return ProjectMetrics::defensible_default();
    }

    let sample: Vec<String> = hashes.iter().take(METRICS_SAMPLE_SIZE).cloned().collect();
    let git_c = git.clone();
    let file_counts = bounded_map(sample, METRICS_CONCURRENCY, move |hash| {
        let git = git_c.clone();
        async move {
            git.show_name_only(&hash)
                .await
                .map(|s| s.lines().filter(|l| !l.is_empty()).count())
                .unwrap_or(0)
        }
    })
    .await;

    let avg_files_per_commit = if file_counts.is_empty() {
        3.0
    } else {
        file_counts.iter().sum::<usize>() as f64 / file_counts.len() as f64
    };

    // Scaled from the thirty-day count, bounded at 500 (spec §4.2, §9 Open
    // Questions — preserved intentionally even though it undercounts
    // very-active repositories).
    let commits_per_week = (total_commits as f64 / 30.0) * 7.0;

    ProjectMetrics {
        total_commits,
        commits_per_week,
        avg_files_per_commit,
    }
}

/// Derive coupling percentage, drift days, and analysis window from
/// project metrics, then let any explicit configuration threshold
/// override the computed value field-wise (spec §4.2).
fn adaptive_thresholds(metrics: &ProjectMetrics, config: Option<&Configuration>) -> Thresholds {
    let (mut coupling, mut drift, mut window) = (15u8, 7u16, 50u16);

    if metrics.commits_per_week < 5.0 {
        coupling = 20;
        drift = 14;
        window = 30;
    } else if metrics.commits_per_week > 50.0 {
        coupling = 10;
        drift = 3;
        window = 100;
    }

    if metrics.avg_files_per_commit > 5.0 {
        coupling = coupling.saturating_add(5);
    }

    let mut max_files_per_commit: u16 = 15;

    if let Some(config) = config {
        let t = &config.thresholds;
        if let Some(v) = t.coupling_percent {
            coupling = v;
        }
        if let Some(v) = t.drift_days {
            drift = v;
        }
        if let Some(v) = t.analysis_window {
            window = v;
        }
        if let Some(v) = t.max_files_per_commit {
            max_files_per_commit = v;
        }
    }

    Thresholds {
        coupling_percent: coupling,
        drift_days: drift,
        analysis_window: window,
        max_files_per_commit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_history_widens_drift_and_coupling() {
        let metrics = ProjectMetrics {
            total_commits: 10,
            commits_per_week: 2.0,
            avg_files_per_commit: 1.0,
        };
        let t = adaptive_thresholds(&metrics, None);
        assert_eq!(t.coupling_percent, 20);
        assert_eq!(t.drift_days, 14);
        assert_eq!(t.analysis_window, 30);
    }

    #[test]
    fn very_active_repo_tightens_window() {
        let metrics = ProjectMetrics {
            total_commits: 500,
            commits_per_week: 80.0,
            avg_files_per_commit: 1.0,
        };
        let t = adaptive_thresholds(&metrics, None);
        assert_eq!(t.coupling_percent, 10);
        assert_eq!(t.drift_days, 3);
        assert_eq!(t.analysis_window, 100);
    }

    #[test]
    fn large_atomic_commits_raise_coupling_threshold() {
        let metrics = ProjectMetrics {
            total_commits: 200,
            commits_per_week: 20.0,
            avg_files_per_commit: 8.0,
        };
        let t = adaptive_thresholds(&metrics, None);
        assert_eq!(t.coupling_percent, 20); // 15 + 5
    }

    #[test]
    fn explicit_config_overrides_computed_thresholds() {
        let metrics = ProjectMetrics {
            total_commits: 200,
            commits_per_week: 20.0,
            avg_files_per_commit: 1.0,
        };
        let mut config = Configuration::default();
        config.thresholds.coupling_percent = Some(99);
        let t = adaptive_thresholds(&metrics, Some(&config));
        assert_eq!(t.coupling_percent, 99);
        assert_eq!(t.drift_days, 7); // untouched, default branch
    }
}
