//! Drift detection: coupled files whose on-disk modification time has
//! fallen behind the target file by more than the adaptive drift-days
//! threshold (spec §4.5).

use blastradius_core::{CoupledFile, DriftAlert};
use tracing::instrument;

use crate::git::GitRunner;
use crate::limiter::bounded_map;

const DRIFT_CONCURRENCY: usize = 8;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// For each coupled file, compare its mtime against the target's; emit an
/// alert when the gap exceeds `drift_days`. A coupled file with no
/// retrievable mtime (deleted, renamed, outside the working tree) is
/// silently skipped rather than alerted on (spec §4.5, §9 Open
/// Questions).
#[instrument(skip(git, coupled_files), fields(target = %target_relative, count = coupled_files.len()))]
pub async fn detect(
    git: &GitRunner,
    target_relative: &str,
    coupled_files: &[CoupledFile],
    drift_days: u16,
) -> Vec<DriftAlert> {
    let Some(target_mtime) = git.mtime_millis(target_relative).await else {
        return Vec::new();
    };

    let paths: Vec<String> = coupled_files.iter().map(|c| c.path.clone()).collect();
    let git_c = git.clone();
    let mtimes = bounded_map(paths, DRIFT_CONCURRENCY, move |path| {
        let git = git_c.clone();
        async move {
            let mtime = git.mtime_millis(&path).await;
            (path, mtime)
        }
    })
    .await;

    let drift_days = drift_days as i64;
    mtimes
        .into_iter()
        .filter_map(|(path, mtime)| {
            let mtime = mtime?;
            let skew_millis = target_mtime - mtime;
            if skew_millis <= 0 {
                return None;
            }
            let days_of_skew = (skew_millis as f64 / MILLIS_PER_DAY).floor() as i64;
            if days_of_skew > drift_days {
                Some(DriftAlert { file: path, days_of_skew })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days_of_skew(target_millis: i64, other_millis: i64) -> Option<i64> {
        let skew = target_millis - other_millis;
        if skew <= 0 {
            return None;
        }
        Some((skew as f64 / MILLIS_PER_DAY).floor() as i64)
    }

    #[test]
    fn skew_below_zero_is_not_drift() {
        assert_eq!(days_of_skew(1_000, 2_000), None);
    }

    #[test]
    fn skew_above_zero_converts_to_whole_days() {
        let ten_days_millis = (10.0 * MILLIS_PER_DAY) as i64;
        assert_eq!(days_of_skew(ten_days_millis, 0), Some(10));
    }
}
