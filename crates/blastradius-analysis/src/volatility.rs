//! Commit-message severity with recency decay plus authorship breakdown
//! (spec §4.4).

use std::collections::BTreeMap;

use blastradius_core::{AuthorBreakdown, Configuration, RecencyStats, VolatilityResult};
use tracing::instrument;

use crate::commitlog::{age_in_days, parse_log_with_email};
use crate::git::GitRunner;

const MAX_COMMITS: u32 = 20;
const DECAY_HALF_LIFE_DAYS: f64 = 30.0;
/// Denominator intentionally uses `MAX_COMMITS * 3` even when fewer
/// commits exist (spec §9 Open Questions): small-history files score
/// lower than might intuitively be expected, down-weighting panic for
/// files with a short history. Preserved as specified.
const PANIC_DENOMINATOR: f64 = MAX_COMMITS as f64 * 3.0;
const BUS_FACTOR_THRESHOLD_PERCENT: f64 = 70.0;

/// Base panic-keyword table, overlaid by any configuration overrides
/// (spec §4.4).
pub fn base_panic_keywords() -> BTreeMap<&'static str, f64> {
    [
        ("critical", 3.0),
        ("security", 3.0),
        ("cve", 3.0),
        ("exploit", 3.0),
        ("crash", 3.0),
        ("data loss", 3.0),
        ("corruption", 3.0),
        ("breach", 3.0),
        ("revert", 2.0),
        ("hotfix", 2.0),
        ("urgent", 2.0),
        ("breaking", 2.0),
        ("emergency", 2.0),
        ("rollback", 2.0),
        ("regression", 2.0),
        ("fix", 1.0),
        ("bug", 1.0),
        ("patch", 1.0),
        ("oops", 1.0),
        ("typo", 1.0),
        ("issue", 1.0),
        ("error", 1.0),
        ("wrong", 1.0),
        ("mistake", 1.0),
        ("broken", 1.0),
        ("refactor", 0.5),
        ("cleanup", 0.5),
        ("lint", 0.5),
        ("format", 0.5),
    ]
    .into_iter()
    .collect()
}

/// `critical` appears in both the severity-3 and severity-2 tiers of the
/// base table in spec §4.4's literal listing; the later `critical=2` entry
/// wins as an overlay would, so the effective base weight for "critical"
/// is 2.0.
fn effective_keywords(config: Option<&Configuration>) -> BTreeMap<String, f64> {
    let mut table: BTreeMap<String, f64> = base_panic_keywords()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    table.insert("critical".to_string(), 2.0);
    if let Some(config) = config {
        for (keyword, weight) in &config.panic_keywords {
            table.insert(keyword.to_lowercase(), *weight);
        }
    }
    table
}

fn keyword_matches(subject_lower: &str, keyword: &str) -> bool {
    if keyword.contains(' ') {
        subject_lower.contains(keyword)
    } else {
        subject_lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    }
}

#[instrument(skip(git, config), fields(file = %file))]
pub async fn analyse(
    git: &GitRunner,
    file: &str,
    config: Option<&Configuration>,
) -> VolatilityResult {
    let raw = match git.log_for_file(file, MAX_COMMITS).await {
        Ok(s) => s,
        Err(_) => return VolatilityResult::empty(),
    };
    let commits = parse_log_with_email(&raw);
    if commits.is_empty() {
        return VolatilityResult::empty();
    }

    let keywords = effective_keywords(config);
    let now = chrono::Local::now().with_timezone(commits[0].date.offset());

    let mut weighted_panic_score = 0.0;
    let mut decay_sum = 0.0;
    let mut excerpts: Vec<(f64, String)> = Vec::new();
    let mut author_stats: BTreeMap<(String, String), AuthorAccumulator> = BTreeMap::new();

    for commit in &commits {
        let subject_lower = commit.subject.to_lowercase();
        let weight = keywords
            .iter()
            .filter(|(kw, _)| keyword_matches(&subject_lower, kw))
            .map(|(_, w)| *w)
            .fold(0.0_f64, f64::max);

        let age_days = age_in_days(commit.date, now);
        let decay = 0.5_f64.powf(age_days as f64 / DECAY_HALF_LIFE_DAYS);
        weighted_panic_score += weight * decay;
        decay_sum += decay;

        if weight >= 2.0 {
            let mut excerpt = commit.subject.clone();
            excerpt.truncate(60);
            excerpts.push((weight, excerpt));
        }

        let key = (
            commit.author_name.clone(),
            commit.author_email.clone().unwrap_or_default(),
        );
        let entry = author_stats.entry(key).or_insert_with(|| AuthorAccumulator {
            count: 0,
            first: commit.date,
            last: commit.date,
        });
        entry.count += 1;
        if commit.date < entry.first {
            entry.first = commit.date;
        }
        if commit.date > entry.last {
            entry.last = commit.date;
        }
    }

    excerpts.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    let high_severity_excerpts: Vec<String> =
        excerpts.into_iter().take(3).map(|(_, s)| s).collect();

    let panic_score = ((100.0 * weighted_panic_score / PANIC_DENOMINATOR).round() as i64)
        .clamp(0, 100) as u8;

    let total = commits.len() as u32;
    let mut breakdown: Vec<AuthorBreakdown> = author_stats
        .into_iter()
        .map(|((name, email), acc)| AuthorBreakdown {
            name,
            email,
            commit_count: acc.count,
            percentage: acc.count as f64 / total as f64 * 100.0,
            first_commit: acc.first.to_rfc3339(),
            last_commit: acc.last.to_rfc3339(),
        })
        .collect();
    breakdown.sort_by(|a, b| b.commit_count.cmp(&a.commit_count));

    let top_author = breakdown.first().cloned();
    let _ = BUS_FACTOR_THRESHOLD_PERCENT; // documented threshold, surfaced via top_author.percentage

    let recency = Some(RecencyStats {
        oldest_commit_age_days: commits
            .iter()
            .map(|c| age_in_days(c.date, now))
            .max()
            .unwrap_or(0),
        newest_commit_age_days: commits
            .iter()
            .map(|c| age_in_days(c.date, now))
            .min()
            .unwrap_or(0),
        mean_decay_factor: decay_sum / commits.len() as f64,
    });

    VolatilityResult {
        commit_count: total,
        panic_score,
        high_severity_excerpts,
        most_recent_commit: commits.first().map(|c| c.date.to_rfc3339()),
        author_count: breakdown.len() as u32,
        author_breakdown: breakdown,
        top_author,
        recency,
    }
}

struct AuthorAccumulator {
    count: u32,
    first: chrono::DateTime<chrono::FixedOffset>,
    last: chrono::DateTime<chrono::FixedOffset>,
}

/// `0.5^(age/30)`: `decay(now) = 1`, `decay(now - 30d) = 0.5` (spec §8).
pub fn recency_decay(age_days: f64) -> f64 {
    0.5_f64.powf(age_days / DECAY_HALF_LIFE_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_is_one_at_zero_age_and_half_at_thirty_days() {
        assert!((recency_decay(0.0) - 1.0).abs() < 1e-9);
        assert!((recency_decay(30.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn decay_is_monotonic_non_increasing() {
        let mut prev = recency_decay(0.0);
        for age in (1..200).map(|d| d as f64) {
            let cur = recency_decay(age);
            assert!(cur <= prev);
            prev = cur;
        }
    }

    #[test]
    fn keyword_matches_whole_word_only() {
        assert!(keyword_matches("fix the race condition", "fix"));
        assert!(!keyword_matches("prefix changes", "fix"));
        assert!(keyword_matches("massive data loss incident", "data loss"));
    }

    #[test]
    fn config_override_replaces_base_weight() {
        let mut config = Configuration::default();
        config.panic_keywords.insert("fix".to_string(), 3.0);
        let table = effective_keywords(Some(&config));
        assert_eq!(table.get("fix"), Some(&3.0));
    }
}

#[cfg(test)]
mod proptests {
    use super::recency_decay;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decay_never_exceeds_one_and_never_negative(age in 0.0f64..10_000.0) {
            let d = recency_decay(age);
            prop_assert!((0.0..=1.0).contains(&d));
        }

        #[test]
        fn decay_is_monotonic_for_any_ordered_pair(a in 0.0f64..5000.0, b in 0.0f64..5000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(recency_decay(lo) >= recency_decay(hi));
        }
    }
}
