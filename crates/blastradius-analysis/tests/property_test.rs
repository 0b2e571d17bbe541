//! Property-based tests for the invariants the pipeline must hold for
//! any valid input, not just the hand-crafted unit-test cases.

use proptest::prelude::*;

use blastradius_analysis::diff::parse_diff;
use blastradius_analysis::merger::merge;
use blastradius_analysis::volatility::recency_decay;
use blastradius_core::{CoupledFile, CouplingSource};

fn coupled(path: &str, score: u8, source: CouplingSource) -> CoupledFile {
    CoupledFile {
        path: path.to_string(),
        score,
        source,
        reason: String::new(),
        evidence: None,
        last_commit: None,
    }
}

fn synth_diff(added: u32, removed: u32) -> String {
    let mut raw = format!("@@ -1,{removed} +1,{added} @@\n");
    for i in 0..added {
        raw.push_str(&format!("+added line {i} with enough content to not be empty\n"));
    }
    for i in 0..removed {
        raw.push_str(&format!("-removed line {i} with enough content to not be empty\n"));
    }
    raw
}

proptest! {
    /// Merger output never exceeds fifteen entries and never contains a
    /// duplicate path, regardless of how many engines report the same
    /// file (spec §8 "no duplicate file paths and size ≤ 15").
    #[test]
    fn merger_output_has_no_duplicates_and_is_capped(
        paths in prop::collection::vec("[a-z]{1,6}\\.ts", 0..40),
        scores in prop::collection::vec(0u8..=100, 40),
    ) {
        let git: Vec<CoupledFile> = paths
            .iter()
            .zip(scores.iter())
            .map(|(p, s)| coupled(p, *s, CouplingSource::Git))
            .collect();
        let outputs = [git, vec![], vec![], vec![], vec![], vec![], vec![], vec![], vec![]];
        let merged = merge(outputs);

        prop_assert!(merged.len() <= 15);
        let mut seen = std::collections::HashSet::new();
        for f in &merged {
            prop_assert!(seen.insert(f.path.clone()));
        }
    }

    /// A duplicate path reported by both a higher- and a lower-priority
    /// source keeps the higher-priority record (spec §8 merger stability).
    #[test]
    fn merger_keeps_higher_priority_source_on_duplicate(score_git in 0u8..=100, score_content in 0u8..=100) {
        let outputs = [
            vec![coupled("shared.ts", score_git, CouplingSource::Git)],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![coupled("shared.ts", score_content, CouplingSource::Content)],
        ];
        let merged = merge(outputs);
        let entry = merged.iter().find(|f| f.path == "shared.ts").unwrap();
        prop_assert_eq!(entry.source, CouplingSource::Git);
    }

    /// `netChange` always reflects the untruncated add/remove counts, even
    /// once the surfaced line arrays are capped at ten (spec §8).
    #[test]
    fn diff_net_change_survives_truncation(added in 0u32..50, removed in 0u32..50) {
        let raw = synth_diff(added, removed);
        let summary = parse_diff(&raw);
        prop_assert_eq!(summary.net_change, added as i64 - removed as i64);
        prop_assert!(summary.added_lines.len() <= 10);
        prop_assert!(summary.removed_lines.len() <= 10);
    }

    /// Hunk count recovers exactly the number of synthesised `@@` headers.
    #[test]
    fn diff_hunk_count_matches_synthesised_headers(hunk_count in 1u32..20) {
        let mut raw = String::new();
        for _ in 0..hunk_count {
            raw.push_str("@@ -1,1 +1,1 @@\n+added content here\n");
        }
        let summary = parse_diff(&raw);
        prop_assert_eq!(summary.hunk_count, hunk_count);
    }

    /// Recency decay is monotonic non-increasing in age and bounded to
    /// [0, 1] for any non-negative age (spec §8).
    #[test]
    fn recency_decay_is_bounded_and_monotonic(age in 0.0f64..100_000.0) {
        let decay = recency_decay(age);
        prop_assert!((0.0..=1.0).contains(&decay));
        prop_assert!(recency_decay(age + 1.0) <= decay);
    }
}

#[test]
fn recency_decay_matches_named_fixed_points() {
    assert!((recency_decay(0.0) - 1.0).abs() < 1e-9);
    assert!((recency_decay(30.0) - 0.5).abs() < 1e-9);
}

#[test]
fn binary_marker_yields_unknown_empty_summary() {
    use blastradius_analysis::diff::BINARY_MARKER;
    use blastradius_core::ChangeType;

    let summary = parse_diff(BINARY_MARKER);
    assert_eq!(summary.change_type, ChangeType::Unknown);
    assert!(summary.added_lines.is_empty());
    assert!(summary.removed_lines.is_empty());
}
