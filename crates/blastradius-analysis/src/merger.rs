//! Coupling-engine merger (spec §4.3.10). Nine engine outputs become one
//! list, sorted by score descending, capped at fifteen, with duplicate
//! file paths collapsed by first-seen — and first-seen order is the
//! fixed engine priority, not discovery order within this function.

use blastradius_core::{CoupledFile, CouplingSource};

const MERGE_CAP: usize = 15;

/// `engine_outputs` must be supplied in `CouplingSource::PRIORITY` order
/// (git, test, api, schema, env, docs, type, transitive, content); the
/// caller (the top-level pipeline) fans out all nine concurrently and
/// passes results back in that fixed order.
pub fn merge(engine_outputs: [Vec<CoupledFile>; 9]) -> Vec<CoupledFile> {
    debug_assert!(priority_order_matches(&engine_outputs));

    let mut seen = rustc_hash::FxHashSet::default();
    let mut merged = Vec::new();
    for files in engine_outputs {
        for file in files {
            if seen.insert(file.path.clone()) {
                merged.push(file);
            }
        }
    }

    merged.sort_by(|a, b| b.score.cmp(&a.score));
    merged.truncate(MERGE_CAP);
    merged
}

fn priority_order_matches(outputs: &[Vec<CoupledFile>; 9]) -> bool {
    CouplingSource::PRIORITY.iter().enumerate().all(|(idx, expected)| {
        outputs[idx].iter().all(|f| f.source == *expected)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastradius_core::{CoupledFile, CouplingSource};

    fn file(path: &str, score: u8, source: CouplingSource) -> CoupledFile {
        CoupledFile {
            path: path.to_string(),
            score,
            source,
            reason: String::new(),
            evidence: None,
            last_commit: None,
        }
    }

    #[test]
    fn duplicates_are_collapsed_by_first_seen_priority() {
        let git = vec![file("a.ts", 10, CouplingSource::Git)];
        let test = vec![file("a.ts", 90, CouplingSource::Test)]; // would outrank git by score
        let outputs = [
            git,
            test,
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        ];
        let merged = merge(outputs);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, CouplingSource::Git);
    }

    #[test]
    fn result_is_capped_at_fifteen_and_sorted_descending() {
        let git: Vec<CoupledFile> = (0..20)
            .map(|i| file(&format!("f{i}.ts"), i as u8, CouplingSource::Git))
            .collect();
        let outputs = [
            git,
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        ];
        let merged = merge(outputs);
        assert_eq!(merged.len(), 15);
        assert!(merged.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
