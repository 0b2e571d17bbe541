//! Engine 6 — documentation (source `docs`, spec §4.3.2). Markdown files
//! that mention the target's exported identifiers.

use rustc_hash::FxHashSet;
use tracing::instrument;

use blastradius_core::{CoupledFile, CouplingSource, Evidence};

use crate::context::AnalysisContext;
use crate::engines::finalize;
use crate::extract::extract_exported_identifiers;

const MIN_SCORE: u8 = 40;
const MAX_SCORE: u8 = 70;
const PER_MATCH: u8 = 10;

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn run(ctx: &AnalysisContext) -> Vec<CoupledFile> {
    let content = match tokio::fs::read_to_string(&ctx.target_absolute).await {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let identifiers = extract_exported_identifiers(&content);
    if identifiers.is_empty() {
        return Vec::new();
    }

    let pattern = identifiers
        .iter()
        .map(|id| regex::escape(id))
        .collect::<Vec<_>>()
        .join("|");

    let raw = ctx
        .git
        .grep_files(&pattern, Some("*.md"), false, true)
        .await
        .unwrap_or_default();

    let ids_lower: FxHashSet<String> = identifiers.iter().map(|i| i.to_lowercase()).collect();
    let mut out = Vec::new();
    for path in raw.lines().filter(|l| !l.is_empty()) {
        if ctx.ignore.is_ignored(path) {
            continue;
        }
        let full = ctx.repo_root.join(path);
        let Ok(doc_content) = tokio::fs::read_to_string(&full).await else {
            continue;
        };
        let matches = count_word_boundary_matches(&doc_content, &ids_lower);
        if matches == 0 {
            continue;
        }
        let score = (MIN_SCORE as u32 + PER_MATCH as u32 * matches as u32).min(MAX_SCORE as u32) as u8;
        out.push(CoupledFile {
            path: path.to_string(),
            score,
            source: CouplingSource::Docs,
            reason: format!("Mentions {matches} exported identifier(s) in documentation"),
            evidence: Some(Evidence::Note(format!("{matches} identifier matches"))),
            last_commit: None,
        });
    }
    finalize(out)
}

fn count_word_boundary_matches(haystack: &str, identifiers_lower: &FxHashSet<String>) -> usize {
    haystack
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| identifiers_lower.contains(&word.to_lowercase()))
        .collect::<FxHashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundary_match_ignores_substrings() {
        let ids: FxHashSet<String> = ["foo".to_string()].into_iter().collect();
        assert_eq!(count_word_boundary_matches("the foo function", &ids), 1);
        assert_eq!(count_word_boundary_matches("the foobar function", &ids), 0);
    }

    #[test]
    fn score_is_capped() {
        let score = (40u32 + 10 * 10).min(70) as u8;
        assert_eq!(score, 70);
    }
}
