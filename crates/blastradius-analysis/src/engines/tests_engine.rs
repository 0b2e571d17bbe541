//! Engine 9 — tests (source `test`, spec §4.3.5). Test files expected to
//! change alongside the target's exports, plus files mocking them.

use tracing::instrument;

use blastradius_core::{CoupledFile, CouplingSource, Evidence};

use crate::context::AnalysisContext;
use crate::engines::finalize;
use crate::extract::{extract_exported_identifiers, is_test_filename, stem, test_naming_patterns};

const NAMING_MATCH_SCORE: u8 = 85;
const MOCK_MATCH_SCORE: u8 = 70;

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn run(ctx: &AnalysisContext) -> Vec<CoupledFile> {
    let target_basename = crate::extract::basename(&ctx.target_relative);
    if is_test_filename(target_basename) {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut seen = rustc_hash::FxHashSet::default();

    let file_stem = stem(&ctx.target_relative);
    for pattern in test_naming_patterns(file_stem) {
        let raw = ctx
            .git
            .grep_files(&pattern, None, true, false)
            .await
            .unwrap_or_default();
        for path in raw.lines().filter(|l| !l.is_empty()) {
            if ctx.ignore.is_ignored(path) || !seen.insert(path.to_string()) {
                continue;
            }
            out.push(CoupledFile {
                path: path.to_string(),
                score: NAMING_MATCH_SCORE,
                source: CouplingSource::Test,
                reason: "Test file expected to change with this file's exports".to_string(),
                evidence: Some(Evidence::Note(format!("matches naming pattern {pattern}"))),
                last_commit: None,
            });
        }
    }

    let content = tokio::fs::read_to_string(&ctx.target_absolute)
        .await
        .unwrap_or_default();
    let identifiers = extract_exported_identifiers(&content);
    for identifier in identifiers.iter().take(5) {
        let pattern = format!(r"(?i)(mock|fake|stub).*{}", regex::escape(identifier));
        let raw = ctx
            .git
            .grep_files(&pattern, None, false, true)
            .await
            .unwrap_or_default();
        for path in raw.lines().filter(|l| !l.is_empty()) {
            if ctx.ignore.is_ignored(path) || !seen.insert(path.to_string()) {
                continue;
            }
            out.push(CoupledFile {
                path: path.to_string(),
                score: MOCK_MATCH_SCORE,
                source: CouplingSource::Test,
                reason: format!("Mocks/stubs `{identifier}`"),
                evidence: Some(Evidence::Note(format!("mock reference to {identifier}"))),
                last_commit: None,
            });
        }
    }

    finalize(out)
}
