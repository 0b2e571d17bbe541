//! Engine 8 — content literals (source `content`, spec §4.3.4). The
//! weakest, purely lexical signal: files sharing distinctive string
//! literals with the target.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::instrument;

use blastradius_core::{CoupledFile, CouplingSource, Evidence};

use crate::context::AnalysisContext;
use crate::engines::finalize;
use crate::extract::{extract_content_literals, LiteralVocabulary};

const MIN_SCORE: u8 = 25;
const MAX_SCORE: u8 = 50;
const PER_STRING: u8 = 10;

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn run(ctx: &AnalysisContext) -> Vec<CoupledFile> {
    let content = match tokio::fs::read_to_string(&ctx.target_absolute).await {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let literals = extract_content_literals(&content);
    if literals.is_empty() {
        return Vec::new();
    }

    let mut per_file: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    let mut vocab_by_literal: FxHashMap<String, LiteralVocabulary> = FxHashMap::default();
    for (literal, vocab) in &literals {
        vocab_by_literal.insert(literal.clone(), *vocab);
        // Fixed-string (literal) mode, not regex, per spec §4.3.4.
        let raw = ctx
            .git
            .grep_files(literal, None, true, false)
            .await
            .unwrap_or_default();
        for path in raw.lines().filter(|l| !l.is_empty()) {
            if path == ctx.target_relative || ctx.ignore.is_ignored(path) {
                continue;
            }
            per_file
                .entry(path.to_string())
                .or_default()
                .insert(literal.clone());
        }
    }

    let mut out = Vec::new();
    for (path, shared) in per_file {
        let count = shared.len() as u32;
        let score = (MIN_SCORE as u32 + PER_STRING as u32 * count).min(MAX_SCORE as u32) as u8;

        let mut vocabs: Vec<LiteralVocabulary> = shared
            .iter()
            .filter_map(|l| vocab_by_literal.get(l).copied())
            .collect();
        vocabs.sort_by_key(|v| v.as_str());
        vocabs.dedup();
        let vocab_tags = vocabs
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        out.push(CoupledFile {
            path,
            score,
            source: CouplingSource::Content,
            reason: format!("Shares {count} string literal(s) ({vocab_tags})"),
            evidence: Some(Evidence::Note(format!(
                "{count} shared literal(s), vocabulary: {vocab_tags}"
            ))),
            last_commit: None,
        });
    }
    finalize(out)
}
