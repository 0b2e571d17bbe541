//! Engine 7 — shared types (source `type`, spec §4.3.3). Files that
//! reference the target's exported type/interface/enum declarations.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::instrument;

use blastradius_core::{CoupledFile, CouplingSource, Evidence};

use crate::context::AnalysisContext;
use crate::engines::finalize;
use crate::extract::extract_type_names;

const SOURCE_GLOB: &str = "*.{ts,tsx,js,jsx}";
const MIN_SCORE: u8 = 35;
const MAX_SCORE: u8 = 65;
const PER_TYPE: u8 = 15;

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn run(ctx: &AnalysisContext) -> Vec<CoupledFile> {
    let content = match tokio::fs::read_to_string(&ctx.target_absolute).await {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let type_names = extract_type_names(&content);
    if type_names.is_empty() {
        return Vec::new();
    }

    let mut per_file: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    for type_name in &type_names {
        let pattern = format!(
            r"(import\s*\{{[^}}]*\b{0}\b|:\s*{0}\b|<\s*{0}\s*>|\b(?:extends|implements)\s+{0}\b)",
            regex::escape(type_name)
        );
        let raw = ctx
            .git
            .grep_files(&pattern, Some(SOURCE_GLOB), false, false)
            .await
            .unwrap_or_default();
        for path in raw.lines().filter(|l| !l.is_empty()) {
            if path == ctx.target_relative || ctx.ignore.is_ignored(path) {
                continue;
            }
            per_file
                .entry(path.to_string())
                .or_default()
                .insert(type_name.clone());
        }
    }

    let mut out = Vec::new();
    for (path, shared) in per_file {
        let count = shared.len() as u32;
        let score = (MIN_SCORE as u32 + PER_TYPE as u32 * count).min(MAX_SCORE as u32) as u8;
        let mut names: Vec<String> = shared.into_iter().collect();
        names.sort();
        out.push(CoupledFile {
            path,
            score,
            source: CouplingSource::Type,
            reason: format!("Shares {count} type(s): {}", names.join(", ")),
            evidence: Some(Evidence::Note(names.join(", "))),
            last_commit: None,
        });
    }
    finalize(out)
}
