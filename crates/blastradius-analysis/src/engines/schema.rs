//! Engine 11 — schema (source `schema`, spec §4.3.7). Gated on the
//! target itself defining a table/model/entity.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::instrument;

use blastradius_core::{CoupledFile, CouplingSource, Evidence};

use crate::context::AnalysisContext;
use crate::engines::finalize;
use crate::extract::{extract_schema_names, has_schema_markers};

const MIN_SCORE: u8 = 45;
const MAX_SCORE: u8 = 80;
const PER_NAME: u8 = 12;

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn run(ctx: &AnalysisContext) -> Vec<CoupledFile> {
    let content = match tokio::fs::read_to_string(&ctx.target_absolute).await {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    if !has_schema_markers(&content) {
        return Vec::new();
    }

    let names = extract_schema_names(&content);
    if names.is_empty() {
        return Vec::new();
    }

    let mut per_file: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    for name in &names {
        let pattern = format!(r#"(\b{0}\b|["']{0}["'])"#, regex::escape(name));
        let raw = ctx
            .git
            .grep_files(&pattern, None, false, false)
            .await
            .unwrap_or_default();
        for path in raw.lines().filter(|l| !l.is_empty()) {
            if path == ctx.target_relative || ctx.ignore.is_ignored(path) {
                continue;
            }
            per_file.entry(path.to_string()).or_default().insert(name.clone());
        }
    }

    let mut out = Vec::new();
    for (path, shared) in per_file {
        let count = shared.len() as u32;
        let score = (MIN_SCORE as u32 + PER_NAME as u32 * count).min(MAX_SCORE as u32) as u8;
        let tag = if path.to_lowercase().contains("migrat") {
            "migration"
        } else if ["repo", "repository", "query", "dao"]
            .iter()
            .any(|kw| path.to_lowercase().contains(kw))
        {
            "query"
        } else {
            "reference"
        };
        out.push(CoupledFile {
            path,
            score,
            source: CouplingSource::Schema,
            reason: format!("Schema {tag} referencing {count} shared name(s)"),
            evidence: Some(Evidence::Note(tag.to_string())),
            last_commit: None,
        });
    }
    finalize(out)
}
