//! Engine 12 — API endpoints (source `api`, spec §4.3.8). Gated on the
//! target itself defining routes; suppresses pairing two route-definition
//! files against each other.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::instrument;

use blastradius_core::{CoupledFile, CouplingSource, Evidence};

use crate::context::AnalysisContext;
use crate::engines::finalize;
use crate::extract::{defines_routes, extract_endpoints};

const MIN_SCORE: u8 = 50;
const MAX_SCORE: u8 = 85;
const PER_ENDPOINT: u8 = 12;

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn run(ctx: &AnalysisContext) -> Vec<CoupledFile> {
    let content = match tokio::fs::read_to_string(&ctx.target_absolute).await {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    if !defines_routes(&content) {
        return Vec::new();
    }

    let endpoints = extract_endpoints(&content);
    if endpoints.is_empty() {
        return Vec::new();
    }

    let mut per_file: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    for endpoint in &endpoints {
        let raw = ctx
            .git
            .grep_files(endpoint, None, true, false)
            .await
            .unwrap_or_default();
        for path in raw.lines().filter(|l| !l.is_empty()) {
            if path == ctx.target_relative || ctx.ignore.is_ignored(path) {
                continue;
            }
            per_file
                .entry(path.to_string())
                .or_default()
                .insert(endpoint.clone());
        }
    }

    let mut out = Vec::new();
    for (path, shared) in per_file {
        let full = ctx.repo_root.join(&path);
        if let Ok(candidate_content) = tokio::fs::read_to_string(&full).await {
            if defines_routes(&candidate_content) {
                continue;
            }
        }
        let count = shared.len() as u32;
        let score = (MIN_SCORE as u32 + PER_ENDPOINT as u32 * count).min(MAX_SCORE as u32) as u8;
        out.push(CoupledFile {
            path,
            score,
            source: CouplingSource::Api,
            reason: format!("References {count} endpoint(s) this file defines"),
            evidence: Some(Evidence::Note(format!("{count} shared endpoint(s)"))),
            last_commit: None,
        });
    }
    finalize(out)
}
