//! Engine 10 — environment variables (source `env`, spec §4.3.6). Files
//! that reference the same configuration-ish environment variables.

use tracing::instrument;

use blastradius_core::{CoupledFile, CouplingSource, Evidence};

use crate::context::AnalysisContext;
use crate::engines::finalize;
use crate::extract::extract_env_vars;

const CANDIDATE_CAP: usize = 20;
const MIN_SCORE: u8 = 40;
const MAX_SCORE: u8 = 75;
const PER_SHARED: u8 = 10;

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn run(ctx: &AnalysisContext) -> Vec<CoupledFile> {
    let content = match tokio::fs::read_to_string(&ctx.target_absolute).await {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let env_vars = extract_env_vars(&content);
    if env_vars.is_empty() {
        return Vec::new();
    }

    let pattern = env_vars
        .iter()
        .map(|v| regex::escape(v))
        .collect::<Vec<_>>()
        .join("|");
    let raw = ctx
        .git
        .grep_files(&pattern, None, false, false)
        .await
        .unwrap_or_default();

    let mut out = Vec::new();
    for path in raw.lines().filter(|l| !l.is_empty()).take(CANDIDATE_CAP) {
        if path == ctx.target_relative || ctx.ignore.is_ignored(path) {
            continue;
        }
        let full = ctx.repo_root.join(path);
        let Ok(candidate_content) = tokio::fs::read_to_string(&full).await else {
            continue;
        };
        let shared: Vec<&String> = env_vars
            .iter()
            .filter(|v| candidate_content.contains(v.as_str()))
            .collect();
        if shared.is_empty() {
            continue;
        }
        let count = shared.len() as u32;
        let score = (MIN_SCORE as u32 + PER_SHARED as u32 * count).min(MAX_SCORE as u32) as u8;
        let names: Vec<String> = shared.into_iter().cloned().collect();
        out.push(CoupledFile {
            path: path.to_string(),
            score,
            source: CouplingSource::Env,
            reason: format!("Shares {count} environment variable(s): {}", names.join(", ")),
            evidence: Some(Evidence::Note(names.join(", "))),
            last_commit: None,
        });
    }
    finalize(out)
}
