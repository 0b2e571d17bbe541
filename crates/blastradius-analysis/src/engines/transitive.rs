//! Engine 13 — transitive re-export (source `transitive`, spec §4.3.9).
//! Barrel files that re-export the target, and files importing through
//! those barrels.

use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::instrument;

use blastradius_core::{CoupledFile, CouplingSource, Evidence};

use crate::context::AnalysisContext;
use crate::engines::finalize;
use crate::extract::{barrel_re_export_pattern, stem};

const BARREL_CAP: usize = 3;
const TOTAL_CAP: usize = 5;
const BARREL_SCORE: u8 = 60;
const IMPORTER_SCORE: u8 = 55;

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn run(ctx: &AnalysisContext) -> Vec<CoupledFile> {
    let target_stem = stem(&ctx.target_relative);
    let pattern = barrel_re_export_pattern(target_stem);

    let raw = ctx
        .git
        .grep_files(&pattern, None, false, false)
        .await
        .unwrap_or_default();

    let mut seen = FxHashSet::default();
    let mut out = Vec::new();

    let barrels: Vec<String> = raw
        .lines()
        .filter(|l| !l.is_empty())
        .filter(|p| *p != ctx.target_relative && !ctx.ignore.is_ignored(p))
        .take(BARREL_CAP)
        .map(str::to_string)
        .collect();

    for barrel in &barrels {
        if seen.insert(barrel.clone()) {
            out.push(CoupledFile {
                path: barrel.clone(),
                score: BARREL_SCORE,
                source: CouplingSource::Transitive,
                reason: "Re-exports this file.".to_string(),
                evidence: Some(Evidence::Note("barrel re-export".to_string())),
                last_commit: None,
            });
        }
    }

    'barrels: for barrel in &barrels {
        let barrel_stem = stem(barrel);
        let barrel_dir = Path::new(barrel)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        let pattern = format!(
            r"from\s+['\"](?:[./]*{}|[./]*{})['\"]",
            regex::escape(barrel_stem),
            regex::escape(&barrel_dir)
        );
        let raw = ctx
            .git
            .grep_files(&pattern, None, false, false)
            .await
            .unwrap_or_default();

        for path in raw.lines().filter(|l| !l.is_empty()) {
            if path == ctx.target_relative || barrels.iter().any(|b| b == path) || ctx.ignore.is_ignored(path) {
                continue;
            }
            if seen.insert(path.to_string()) {
                out.push(CoupledFile {
                    path: path.to_string(),
                    score: IMPORTER_SCORE,
                    source: CouplingSource::Transitive,
                    reason: format!("Imports via {barrel}."),
                    evidence: Some(Evidence::Note(format!("barrel import through {barrel}"))),
                    last_commit: None,
                });
            }
            if out.len() >= TOTAL_CAP {
                break 'barrels;
            }
        }
    }

    out.truncate(TOTAL_CAP);
    finalize(out)
}
