//! Engine 1 — co-change (source `git`, spec §4.3.1). The strongest
//! evidence signal: files that keep landing in the same commits as the
//! target.

use rustc_hash::FxHashMap;
use tracing::instrument;

use blastradius_core::{CoupledFile, CouplingSource, Evidence};

use crate::cache::{cache_key, Cache};
use crate::commitlog::parse_log_with_email;
use crate::context::AnalysisContext;
use crate::diff::parse_diff;
use crate::extract::basename;
use crate::limiter::bounded_map;

const MIN_COMMITS: usize = 3;
const DIFF_SNIPPET_MAX_CHARS: usize = 1_000;

struct Accumulator {
    count: u32,
    last_commit: String,
}

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn run(ctx: &AnalysisContext) -> Vec<CoupledFile> {
    let raw_log = match ctx
        .git
        .log_for_file(&ctx.target_relative, ctx.thresholds.analysis_window as u32)
        .await
    {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let commits = parse_log_with_email(&raw_log);
    let total = commits.len();
    if total < MIN_COMMITS {
        return Vec::new();
    }

    let hashes: Vec<String> = commits.iter().map(|c| c.hash.clone()).collect();
    let git_c = ctx.git.clone();
    let name_lists = bounded_map(hashes.clone(), 5, move |hash| {
        let git = git_c.clone();
        async move {
            let names = git.show_name_only(&hash).await.unwrap_or_default();
            (hash, names)
        }
    })
    .await;

    let target_basename = basename(&ctx.target_relative);
    let max_files = ctx.thresholds.max_files_per_commit as usize;

    let mut accum: FxHashMap<String, Accumulator> = FxHashMap::default();
    for (hash, names) in name_lists {
        let files: Vec<&str> = names.lines().filter(|l| !l.is_empty()).collect();
        if files.len() > max_files {
            continue;
        }
        for file in files {
            if file == ctx.target_relative || basename(file) == target_basename {
                continue;
            }
            if ctx.ignore.is_ignored(file) {
                continue;
            }
            let entry = accum.entry(file.to_string()).or_insert_with(|| Accumulator {
                count: 0,
                last_commit: hash.clone(),
            });
            entry.count += 1;
            // The log is newest-first, so the first hit for a file is
            // already its most recent co-change commit.
        }
    }

    let mut ranked: Vec<(String, Accumulator)> = accum.into_iter().collect();
    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count));
    ranked.truncate(5);

    let threshold = ctx.thresholds.coupling_percent;
    let survivors: Vec<(String, Accumulator)> = ranked
        .into_iter()
        .map(|(path, acc)| {
            let score = ((acc.count as f64 / total as f64) * 100.0).round() as u8;
            (path, acc, score)
        })
        .filter(|(_, _, score)| *score >= threshold)
        .map(|(path, acc, _)| (path, acc))
        .collect();

    let mut out = Vec::with_capacity(survivors.len());
    for (path, acc) in survivors {
        let score = ((acc.count as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8;
        let evidence = fetch_diff_evidence(ctx, &acc.last_commit, &path).await;
        out.push(CoupledFile {
            path,
            score,
            source: CouplingSource::Git,
            reason: format!("Co-changed in {} of {total} commits", acc.count),
            evidence: Some(evidence),
            last_commit: Some(acc.last_commit),
        });
    }
    out
}

async fn fetch_diff_evidence(ctx: &AnalysisContext, commit: &str, path: &str) -> Evidence {
    let key = cache_key(&["diff", commit, path]);
    if let Some(cached) = Cache::global().get::<String>(&key) {
        return Evidence::Diff(parse_diff(&cached));
    }
    let raw = ctx
        .git
        .show_diff(commit, Some(path))
        .await
        .unwrap_or_default();
    let truncated: String = raw.chars().take(DIFF_SNIPPET_MAX_CHARS).collect();
    Cache::global().insert(key, &truncated);
    Evidence::Diff(parse_diff(&truncated))
}
