//! # blastradius-analysis
//!
//! The analysis pipeline: context factory, coupling engines, volatility,
//! drift, importers, merger, compound risk, history search, and sibling
//! guidance (spec §4). Two entry points are exposed to a host: [`analyze_file`]
//! and [`search_history`].
//!
//! This crate never installs a global `tracing` subscriber; callers that
//! want output wire one up themselves (see `tracing-subscriber` in the
//! dev-dependencies, used only by the integration tests).

pub mod cache;
pub mod commitlog;
pub mod context;
pub mod diff;
pub mod drift;
pub mod engines;
pub mod extract;
pub mod git;
pub mod history;
pub mod ignore_filter;
pub mod importers;
pub mod limiter;
pub mod merger;
pub mod risk;
pub mod sibling;
pub mod volatility;

use std::path::Path;

use tracing::instrument;

use blastradius_core::{AnalysisError, AnalysisReport, CoupledFile};

pub use context::AnalysisContext;
pub use history::HistoryQuery;

/// Run the full pipeline for one absolute file path (spec §4.2-§4.10).
#[instrument(skip_all, fields(target = %target_absolute.display()))]
pub async fn analyze_file(target_absolute: &Path) -> Result<AnalysisReport, AnalysisError> {
    let ctx = AnalysisContext::build(target_absolute).await?;

    let (
        volatility_result,
        cochange_files,
        importer_files,
        docs_files,
        type_files,
        content_files,
        test_files,
        env_files,
        schema_files,
        api_files,
        transitive_files,
    ) = tokio::join!(
        volatility::analyse(&ctx.git, &ctx.target_relative, ctx.config.as_ref()),
        engines::cochange::run(&ctx),
        importers::detect(&ctx.git, &ctx.target_relative, &ctx.ignore),
        engines::docs::run(&ctx),
        engines::shared_types::run(&ctx),
        engines::content::run(&ctx),
        engines::tests_engine::run(&ctx),
        engines::env_vars::run(&ctx),
        engines::schema::run(&ctx),
        engines::api::run(&ctx),
        engines::transitive::run(&ctx),
    );

    // The drift engine consumes co-change's output, so it runs after the
    // fan-out above completes rather than inside it (spec §5).
    let drift_alerts = drift::detect(
        &ctx.git,
        &ctx.target_relative,
        &cochange_files,
        ctx.thresholds.drift_days,
    )
    .await;

    let coupled_files: Vec<CoupledFile> = merger::merge([
        cochange_files,
        test_files,
        api_files,
        schema_files,
        env_files,
        docs_files,
        type_files,
        transitive_files,
        content_files,
    ]);

    let risk = risk::assess(
        &volatility_result,
        &coupled_files,
        &drift_alerts,
        &importer_files,
        ctx.config.as_ref(),
    );

    let sibling_guidance = if volatility_result.commit_count == 0 {
        sibling::build(&ctx).await
    } else {
        None
    };

    Ok(AnalysisReport {
        target: ctx.target_relative,
        risk,
        coupled_files,
        drift_alerts,
        volatility: volatility_result,
        importers: importer_files,
        sibling_guidance,
    })
}

/// Search commit history by message, pickaxe, or line range (spec §4.8).
#[instrument(skip(target_absolute, request))]
pub async fn search_history(
    target_absolute: &Path,
    request: HistoryQuery<'_>,
) -> Result<Vec<blastradius_core::HistoryEntry>, AnalysisError> {
    let ctx = AnalysisContext::build(target_absolute).await?;
    history::search(&ctx, request).await
}
