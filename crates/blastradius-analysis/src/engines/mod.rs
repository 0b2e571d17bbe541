//! The nine coupling engines (spec §4.3) plus their shared contract:
//! input is the target path and the analysis context, output is coupled
//! files sorted by score descending, capped at five, tagged with the
//! engine's `CouplingSource`. Every engine swallows its own errors and
//! returns an empty list on failure (spec §4.3 "an engine failure must
//! never break the pipeline").

pub mod api;
pub mod cochange;
pub mod content;
pub mod docs;
pub mod env_vars;
pub mod schema;
pub mod shared_types;
pub mod tests_engine;
pub mod transitive;

use blastradius_core::CoupledFile;

/// Sort by score descending (stable, so equal scores keep discovery
/// order) and keep the top five (spec §4.3).
pub(crate) fn finalize(mut files: Vec<CoupledFile>) -> Vec<CoupledFile> {
    files.sort_by(|a, b| b.score.cmp(&a.score));
    files.truncate(5);
    files
}
