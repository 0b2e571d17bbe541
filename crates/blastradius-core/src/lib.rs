//! # blastradius-core
//!
//! Shared data model, error type, and configuration record for the
//! blastradius analysis core. Every engine in `blastradius-analysis`
//! depends on this crate; it defines the vocabulary they all speak.

pub mod config;
pub mod errors;
pub mod types;

pub use config::{Configuration, RiskWeights, ThresholdOverrides, Thresholds};
pub use errors::AnalysisError;
pub use types::{
    AnalysisReport, AuthorBreakdown, ChangeType, CommitType, CoupledFile, CouplingSource,
    DiffSummary, DriftAlert, Evidence, HistoryEntry, MatchType, RecencyStats, RelevanceSnippet,
    RiskAssessment, RiskLevel, SearchMode, SiblingGuidance, SnippetChangeKind, VolatilityLabel,
    VolatilityResult,
};
