//! The data model shared by every engine and by the merger/risk/history
//! stages. All entities live for the duration of a single request unless
//! the cache retains a clone (spec §3/§5).

use serde::{Deserialize, Serialize};

/// The closed set of coupling evidence engines (spec §3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingSource {
    Git,
    Docs,
    Type,
    Content,
    Test,
    Env,
    Schema,
    Api,
    Transitive,
}

impl CouplingSource {
    /// Fixed merge priority, highest first (spec §4.3.10).
    pub const PRIORITY: [CouplingSource; 9] = [
        CouplingSource::Git,
        CouplingSource::Test,
        CouplingSource::Api,
        CouplingSource::Schema,
        CouplingSource::Env,
        CouplingSource::Docs,
        CouplingSource::Type,
        CouplingSource::Transitive,
        CouplingSource::Content,
    ];

    pub fn priority_rank(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|s| *s == self)
            .expect("CouplingSource::PRIORITY enumerates every variant")
    }
}

/// Classification of a unified diff hunk's dominant change (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Schema,
    Api,
    Config,
    Import,
    Test,
    Style,
    Unknown,
}

/// Structured summary of a unified diff (spec §3 "Diff summary").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Up to ten added lines (trimmed, non-empty).
    pub added_lines: Vec<String>,
    /// Up to ten removed lines (trimmed, non-empty).
    pub removed_lines: Vec<String>,
    pub hunk_count: u32,
    /// Computed from the untruncated added/removed counts, so this remains
    /// accurate even after `added_lines`/`removed_lines` are truncated.
    pub net_change: i64,
    pub breaking_change: bool,
    pub change_type: ChangeType,
}

impl DiffSummary {
    /// The empty summary returned for binary inputs (spec §4.1, §8).
    pub fn empty_binary() -> Self {
        Self {
            change_type: ChangeType::Unknown,
            ..Default::default()
        }
    }
}

impl Default for ChangeType {
    fn default() -> Self {
        ChangeType::Unknown
    }
}

/// The coupled-file evidence slot: either a parsed diff summary (git
/// source only) or a short human-readable string (every other source).
/// Represented as a tagged variant with two arms, matched on the record's
/// `source` tag rather than on runtime type inspection (spec §9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    Diff(DiffSummary),
    Note(String),
}

/// A single coupled file produced by one coupling engine (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoupledFile {
    /// Relative to the repository root.
    pub path: String,
    /// 0-100.
    pub score: u8,
    pub source: CouplingSource,
    pub reason: String,
    pub evidence: Option<Evidence>,
    /// git-source only: the most recent commit in which this coupling was
    /// observed.
    pub last_commit: Option<String>,
}

/// Per-author contribution to a file's history (spec §3 "Volatility
/// result").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorBreakdown {
    pub name: String,
    pub email: String,
    pub commit_count: u32,
    pub percentage: f64,
    pub first_commit: String,
    pub last_commit: String,
}

/// Oldest/newest commit age and mean decay, surfaced alongside the panic
/// score so a caller can see *why* the score landed where it did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyStats {
    pub oldest_commit_age_days: i64,
    pub newest_commit_age_days: i64,
    pub mean_decay_factor: f64,
}

/// Commit-message volatility for one file (spec §3, §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityResult {
    pub commit_count: u32,
    /// 0-100, after recency decay.
    pub panic_score: u8,
    /// Up to three excerpts, each truncated to 60 chars.
    pub high_severity_excerpts: Vec<String>,
    pub most_recent_commit: Option<String>,
    pub author_count: u32,
    pub author_breakdown: Vec<AuthorBreakdown>,
    pub top_author: Option<AuthorBreakdown>,
    pub recency: Option<RecencyStats>,
}

impl VolatilityResult {
    pub fn empty() -> Self {
        Self {
            commit_count: 0,
            panic_score: 0,
            high_severity_excerpts: Vec::new(),
            most_recent_commit: None,
            author_count: 0,
            author_breakdown: Vec::new(),
            top_author: None,
            recency: None,
        }
    }
}

/// A coupled file whose on-disk mtime lags the target by more than the
/// adaptive drift-days threshold (spec §3, §4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftAlert {
    pub file: String,
    pub days_of_skew: i64,
}

/// Qualitative risk bucket (spec §3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Compound risk assessment for a target file (spec §3, §4.7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub recommended_action: String,
}

/// (a) "test file expected", (b) "common imports", (c) "naming convention"
/// findings for same-directory siblings of a file with zero history (spec
/// §3, §4.9).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiblingGuidance {
    pub analysed_siblings: Vec<String>,
    pub test_file_expected: bool,
    pub common_imports: Vec<String>,
    pub shared_prefix: Option<String>,
    pub shared_suffix: Option<String>,
    pub mean_panic_score: f64,
    pub volatility_label: VolatilityLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityLabel {
    Stable,
    Moderate,
    Volatile,
}

impl Default for VolatilityLabel {
    fn default() -> Self {
        VolatilityLabel::Stable
    }
}

impl VolatilityLabel {
    pub fn from_mean_panic_score(mean: f64) -> Self {
        if mean >= 50.0 {
            VolatilityLabel::Volatile
        } else if mean >= 25.0 {
            VolatilityLabel::Moderate
        } else {
            VolatilityLabel::Stable
        }
    }
}

/// The full output of a single `analyze_file` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub target: String,
    pub risk: RiskAssessment,
    pub coupled_files: Vec<CoupledFile>,
    pub drift_alerts: Vec<DriftAlert>,
    pub volatility: VolatilityResult,
    pub importers: Vec<String>,
    pub sibling_guidance: Option<SiblingGuidance>,
}

// --- History search -------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Message,
    Diff,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Message,
    Diff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitType {
    Bugfix,
    Feature,
    Refactor,
    Docs,
    Test,
    Chore,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceSnippet {
    pub text: String,
    pub change_kind: SnippetChangeKind,
}

/// One matched commit from `search_history` (spec §3 "History-search
/// result").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Seven-hex short hash.
    pub hash: String,
    /// ISO date, day granularity.
    pub date: String,
    pub author: String,
    pub subject: String,
    /// Up to five changed file paths.
    pub files: Vec<String>,
    pub match_type: MatchType,
    pub commit_type: CommitType,
    pub snippet: Option<RelevanceSnippet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_rank_orders_git_first_and_content_last() {
        assert_eq!(CouplingSource::Git.priority_rank(), 0);
        assert_eq!(CouplingSource::Content.priority_rank(), 8);
        assert!(CouplingSource::Test.priority_rank() < CouplingSource::Docs.priority_rank());
    }

    #[test]
    fn volatility_label_thresholds() {
        assert_eq!(VolatilityLabel::from_mean_panic_score(10.0), VolatilityLabel::Stable);
        assert_eq!(VolatilityLabel::from_mean_panic_score(25.0), VolatilityLabel::Moderate);
        assert_eq!(VolatilityLabel::from_mean_panic_score(49.9), VolatilityLabel::Moderate);
        assert_eq!(VolatilityLabel::from_mean_panic_score(50.0), VolatilityLabel::Volatile);
    }

    #[test]
    fn evidence_roundtrips_through_json() {
        let e = Evidence::Diff(DiffSummary::empty_binary());
        let json = serde_json::to_string(&e).unwrap();
        let back: Evidence = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
    }
}
