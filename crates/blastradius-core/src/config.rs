//! Per-repository configuration record.
//!
//! Mirrors the way `drift-core::config::ScanConfig` models an optional,
//! all-fields-absent-by-default config: every field is `Option`, an
//! `effective_*`/`resolve` accessor supplies the default, and a malformed
//! document is treated by the loader (in `blastradius-analysis`) as if it
//! were entirely absent rather than aborting the request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Coupling percent, drift days, analysis window, and max-files-per-commit
/// thresholds. Any field left `None` is filled in by the adaptive-threshold
/// pass from project metrics; any field present here overrides that pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdOverrides {
    /// 0-100.
    pub coupling_percent: Option<u8>,
    /// 1-365.
    pub drift_days: Option<u16>,
    /// 10-500.
    pub analysis_window: Option<u16>,
    /// 5-100.
    pub max_files_per_commit: Option<u16>,
}

/// Resolved thresholds, always fully populated (see `AdaptiveThresholds`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub coupling_percent: u8,
    pub drift_days: u16,
    pub analysis_window: u16,
    pub max_files_per_commit: u16,
}

/// The four compound-risk weights. Must sum to roughly 1.0 but this is not
/// enforced; a caller who supplies skewed weights gets a skewed score, which
/// is their prerogative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub volatility: f64,
    pub coupling: f64,
    pub drift: f64,
    pub importers: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            volatility: 0.35,
            coupling: 0.30,
            drift: 0.20,
            importers: 0.15,
        }
    }
}

/// Optional, validated per-repo configuration. An instance of this type
/// always represents a *successfully parsed* document; a document that
/// fails to parse or carries unknown top-level fields never becomes one
/// (the loader treats that case as `None` entirely, per spec §3's
/// Configuration invariant).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    pub thresholds: ThresholdOverrides,
    pub ignore_patterns: Vec<String>,
    /// Overlaid on top of the base panic-keyword table; a keyword present
    /// here replaces the base weight for that keyword.
    pub panic_keywords: BTreeMap<String, f64>,
    pub risk_weights: Option<RiskWeights>,
}

impl Configuration {
    /// A deterministic fingerprint of the fields that influence a cached
    /// result: sorted threshold fields, ignore-pattern *count* (not the
    /// patterns themselves — see spec §9 "Cache identity"), and sorted
    /// panic-keyword names. Never serialise the whole record for this
    /// purpose: object-key order in a general-purpose JSON encoder is not
    /// guaranteed stable across runtimes.
    pub fn fingerprint(&self) -> String {
        let t = &self.thresholds;
        let mut keyword_names: Vec<&str> =
            self.panic_keywords.keys().map(String::as_str).collect();
        keyword_names.sort_unstable();
        let rw = self.risk_weights;
        format!(
            "cp={:?}:dd={:?}:aw={:?}:mfc={:?}:ip={}:kw={}:rw={:?}",
            t.coupling_percent,
            t.drift_days,
            t.analysis_window,
            t.max_files_per_commit,
            self.ignore_patterns.len(),
            keyword_names.join(","),
            rw.map(|w| (w.volatility, w.coupling, w.drift, w.importers)),
        )
    }

    pub fn risk_weights(&self) -> RiskWeights {
        self.risk_weights.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_for_equal_configs() {
        let mut a = Configuration::default();
        a.ignore_patterns = vec!["foo".into(), "bar".into()];
        a.panic_keywords.insert("zeta".into(), 1.0);
        a.panic_keywords.insert("alpha".into(), 2.0);

        let mut b = Configuration::default();
        b.ignore_patterns = vec!["baz".into(), "qux".into()]; // same count, different content
        b.panic_keywords.insert("alpha".into(), 2.0);
        b.panic_keywords.insert("zeta".into(), 1.0);

        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_pattern_count() {
        let mut a = Configuration::default();
        a.ignore_patterns = vec!["foo".into()];
        let mut b = Configuration::default();
        b.ignore_patterns = vec!["foo".into(), "bar".into()];
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let raw = r#"{"thresholds": {}, "bogus_field": 1}"#;
        let parsed: Result<Configuration, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn default_risk_weights_sum_near_one() {
        let w = RiskWeights::default();
        let sum = w.volatility + w.coupling + w.drift + w.importers;
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
