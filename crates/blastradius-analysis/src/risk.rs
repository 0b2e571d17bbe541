//! Compound risk scoring (spec §4.7): volatility, coupling, drift, and
//! importer components combined under configurable weights into a score
//! and a qualitative level.

use blastradius_core::{
    Configuration, CoupledFile, DriftAlert, RiskAssessment, RiskLevel, RiskWeights,
    VolatilityResult,
};

const COUPLING_MULTIPLIER: f64 = 1.5;
const DRIFT_PER_STALE: f64 = 25.0;
const IMPORTER_PER_FILE: f64 = 10.0;

const HIGH_VOLATILITY_THRESHOLD: u8 = 50;
const TIGHTLY_COUPLED_MIN_FILES: usize = 3;
const HEAVILY_IMPORTED_MIN_FILES: usize = 5;

pub fn assess(
    volatility: &VolatilityResult,
    coupled_files: &[CoupledFile],
    drift_alerts: &[DriftAlert],
    importers: &[String],
    config: Option<&Configuration>,
) -> RiskAssessment {
    let weights = config.map(Configuration::risk_weights).unwrap_or_default();

    let volatility_component = volatility.panic_score as f64;
    let coupling_component = coupling_component(coupled_files);
    let drift_component = (DRIFT_PER_STALE * drift_alerts.len() as f64).min(100.0);
    let importer_component = (IMPORTER_PER_FILE * importers.len() as f64).min(100.0);

    let score = weighted_sum(
        &weights,
        volatility_component,
        coupling_component,
        drift_component,
        importer_component,
    );
    let score = (score.round() as i64).clamp(0, 100) as u8;
    let level = level_for(score);

    let factors = build_factors(volatility, coupled_files, drift_alerts, importers);
    let recommended_action = recommend_action(level);

    RiskAssessment {
        score,
        level,
        factors,
        recommended_action,
    }
}

fn coupling_component(coupled_files: &[CoupledFile]) -> f64 {
    if coupled_files.is_empty() {
        return 0.0;
    }
    let mut scores: Vec<u8> = coupled_files.iter().map(|c| c.score).collect();
    scores.sort_by(|a, b| b.cmp(a));
    let top_three = &scores[..scores.len().min(3)];
    let mean = top_three.iter().map(|s| *s as f64).sum::<f64>() / top_three.len() as f64;
    (mean * COUPLING_MULTIPLIER).min(100.0)
}

fn weighted_sum(
    weights: &RiskWeights,
    volatility: f64,
    coupling: f64,
    drift: f64,
    importers: f64,
) -> f64 {
    volatility * weights.volatility
        + coupling * weights.coupling
        + drift * weights.drift
        + importers * weights.importers
}

fn level_for(score: u8) -> RiskLevel {
    if score >= 75 {
        RiskLevel::Critical
    } else if score >= 50 {
        RiskLevel::High
    } else if score >= 25 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn build_factors(
    volatility: &VolatilityResult,
    coupled_files: &[CoupledFile],
    drift_alerts: &[DriftAlert],
    importers: &[String],
) -> Vec<String> {
    let mut factors = Vec::new();

    if volatility.commit_count == 0 {
        factors.push("No git history (new file)".to_string());
    }
    if volatility.panic_score >= HIGH_VOLATILITY_THRESHOLD {
        factors.push(format!("High volatility ({}%)", volatility.panic_score));
    }
    if coupled_files.len() >= TIGHTLY_COUPLED_MIN_FILES {
        factors.push(format!("Tightly coupled ({} files)", coupled_files.len()));
    }
    if !drift_alerts.is_empty() {
        factors.push(format!("{} stale dependencies", drift_alerts.len()));
    }
    if importers.len() >= HEAVILY_IMPORTED_MIN_FILES {
        factors.push(format!(
            "Heavily imported ({} files depend on this)",
            importers.len()
        ));
    }

    factors
}

fn recommend_action(level: RiskLevel) -> String {
    match level {
        RiskLevel::Critical => {
            "Review every coupled file and stale dependency before merging.".to_string()
        }
        RiskLevel::High => "Review coupled files and run the full test suite.".to_string(),
        RiskLevel::Medium => "Spot-check coupled files before merging.".to_string(),
        RiskLevel::Low => "Standard review is sufficient.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastradius_core::CouplingSource;

    fn coupled(score: u8) -> CoupledFile {
        CoupledFile {
            path: "f.ts".to_string(),
            score,
            source: CouplingSource::Git,
            reason: String::new(),
            evidence: None,
            last_commit: None,
        }
    }

    #[test]
    fn level_thresholds_match_spec_boundaries() {
        assert_eq!(level_for(75), RiskLevel::Critical);
        assert_eq!(level_for(74), RiskLevel::High);
        assert_eq!(level_for(50), RiskLevel::High);
        assert_eq!(level_for(49), RiskLevel::Medium);
        assert_eq!(level_for(25), RiskLevel::Medium);
        assert_eq!(level_for(24), RiskLevel::Low);
    }

    #[test]
    fn coupling_component_averages_top_three_and_caps_at_one_hundred() {
        let files = vec![coupled(90), coupled(84), coupled(80), coupled(1)];
        let component = coupling_component(&files);
        assert!((component - 100.0).abs() < 1e-9); // (90+84+80)/3 * 1.5 = 127 -> capped
    }

    #[test]
    fn new_file_with_no_history_gets_the_new_file_factor() {
        let volatility = VolatilityResult::empty();
        let factors = build_factors(&volatility, &[], &[], &[]);
        assert!(factors.contains(&"No git history (new file)".to_string()));
    }
}
