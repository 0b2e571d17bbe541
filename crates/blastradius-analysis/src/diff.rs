//! Unified diff parsing and change-type classification (spec §4.1, §8).
//!
//! Regex families are constants compiled once (spec §9 "Regex
//! pre-compilation"), using `std::sync::LazyLock` rather than a
//! `once_cell`/`lazy_static` dependency — the workspace already targets
//! Rust 1.80, where `LazyLock` is stable in `std`, so no extra crate earns
//! its keep here. The teacher (`drift-analysis`) instead compiles its
//! regex families inline per call (e.g.
//! `structural/crypto/detector.rs`); we keep the same "regex as a plain
//! `Regex::new` constant" idiom but hoist it to module-level statics since
//! this parser runs on every coupling engine's diff fetch, not once per
//! scan.

use std::sync::LazyLock;

use blastradius_core::{ChangeType, DiffSummary};
use regex::Regex;

pub const BINARY_MARKER: &str = "[Binary file]";

const MAX_LINES: usize = 10;

static REMOVAL_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(remove|delete|deprecate)\b").expect("valid regex")
});
static REMOVED_EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*export\s").expect("valid regex"));
static REMOVED_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s*(export\s+)?(async\s+)?function\s+\w+|^-\s*(pub\s+)?fn\s+\w+")
        .expect("valid regex")
});
static REMOVED_TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s*(export\s+)?(interface|type|class|struct|enum|trait)\s+\w+")
        .expect("valid regex")
});

static SCHEMA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(create|alter)\s+table|@(entity|table|column)|schema\.define|models\.\w+")
        .expect("valid regex")
});
static API_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\.(get|post|put|patch|delete)\s*\(\s*["']|@(Get|Post|Put|Patch|Delete)Mapping|router\.|app\.route"#)
        .expect("valid regex")
});
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]\s*(import\s|from\s.+\simport\s|require\()").expect("valid regex")
});
static CONFIG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(json|ya?ml|toml|env)\b|process\.env\.|config\.").expect("valid regex")
});
static TEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(describe|it|test|expect|assert)\s*\(").expect("valid regex")
});

/// Parse a raw diff (or one of the two binary markers) into a structured
/// summary (spec §4.1).
pub fn parse_diff(raw: &str) -> DiffSummary {
    if raw.trim() == BINARY_MARKER || raw.contains("Binary files") {
        return DiffSummary::empty_binary();
    }

    let hunk_count = raw.lines().filter(|l| l.starts_with("@@")).count() as u32;

    let mut added_untrunc = Vec::new();
    let mut removed_untrunc = Vec::new();

    for line in raw.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if let Some(rest) = line.strip_prefix('+') {
            let trimmed = rest.trim();
            if !trimmed.is_empty() {
                added_untrunc.push(trimmed.to_string());
            }
        } else if let Some(rest) = line.strip_prefix('-') {
            let trimmed = rest.trim();
            if !trimmed.is_empty() {
                removed_untrunc.push(trimmed.to_string());
            }
        }
    }

    let net_change = added_untrunc.len() as i64 - removed_untrunc.len() as i64;
    let breaking_change = raw
        .lines()
        .filter(|l| l.starts_with('-') && !l.starts_with("---"))
        .any(|l| {
            REMOVAL_KEYWORDS.is_match(l)
                || REMOVED_EXPORT.is_match(l)
                || REMOVED_FUNCTION.is_match(l)
                || REMOVED_TYPE_DECL.is_match(l)
        });

    let change_type = classify_change_type(raw, &added_untrunc, &removed_untrunc);

    added_untrunc.truncate(MAX_LINES);
    removed_untrunc.truncate(MAX_LINES);

    DiffSummary {
        added_lines: added_untrunc,
        removed_lines: removed_untrunc,
        hunk_count,
        net_change,
        breaking_change,
        change_type,
    }
}

/// Classify the dominant change type. A function of the *multiset* of
/// lines, not their order within the additions/removals arrays (spec §8).
fn classify_change_type(raw: &str, added: &[String], removed: &[String]) -> ChangeType {
    if raw.lines().any(|l| SCHEMA_RE.is_match(l)) {
        return ChangeType::Schema;
    }
    if raw.lines().any(|l| API_RE.is_match(l)) {
        return ChangeType::Api;
    }
    if raw.lines().any(|l| IMPORT_RE.is_match(l)) {
        return ChangeType::Import;
    }
    if raw.lines().any(|l| CONFIG_RE.is_match(l)) {
        return ChangeType::Config;
    }
    if raw.lines().any(|l| TEST_RE.is_match(l)) {
        return ChangeType::Test;
    }

    if is_style_only(added, removed) {
        return ChangeType::Style;
    }
    ChangeType::Unknown
}

/// True when additions and removals are the same multiset of lines up to
/// whitespace — a pure reformat.
fn is_style_only(added: &[String], removed: &[String]) -> bool {
    if added.is_empty() && removed.is_empty() {
        return false;
    }
    let normalise = |lines: &[String]| -> Vec<String> {
        let mut v: Vec<String> = lines
            .iter()
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        v.sort();
        v
    };
    normalise(added) == normalise(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_marker_yields_empty_unknown_summary() {
        let summary = parse_diff(BINARY_MARKER);
        assert_eq!(summary, DiffSummary::empty_binary());
    }

    #[test]
    fn git_binary_message_yields_empty_summary() {
        let summary = parse_diff("Binary files a/img.png and b/img.png differ\n");
        assert_eq!(summary.change_type, ChangeType::Unknown);
        assert!(summary.added_lines.is_empty());
    }

    #[test]
    fn net_change_survives_truncation() {
        let mut raw = String::from("@@ -1,20 +1,5 @@\n");
        for i in 0..20 {
            raw.push_str(&format!("-old line {i}\n"));
        }
        for i in 0..5 {
            raw.push_str(&format!("+new line {i}\n"));
        }
        let summary = parse_diff(&raw);
        assert_eq!(summary.added_lines.len(), 5);
        assert_eq!(summary.removed_lines.len(), 10); // truncated to ten
        assert_eq!(summary.net_change, 5 - 20);
        assert_eq!(summary.hunk_count, 1);
    }

    #[test]
    fn detects_removed_export_as_breaking() {
        let raw = "@@ -1,1 +0,0 @@\n-export function doThing() {}\n";
        let summary = parse_diff(raw);
        assert!(summary.breaking_change);
    }

    #[test]
    fn pure_whitespace_reformat_is_style() {
        let raw = "@@ -1,1 +1,1 @@\n-  const x = 1;\n+const   x   =   1;\n";
        let summary = parse_diff(raw);
        assert_eq!(summary.change_type, ChangeType::Style);
        assert!(!summary.breaking_change);
    }

    #[test]
    fn schema_marker_wins_classification() {
        let raw = "@@ -1,1 +1,1 @@\n+CREATE TABLE users (id INT);\n";
        let summary = parse_diff(raw);
        assert_eq!(summary.change_type, ChangeType::Schema);
    }

    #[test]
    fn empty_lines_are_discarded() {
        let raw = "@@ -1,2 +1,2 @@\n+\n+real line\n-\n-also real\n";
        let summary = parse_diff(raw);
        assert_eq!(summary.added_lines, vec!["real line".to_string()]);
        assert_eq!(summary.removed_lines, vec!["also real".to_string()]);
    }
}
