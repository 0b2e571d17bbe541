//! Sibling guidance for files with zero git history (spec §4.9).
//! Invoked only when `volatility.commit_count == 0`; derives the same
//! kind of advice a teammate would give by eyeballing the directory.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::instrument;

use blastradius_core::{SiblingGuidance, VolatilityLabel};

use crate::context::AnalysisContext;
use crate::extract::{is_test_filename, stem};
use crate::limiter::bounded_map;
use crate::volatility;

const SIBLING_CAP: usize = 5;
const IMPORT_LINE_CAP: usize = 30;
const COMMON_IMPORT_THRESHOLD: f64 = 0.5;
const SIBLING_NAMING_MIN_SHARED: usize = 2;

static IMPORT_PATH: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"import\s+.*?\s+from\s+['"]([^'"]+)['"]"#).expect("valid regex"),
        Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex"),
        Regex::new(r#"from\s+([\w.]+)\s+import"#).expect("valid regex"),
    ]
});

#[instrument(skip(ctx), fields(target = %ctx.target_relative))]
pub async fn build(ctx: &AnalysisContext) -> Option<SiblingGuidance> {
    let dir = Path::new(&ctx.target_relative).parent().unwrap_or_else(|| Path::new(""));
    let full_dir = ctx.repo_root.join(dir);
    let mut entries = tokio::fs::read_dir(&full_dir).await.ok()?;

    let target_ext = Path::new(&ctx.target_relative)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let target_basename = crate::extract::basename(&ctx.target_relative);

    let mut siblings = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == target_basename {
            continue;
        }
        let ext = Path::new(name).extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != target_ext {
            continue;
        }
        let relative = dir.join(name).to_string_lossy().replace('\\', "/");
        if ctx.ignore.is_ignored(&relative) {
            continue;
        }
        siblings.push(relative);
        if siblings.len() >= SIBLING_CAP {
            break;
        }
    }

    if siblings.is_empty() {
        return Some(SiblingGuidance::default());
    }

    let test_file_expected =
        !is_test_filename(target_basename) && siblings.iter().any(|s| is_test_filename(crate::extract::basename(s)));

    let mut import_counts: FxHashMap<String, usize> = FxHashMap::default();
    for sibling in &siblings {
        let full = ctx.repo_root.join(sibling);
        let content = tokio::fs::read_to_string(&full).await.unwrap_or_default();
        let head: String = content.lines().take(IMPORT_LINE_CAP).collect::<Vec<_>>().join("\n");
        let mut seen_this_file = FxHashSet::default();
        for re in IMPORT_PATH.iter() {
            for caps in re.captures_iter(&head) {
                if let Some(m) = caps.get(1) {
                    seen_this_file.insert(m.as_str().to_string());
                }
            }
        }
        for path in &seen_this_file {
            *import_counts.entry(path.clone()).or_insert(0) += 1;
        }
    }

    let threshold = (siblings.len() as f64 * COMMON_IMPORT_THRESHOLD).ceil() as usize;
    let mut common_imports: Vec<String> = import_counts
        .into_iter()
        .filter(|(_, count)| *count >= threshold.max(1))
        .map(|(path, _)| path)
        .collect();
    common_imports.sort();

    let (shared_prefix, shared_suffix) = naming_convention(&siblings);

    let git_c = ctx.git.clone();
    let config = ctx.config.clone();
    let panic_scores = bounded_map(siblings.clone(), 3, move |path| {
        let git = git_c.clone();
        let config = config.clone();
        async move { volatility::analyse(&git, &path, config.as_ref()).await.panic_score }
    })
    .await;
    let mean_panic_score = if panic_scores.is_empty() {
        0.0
    } else {
        panic_scores.iter().map(|s| *s as f64).sum::<f64>() / panic_scores.len() as f64
    };

    Some(SiblingGuidance {
        analysed_siblings: siblings,
        test_file_expected,
        common_imports,
        shared_prefix,
        shared_suffix,
        mean_panic_score,
        volatility_label: VolatilityLabel::from_mean_panic_score(mean_panic_score),
    })
}

/// Prefix = substring before the first lowercase→uppercase transition;
/// suffix = trailing PascalCase run after the last uppercase-run
/// boundary. Reported when shared by at least two siblings (spec §4.9;
/// this precise definition resolves an Open Question — see DESIGN.md).
fn naming_convention(siblings: &[String]) -> (Option<String>, Option<String>) {
    let stems: Vec<&str> = siblings.iter().map(|s| stem(s)).collect();

    let mut prefix_counts: FxHashMap<String, usize> = FxHashMap::default();
    let mut suffix_counts: FxHashMap<String, usize> = FxHashMap::default();

    for name in &stems {
        if let Some(prefix) = prefix_candidate(name) {
            *prefix_counts.entry(prefix).or_insert(0) += 1;
        }
        if let Some(suffix) = suffix_candidate(name) {
            *suffix_counts.entry(suffix).or_insert(0) += 1;
        }
    }

    let shared_prefix = prefix_counts
        .into_iter()
        .filter(|(_, count)| *count >= SIBLING_NAMING_MIN_SHARED)
        .max_by_key(|(_, count)| *count)
        .map(|(p, _)| p);
    let shared_suffix = suffix_counts
        .into_iter()
        .filter(|(_, count)| *count >= SIBLING_NAMING_MIN_SHARED)
        .max_by_key(|(_, count)| *count)
        .map(|(s, _)| s);

    (shared_prefix, shared_suffix)
}

/// Substring before the first lowercase→uppercase transition, e.g.
/// `userProfile` -> `user`, `useAuthHook` -> `use`.
fn prefix_candidate(name: &str) -> Option<String> {
    let chars: Vec<char> = name.chars().collect();
    for i in 1..chars.len() {
        if chars[i - 1].is_lowercase() && chars[i].is_uppercase() {
            return Some(chars[..i].iter().collect());
        }
    }
    None
}

/// Trailing PascalCase run after the last uppercase-run boundary, e.g.
/// `userProfileCard` -> `Card`, `AuthProvider` -> `Provider`.
fn suffix_candidate(name: &str) -> Option<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut boundary = None;
    for i in 1..chars.len() {
        if chars[i].is_uppercase() {
            boundary = Some(i);
        }
    }
    boundary.map(|i| chars[i..].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_candidate_splits_at_first_lower_to_upper_transition() {
        assert_eq!(prefix_candidate("userProfile"), Some("user".to_string()));
        assert_eq!(prefix_candidate("lowercase"), None);
    }

    #[test]
    fn suffix_candidate_takes_trailing_pascal_run() {
        assert_eq!(suffix_candidate("userProfileCard"), Some("Card".to_string()));
        assert_eq!(suffix_candidate("AuthProvider"), Some("Provider".to_string()));
    }

    #[test]
    fn naming_convention_requires_at_least_two_siblings_sharing_prefix() {
        let siblings = vec!["dir/userCard.tsx".to_string(), "dir/userList.tsx".to_string()];
        let (prefix, _) = naming_convention(&siblings);
        assert_eq!(prefix, Some("user".to_string()));
    }
}
