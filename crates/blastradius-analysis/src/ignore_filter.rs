//! Compiled glob matcher combining a universal baseline, the repository's
//! top-level ignore file, and configuration patterns (spec §4.1).
//!
//! Grounded on `drift-analysis`'s file walker (`src/scanner/walker.rs`),
//! which builds `ignore::overrides::OverrideBuilder` patterns over the same
//! `ignore` crate dependency. That walker matches an entire directory tree;
//! this filter instead matches single candidate paths that engines already
//! produced, so it is built on `ignore::gitignore::Gitignore` (the
//! crate's single-path matcher) rather than `WalkBuilder`.

use std::path::Path;
use std::sync::OnceLock;

use blastradius_core::Configuration;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use moka::sync::Cache as MokaCache;

/// Universal baseline applied to every repository regardless of
/// configuration: build outputs, IDE/VCS directories, logs, and binary
/// archives across the common ecosystems (spec §4.1).
pub const UNIVERSAL_BASELINE: &[&str] = &[
    // node
    "node_modules/",
    "dist/",
    "build/",
    ".next/",
    ".nuxt/",
    "coverage/",
    // python
    "__pycache__/",
    "*.pyc",
    ".venv/",
    "venv/",
    ".tox/",
    ".mypy_cache/",
    ".pytest_cache/",
    // java / dotnet
    "target/",
    "*.class",
    "bin/",
    "obj/",
    // c / rust
    "*.o",
    "*.so",
    "*.a",
    // go
    "vendor/",
    // ruby
    "*.gem",
    // php
    "composer.phar",
    // ide / vcs
    ".git/",
    ".idea/",
    ".vscode/",
    "*.log",
    // archives
    "*.zip",
    "*.tar.gz",
    "*.tar",
];

pub struct IgnoreFilter {
    matcher: Gitignore,
}

impl IgnoreFilter {
    /// Normalise back-slashes to forward slashes before matching, per
    /// spec §4.1.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        let normalised = relative_path.replace('\\', "/");
        self.matcher
            .matched(&normalised, false)
            .is_ignore()
    }

    fn build(repo_root: &Path, config_patterns: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(repo_root);
        for pattern in UNIVERSAL_BASELINE {
            let _ = builder.add_line(None, pattern);
        }
        for ignore_file_name in [".gitignore", ".ignore"] {
            let candidate = repo_root.join(ignore_file_name);
            if candidate.is_file() {
                let _ = builder.add(candidate);
                break;
            }
        }
        for pattern in config_patterns {
            let _ = builder.add_line(None, pattern);
        }
        let matcher = builder.build().unwrap_or_else(|_| {
            GitignoreBuilder::new(repo_root)
                .build()
                .expect("an empty Gitignore always builds")
        });
        Self { matcher }
    }
}

/// Filters are cached keyed by repository root concatenated with a
/// comma-joined configuration-pattern list (spec §4.1, §9).
pub fn ignore_filter_for(
    repo_root: &Path,
    config: Option<&Configuration>,
) -> std::sync::Arc<IgnoreFilter> {
    static CACHE: OnceLock<MokaCache<String, std::sync::Arc<IgnoreFilter>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        MokaCache::builder()
            .max_capacity(100)
            .time_to_live(std::time::Duration::from_secs(5 * 60))
            .build()
    });

    let patterns: &[String] = config.map(|c| c.ignore_patterns.as_slice()).unwrap_or(&[]);
    let key = format!("{}:{}", repo_root.display(), patterns.join(","));

    if let Some(existing) = cache.get(&key) {
        return existing;
    }
    let built = std::sync::Arc::new(IgnoreFilter::build(repo_root, patterns));
    cache.insert(key, built.clone());
    built
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastradius_core::Configuration;

    #[test]
    fn matches_universal_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let filter = ignore_filter_for(dir.path(), None);
        assert!(filter.is_ignored("node_modules/react/index.js"));
        assert!(filter.is_ignored("src\\build\\output.js"));
        assert!(!filter.is_ignored("src/main.rs"));
    }

    #[test]
    fn config_patterns_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Configuration::default();
        config.ignore_patterns.push("generated/**".to_string());
        let filter = ignore_filter_for(dir.path(), Some(&config));
        assert!(filter.is_ignored("generated/schema.rs"));
    }
}
