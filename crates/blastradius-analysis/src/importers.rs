//! Static importer engine: files whose source text references the target
//! by a quoted import/from/require path mentioning its basename (spec
//! §4.6).

use tracing::instrument;

use crate::extract::{basename, is_test_filename, stem};
use crate::git::GitRunner;
use crate::ignore_filter::IgnoreFilter;

fn import_pattern(target_stem: &str) -> String {
    format!(
        r#"(import|from|require)[^\n]*["'][^"']*{}[^"']*["']"#,
        regex::escape(target_stem)
    )
}

#[instrument(skip(git, ignore), fields(target = %target_relative))]
pub async fn detect(
    git: &GitRunner,
    target_relative: &str,
    ignore: &IgnoreFilter,
) -> Vec<String> {
    let target_basename = basename(target_relative);
    let target_is_test = is_test_filename(target_basename);
    let pattern = import_pattern(stem(target_relative));

    let raw = match git.grep_files(&pattern, None, false, false).await {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut out: Vec<String> = Vec::new();
    let mut seen = rustc_hash::FxHashSet::default();
    for line in raw.lines().filter(|l| !l.is_empty()) {
        let path = line.trim();
        if path == target_relative || basename(path) == target_basename {
            continue;
        }
        if ignore.is_ignored(path) {
            continue;
        }
        if target_is_test && is_test_filename(basename(path)) {
            continue;
        }
        if seen.insert(path.to_string()) {
            out.push(path.to_string());
        }
    }
    out
}
