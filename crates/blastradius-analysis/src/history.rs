//! History search: three cached modes (message, diff/pickaxe, line-range)
//! sharing one output shape (spec §4.8).

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::instrument;

use blastradius_core::{
    AnalysisError, CommitType, HistoryEntry, MatchType, RelevanceSnippet, SearchMode,
    SnippetChangeKind,
};

use crate::cache::{cache_key, Cache};
use crate::commitlog::parse_log_without_email;
use crate::context::AnalysisContext;
use crate::git::HistoryFilters;
use crate::limiter::bounded_map;

const DEFAULT_LIMIT: usize = 20;
const SNIPPET_CAP: usize = 5;
const SNIPPET_MAX_CHARS: usize = 500;
const SNIPPET_CONTEXT_LINES: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct HistoryQuery<'a> {
    pub query: Option<&'a str>,
    pub path: Option<&'a str>,
    pub mode: Option<SearchMode>,
    pub limit: Option<usize>,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub since: Option<&'a str>,
    pub until: Option<&'a str>,
    pub author: Option<&'a str>,
    pub commit_types: Option<&'a [CommitType]>,
    pub include_diff: bool,
}

#[instrument(skip(ctx, request), fields(target = ctx.target_relative.as_str()))]
pub async fn search(
    ctx: &AnalysisContext,
    request: HistoryQuery<'_>,
) -> Result<Vec<HistoryEntry>, AnalysisError> {
    let is_line_range = request.start_line.is_some() || request.end_line.is_some();

    if is_line_range && request.path.is_none() {
        return Err(AnalysisError::MissingArgument(
            "path is required for a line-range search".to_string(),
        ));
    }
    if !is_line_range && request.query.is_none() {
        return Err(AnalysisError::MissingArgument(
            "query is required unless a line range is supplied".to_string(),
        ));
    }

    let filters = HistoryFilters {
        since: request.since,
        until: request.until,
        author: request.author,
    };

    let cache_fingerprint = format!(
        "{:?}:{:?}:{:?}",
        request.since, request.until, request.author
    );

    let mut entries = if is_line_range {
        line_range_search(ctx, &request).await?
    } else {
        let mode = request.mode.unwrap_or(SearchMode::Message);
        let query = request.query.expect("checked above");
        let key = cache_key(&[
            "history",
            query,
            request.path.unwrap_or(""),
            &format!("{mode:?}"),
            "0,0",
            &cache_fingerprint,
        ]);
        if let Some(cached) = Cache::global().get::<Vec<HistoryEntry>>(&key) {
            cached
        } else {
            let found = mode_search(ctx, mode, query, &filters).await;
            Cache::global().insert(key, &found);
            found
        }
    };

    if let Some(types) = request.commit_types {
        let allowed: FxHashSet<CommitType> = types.iter().copied().collect();
        entries.retain(|e| allowed.contains(&e.commit_type));
    }

    entries.sort_by(|a, b| b.date.cmp(&a.date));
    let limit = request.limit.unwrap_or(DEFAULT_LIMIT);
    entries.truncate(limit);

    if request.include_diff {
        let query = request.query.map(str::to_string);
        attach_snippets(ctx, &mut entries, query.as_deref()).await;
    }

    Ok(entries)
}

async fn mode_search(
    ctx: &AnalysisContext,
    mode: SearchMode,
    query: &str,
    filters: &HistoryFilters<'_>,
) -> Vec<HistoryEntry> {
    match mode {
        SearchMode::Message => message_mode(ctx, query, filters).await,
        SearchMode::Diff => diff_mode(ctx, query, filters).await,
        SearchMode::Both => {
            let (mut message, diff) =
                tokio::join!(message_mode(ctx, query, filters), diff_mode(ctx, query, filters));
            let mut seen: FxHashSet<String> = message.iter().map(|e| e.hash.clone()).collect();
            for entry in diff {
                if seen.insert(entry.hash.clone()) {
                    message.push(entry);
                }
            }
            message
        }
    }
}

async fn message_mode(
    ctx: &AnalysisContext,
    query: &str,
    filters: &HistoryFilters<'_>,
) -> Vec<HistoryEntry> {
    let raw = match ctx.git.log_by_message(query, filters).await {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    build_entries(ctx, &raw, MatchType::Message).await
}

async fn diff_mode(
    ctx: &AnalysisContext,
    query: &str,
    filters: &HistoryFilters<'_>,
) -> Vec<HistoryEntry> {
    let raw = match ctx.git.log_by_pickaxe(query, filters).await {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    build_entries(ctx, &raw, MatchType::Diff).await
}

async fn line_range_search(
    ctx: &AnalysisContext,
    request: &HistoryQuery<'_>,
) -> Result<Vec<HistoryEntry>, AnalysisError> {
    let path = request.path.expect("checked by caller");
    let start = request.start_line.unwrap_or(0).max(1);
    let end = request.end_line.unwrap_or(start);
    if end < start {
        return Ok(Vec::new());
    }

    let key = cache_key(&[
        "history",
        request.query.unwrap_or(""),
        path,
        "line_range",
        &format!("{start},{end}"),
        "",
    ]);
    if let Some(cached) = Cache::global().get::<Vec<HistoryEntry>>(&key) {
        return Ok(filter_by_query(cached, request.query));
    }

    let raw = ctx
        .git
        .log_line_range(path, start, end)
        .await
        .map_err(|e| AnalysisError::Other(e.0))?;

    // `git log -L` interleaves diff content between commit-header lines;
    // only lines matching the `%H|%ai|%an|%s` shape parse successfully,
    // which is exactly how we discard the interleaved diff body.
    let entries = build_entries(ctx, &raw, MatchType::Diff).await;
    Cache::global().insert(key, &entries);
    Ok(filter_by_query(entries, request.query))
}

fn filter_by_query(entries: Vec<HistoryEntry>, query: Option<&str>) -> Vec<HistoryEntry> {
    match query {
        Some(q) => {
            let q_lower = q.to_lowercase();
            entries
                .into_iter()
                .filter(|e| e.subject.to_lowercase().contains(&q_lower))
                .collect()
        }
        None => entries,
    }
}

async fn build_entries(ctx: &AnalysisContext, raw: &str, match_type: MatchType) -> Vec<HistoryEntry> {
    let commits = parse_log_without_email(raw);
    let hashes: Vec<String> = commits.iter().map(|c| c.hash.clone()).collect();
    let git_c = ctx.git.clone();
    let file_lists = bounded_map(hashes, 5, move |hash| {
        let git = git_c.clone();
        async move {
            let names = git.show_name_only(&hash).await.unwrap_or_default();
            names
                .lines()
                .filter(|l| !l.is_empty())
                .take(5)
                .map(str::to_string)
                .collect::<Vec<_>>()
        }
    })
    .await;

    commits
        .into_iter()
        .zip(file_lists)
        .map(|(commit, files)| HistoryEntry {
            hash: commit.hash.chars().take(7).collect(),
            date: commit.date.format("%Y-%m-%d").to_string(),
            author: commit.author_name,
            subject: commit.subject.clone(),
            files,
            match_type,
            commit_type: classify_commit_type(&commit.subject),
            snippet: None,
        })
        .collect()
}

static BUGFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(fix|bugfix|hotfix)(\(|:| )").expect("valid regex"));
static FEATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(feat|feature|add)(\(|:| )").expect("valid regex"));
static REFACTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(refactor|chore:\s*refactor)(\(|:| )").expect("valid regex"));
static DOCS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(docs?)(\(|:| )").expect("valid regex"));
static TEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(test)(\(|:| )").expect("valid regex"));
static CHORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(chore|build|ci)(\(|:| )").expect("valid regex"));

/// Six regex families in precedence order (spec §4.8).
fn classify_commit_type(subject: &str) -> CommitType {
    if BUGFIX_RE.is_match(subject) {
        CommitType::Bugfix
    } else if FEATURE_RE.is_match(subject) {
        CommitType::Feature
    } else if REFACTOR_RE.is_match(subject) {
        CommitType::Refactor
    } else if DOCS_RE.is_match(subject) {
        CommitType::Docs
    } else if TEST_RE.is_match(subject) {
        CommitType::Test
    } else if CHORE_RE.is_match(subject) {
        CommitType::Chore
    } else {
        CommitType::Unknown
    }
}

async fn attach_snippets(ctx: &AnalysisContext, entries: &mut [HistoryEntry], query: Option<&str>) {
    let Some(query) = query else { return };
    let query_lower = query.to_lowercase();

    for entry in entries.iter_mut().take(SNIPPET_CAP) {
        let raw = ctx
            .git
            .show_diff(&entry.hash, None)
            .await
            .unwrap_or_default();
        entry.snippet = extract_snippet(&raw, &query_lower);
    }
}

fn extract_snippet(diff: &str, query_lower: &str) -> Option<RelevanceSnippet> {
    let lines: Vec<&str> = diff.lines().collect();
    let anchor = lines
        .iter()
        .position(|l| l.to_lowercase().contains(query_lower))?;

    let start = anchor.saturating_sub(SNIPPET_CONTEXT_LINES);
    let end = (anchor + SNIPPET_CONTEXT_LINES + 1).min(lines.len());
    let window = &lines[start..end];

    let added = window
        .iter()
        .any(|l| l.starts_with('+') && l.to_lowercase().contains(query_lower));
    let removed = window
        .iter()
        .any(|l| l.starts_with('-') && l.to_lowercase().contains(query_lower));

    let change_kind = if added && removed {
        SnippetChangeKind::Modified
    } else if added {
        SnippetChangeKind::Added
    } else if removed {
        SnippetChangeKind::Removed
    } else {
        SnippetChangeKind::Modified
    };

    let mut text = window.join("\n");
    text.truncate(SNIPPET_MAX_CHARS);

    Some(RelevanceSnippet {
        text,
        change_kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_type_precedence_matches_fix_before_feature() {
        assert_eq!(classify_commit_type("fix: null pointer"), CommitType::Bugfix);
        assert_eq!(classify_commit_type("feat: add export"), CommitType::Feature);
        assert_eq!(classify_commit_type("chore: bump deps"), CommitType::Chore);
        assert_eq!(classify_commit_type("a totally unrelated subject"), CommitType::Unknown);
    }

    #[test]
    fn snippet_extraction_labels_added_line() {
        let diff = "context\n+added query line\ncontext\ncontext\ncontext\ncontext\ncontext";
        let snippet = extract_snippet(diff, "query").unwrap();
        assert_eq!(snippet.change_kind, SnippetChangeKind::Added);
        assert!(snippet.text.contains("added query line"));
    }
}
