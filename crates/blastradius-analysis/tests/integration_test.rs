//! End-to-end tests against a real, disposable git repository: build one
//! with `git` CLI calls in a `TempDir`, then drive `analyze_file` and
//! `search_history` exactly as a host application would.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use blastradius_analysis::{analyze_file, search_history, HistoryQuery};

fn git(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(repo)
        .env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test Author")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("git must be on PATH to run these tests");
    assert!(status.success(), "git {args:?} failed");
}

fn write(repo: &Path, rel: &str, content: &str) {
    let path = repo.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["config", "user.name", "Test Author"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    dir
}

/// Two files that repeatedly change together in the same commits should
/// surface each other as co-change evidence, and the resulting risk
/// assessment should never panic on an empty-history target.
#[tokio::test]
async fn coupled_files_surface_as_coupling_evidence() {
    let dir = init_repo();
    let root = dir.path();

    write(root, "src/billing.ts", "export function charge() { return 1; }\n");
    write(root, "src/billing.test.ts", "import { charge } from './billing';\ntest('charges', () => charge());\n");
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "feat: add billing"]);

    for i in 0..4 {
        write(
            root,
            "src/billing.ts",
            &format!("export function charge() {{ return {i}; }}\n"),
        );
        write(
            root,
            "src/billing.test.ts",
            &format!("import {{ charge }} from './billing';\ntest('charges {i}', () => charge());\n"),
        );
        let message = format!("fix: adjust charge amount {i}");
        git(root, &["add", "."]);
        git(root, &["commit", "-q", "-m", &message]);
    }

    let target = root.join("src/billing.ts");
    let report = analyze_file(&target).await.expect("analysis should succeed");

    assert_eq!(report.target, "src/billing.ts");
    assert!(
        report.coupled_files.iter().any(|f| f.path.contains("billing.test.ts")),
        "expected billing.test.ts to be surfaced as coupled, got {:?}",
        report.coupled_files
    );
    assert!(report.volatility.commit_count > 0);
    assert!(report.risk.score <= 100);
}

/// A freshly added file with no commit history yet should trigger sibling
/// guidance rather than a volatility/coupling read (spec: zero-commit
/// target falls back to sibling analysis).
#[tokio::test]
async fn zero_history_file_falls_back_to_sibling_guidance() {
    let dir = init_repo();
    let root = dir.path();

    write(root, "src/orders.ts", "export function place() {}\n");
    write(root, "src/orders.test.ts", "test('places', () => {});\n");
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "feat: add orders"]);

    // New sibling file, never committed.
    write(root, "src/invoices.ts", "export function issue() {}\n");

    let report = analyze_file(&root.join("src/invoices.ts"))
        .await
        .expect("analysis should succeed even with zero history");

    assert_eq!(report.volatility.commit_count, 0);
    let guidance = report.sibling_guidance.expect("expected sibling guidance for a new file");
    assert!(guidance.test_file_expected, "a sibling test file exists, so one should be expected");
}

/// History search normalises an out-of-range start line to 1 rather than
/// returning an empty result (spec §8 boundary: start=0 -> 1).
#[tokio::test]
async fn history_search_normalises_zero_start_line() {
    let dir = init_repo();
    let root = dir.path();

    write(root, "src/config.ts", "export const A = 1;\nexport const B = 2;\n");
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "feat: add config"]);

    let target = root.join("src/config.ts");
    let request = HistoryQuery {
        query: None,
        path: Some("src/config.ts"),
        mode: None,
        limit: Some(10),
        start_line: Some(0),
        end_line: Some(2),
        since: None,
        until: None,
        author: None,
        commit_types: None,
        include_diff: false,
    };

    let entries = search_history(&target, request)
        .await
        .expect("line-range search should succeed with start_line normalised to 1");
    assert!(!entries.is_empty());
}

/// A line range with end before start yields no results rather than an
/// error (spec §8 boundary).
#[tokio::test]
async fn history_search_empty_when_end_before_start() {
    let dir = init_repo();
    let root = dir.path();

    write(root, "src/config.ts", "export const A = 1;\n");
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "feat: add config"]);

    let target = root.join("src/config.ts");
    let request = HistoryQuery {
        query: None,
        path: Some("src/config.ts"),
        mode: None,
        limit: Some(10),
        start_line: Some(5),
        end_line: Some(1),
        since: None,
        until: None,
        author: None,
        commit_types: None,
        include_diff: false,
    };

    let entries = search_history(&target, request).await.unwrap();
    assert!(entries.is_empty());
}
