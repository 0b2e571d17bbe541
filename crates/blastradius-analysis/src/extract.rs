//! Regex-based extraction helpers shared by several coupling engines
//! (spec §4.3). The core performs no AST parsing (spec §1 Non-goals); every
//! extraction here is a regex family over raw file content, the same way
//! the teacher's structural detectors extract candidates with
//! `Regex::new` over source text rather than a parser
//! (`drift-analysis/src/structural/crypto/detector.rs`,
//! `.../dna/extractors/variant_handling.rs`).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

pub fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

pub fn stem(path: &str) -> &str {
    Path::new(path)
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

static TEST_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\.test\.|\.spec\.|_test\.|^test_|-test\.|-spec\.)").expect("valid regex")
});

/// True when `basename` itself looks like a test file (spec §4.3.5).
pub fn is_test_filename(name: &str) -> bool {
    TEST_SUFFIX.is_match(name)
}

// --- Engine 6: documentation — exported identifiers -------------------

static DECL_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+(?:default\s+)?(?:const|let|var|function|class|interface|type|enum)\s+(\w+)")
        .expect("valid regex")
});
static NAMED_EXPORT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"export\s*\{([^}]+)\}").expect("valid regex"));
static DEFAULT_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+default\s+function\s+(\w+)").expect("valid regex")
});
static RE_EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"export\s+\*\s+from\s+["']([^"']+)["']"#).expect("valid regex"));

const GENERIC_IDENTIFIERS: &[&str] = &["default", "module", "exports", "index"];

/// Exported identifiers via four regex families, generic names and very
/// short identifiers dropped, top ten kept (spec §4.3.2).
pub fn extract_exported_identifiers(content: &str) -> Vec<String> {
    let mut names = Vec::new();
    for caps in DECL_EXPORT.captures_iter(content) {
        names.push(caps[1].to_string());
    }
    for caps in NAMED_EXPORT_BLOCK.captures_iter(content) {
        for part in caps[1].split(',') {
            let name = part.split("as").next().unwrap_or(part).trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }
    for caps in DEFAULT_FUNCTION.captures_iter(content) {
        names.push(caps[1].to_string());
    }
    for caps in RE_EXPORT.captures_iter(content) {
        names.push(caps[1].to_string());
    }

    dedup_filtered(names, |n| {
        n.len() > 2 && !GENERIC_IDENTIFIERS.contains(&n.to_lowercase().as_str())
    })
    .into_iter()
    .take(10)
    .collect()
}

// --- Engine 7: shared types --------------------------------------------

static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:interface|type|enum)\s+(\w+)").expect("valid regex")
});

const GENERIC_TYPE_NAMES: &[&str] = &[
    "props", "state", "options", "config", "data", "result", "response", "request",
];

/// Type/interface/enum declarations, generic names dropped, top five kept
/// (spec §4.3.3).
pub fn extract_type_names(content: &str) -> Vec<String> {
    let names: Vec<String> = TYPE_DECL
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect();
    dedup_filtered(names, |n| !GENERIC_TYPE_NAMES.contains(&n.to_lowercase().as_str()))
        .into_iter()
        .take(5)
        .collect()
}

// --- Engine 8: content literals -----------------------------------------

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"'\n]{15,80})["']"#).expect("valid regex"));
static KEBAB_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)+$").expect("valid regex"));
static DIGITS_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static LOCAL_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://(localhost|127\.0\.0\.1)").expect("valid regex"));
static SIMPLE_RELATIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.{1,2}/[\w./-]+$").expect("valid regex"));
static ERROR_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(error|failed|invalid|unauthorized|forbidden|not found|exception)\b")
        .expect("valid regex")
});
static ENDPOINT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/api/|^/v\d+/").expect("valid regex"));
static TEMPLATE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[sd]|\{\{|\$\{").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralVocabulary {
    Error,
    Endpoint,
    Content,
}

impl LiteralVocabulary {
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralVocabulary::Error => "error",
            LiteralVocabulary::Endpoint => "endpoint",
            LiteralVocabulary::Content => "content",
        }
    }
}

/// String literals 15-80 chars, filtered down to those that look like
/// error messages, API path prefixes, template/printf markers, or long
/// descriptive strings (spec §4.3.4). Kebab-case-only, digit-only,
/// whitespace-only, local URLs, and simple relative paths are dropped as
/// likely CSS classes or import paths.
pub fn extract_content_literals(content: &str) -> Vec<(String, LiteralVocabulary)> {
    let mut out = Vec::new();
    for caps in STRING_LITERAL.captures_iter(content) {
        let s = caps[1].trim();
        if s.is_empty()
            || LOCAL_URL.is_match(s)
            || KEBAB_CASE.is_match(s)
            || DIGITS_ONLY.is_match(s)
            || SIMPLE_RELATIVE_PATH.is_match(s)
        {
            continue;
        }
        let vocab = if ERROR_VOCAB.is_match(s) {
            LiteralVocabulary::Error
        } else if ENDPOINT_PREFIX.is_match(s) {
            LiteralVocabulary::Endpoint
        } else if TEMPLATE_MARKER.is_match(s) || s.len() >= 30 {
            LiteralVocabulary::Content
        } else {
            continue;
        };
        out.push((s.to_string(), vocab));
    }
    out.dedup_by(|a, b| a.0 == b.0);
    out.truncate(5);
    out
}

// --- Engine 10: environment variables -----------------------------------

static ENV_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+)\b").expect("valid regex"));

const PROTOCOL_PREFIXES: &[&str] = &[
    "HTTP_",
    "HTML_",
    "CSS_",
    "JSON_",
    "XML_",
    "UTF_",
    "CONTENT_TYPE",
    "STATUS_",
];
const KNOWN_ENV_PREFIXES: &[&str] = &[
    "API_",
    "DATABASE_",
    "DB_",
    "STRIPE_",
    "AUTH_",
    "JWT_",
    "AWS_",
    "GOOGLE_",
    "GITHUB_",
    "REDIS_",
    "MONGO_",
    "POSTGRES_",
    "MYSQL_",
    "SECRET_",
    "PRIVATE_",
    "PUBLIC_",
    "NEXT_",
    "VITE_",
    "REACT_APP_",
    "VUE_APP_",
];
const KNOWN_ENV_SUFFIXES: &[&str] = &[
    "_KEY", "_SECRET", "_TOKEN", "_URL", "_URI", "_HOST", "_PORT", "_PASSWORD",
];

/// `ALL_CAPS_WITH_UNDERSCORE` tokens that look like environment variables
/// (spec §4.3.6).
pub fn extract_env_vars(content: &str) -> Vec<String> {
    let names: Vec<String> = ENV_TOKEN
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .filter(|name| {
            if PROTOCOL_PREFIXES.iter().any(|p| name.starts_with(p)) {
                return false;
            }
            KNOWN_ENV_PREFIXES.iter().any(|p| name.starts_with(p))
                || KNOWN_ENV_SUFFIXES.iter().any(|s| name.ends_with(s))
        })
        .collect();
    dedup_filtered(names, |_| true).into_iter().take(10).collect()
}

// --- Engine 11: schema ----------------------------------------------------

static SCHEMA_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(create|alter)\s+table|@(entity|table|column)|mongoose\.schema|sequelize\.define|db\.column|sqlalchemy")
        .expect("valid regex")
});

pub fn has_schema_markers(content: &str) -> bool {
    SCHEMA_MARKERS.is_match(content)
}

static SCHEMA_NAME_FAMILIES: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)create\s+table\s+(?:if\s+not\s+exists\s+)?`?(\w+)`?").expect("valid regex"),
        Regex::new(r"(?i)alter\s+table\s+`?(\w+)`?").expect("valid regex"),
        Regex::new(r#"@(?:Entity|Table)\(\s*["']?(\w+)["']?"#).expect("valid regex"),
        Regex::new(r"class\s+(\w+)\s*(?:extends\s+Model|\(models\.Model\))").expect("valid regex"),
        Regex::new(r#"mongoose\.Schema\(.*?\)\s*;?\s*(?:const|let|var)?\s*(\w+)"#)
            .expect("valid regex"),
    ]
});

const GENERIC_SCHEMA_NAMES: &[&str] = &["id", "data", "item", "entity", "model", "base", "abstract"];

pub fn extract_schema_names(content: &str) -> Vec<String> {
    let mut names = Vec::new();
    for re in SCHEMA_NAME_FAMILIES.iter() {
        for caps in re.captures_iter(content) {
            if let Some(m) = caps.get(1) {
                names.push(m.as_str().to_string());
            }
        }
    }
    dedup_filtered(names, |n| !GENERIC_SCHEMA_NAMES.contains(&n.to_lowercase().as_str()))
}

// --- Engine 12: API endpoints ---------------------------------------------

static ROUTE_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(get|post|put|patch|delete)\s*\(|@(Get|Post|Put|Patch|Delete)Mapping|router\.(get|post|put|patch|delete)|app\.(get|post|put|patch|delete)|export\s+(?:async\s+)?function\s+(GET|POST|PUT|PATCH|DELETE)\b")
        .expect("valid regex")
});

pub fn defines_routes(content: &str) -> bool {
    ROUTE_DEFINITION.is_match(content)
}

static ENDPOINT_PATH_FAMILIES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"\.(?:get|post|put|patch|delete)\s*\(\s*["'](/[\w/:.-]*)["']"#)
            .expect("valid regex"),
        Regex::new(r#"@(?:Get|Post|Put|Patch|Delete)Mapping\(\s*["'](/[\w/:.-]*)["']"#)
            .expect("valid regex"),
        Regex::new(r#"router\.[a-z]+\s*\(\s*["'](/[\w/:.-]*)["']"#).expect("valid regex"),
    ]
});

/// Strip dynamic segments (`:name`) and trailing slashes; discard very
/// short paths (spec §4.3.8).
pub fn extract_endpoints(content: &str) -> Vec<String> {
    static DYNAMIC_SEGMENT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r":\w+").expect("valid regex"));

    let mut paths = Vec::new();
    for re in ENDPOINT_PATH_FAMILIES.iter() {
        for caps in re.captures_iter(content) {
            let raw = &caps[1];
            let stripped = DYNAMIC_SEGMENT.replace_all(raw, "");
            let trimmed = stripped.trim_end_matches('/');
            if trimmed.len() > 2 {
                paths.push(trimmed.to_string());
            }
        }
    }
    dedup_filtered(paths, |_| true).into_iter().take(10).collect()
}

// --- Engine 9: test naming patterns ---------------------------------------

/// Six naming patterns derived from a file's stem, used to grep for that
/// file's test counterpart(s) (spec §4.3.5).
pub fn test_naming_patterns(file_stem: &str) -> Vec<String> {
    vec![
        format!("{file_stem}.test."),
        format!("{file_stem}.spec."),
        format!("{file_stem}_test."),
        format!("test_{file_stem}"),
        format!("{file_stem}-test."),
        format!("{file_stem}-spec."),
    ]
}

// --- Engine 13: transitive re-export --------------------------------------

pub fn barrel_re_export_pattern(basename_no_ext: &str) -> String {
    format!(r"export.*from.*{}", regex::escape(basename_no_ext))
}

// --- shared helpers --------------------------------------------------------

fn dedup_filtered(names: Vec<String>, keep: impl Fn(&str) -> bool) -> Vec<String> {
    let mut seen = rustc_hash::FxHashSet::default();
    let mut out = Vec::new();
    for name in names {
        if keep(&name) && seen.insert(name.clone()) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_test_filenames() {
        assert!(is_test_filename("user.test.ts"));
        assert!(is_test_filename("user_test.py"));
        assert!(is_test_filename("test_user.py"));
        assert!(!is_test_filename("user.ts"));
    }

    #[test]
    fn exported_identifiers_drop_generic_and_short_names() {
        let content = "export const foo = 1;\nexport default function index() {}\nexport const ab = 2;";
        let names = extract_exported_identifiers(content);
        assert!(names.contains(&"foo".to_string()));
        assert!(!names.contains(&"index".to_string()));
        assert!(!names.contains(&"ab".to_string()));
    }

    #[test]
    fn type_names_drop_generics() {
        let content = "interface Props {}\ninterface UserAccount {}\ntype Config = {};";
        let names = extract_type_names(content);
        assert_eq!(names, vec!["UserAccount".to_string()]);
    }

    #[test]
    fn env_vars_exclude_protocol_prefixes_and_include_known_families() {
        let content = "const a = process.env.API_SECRET_KEY;\nconst b = HTTP_TIMEOUT_MS;";
        let vars = extract_env_vars(content);
        assert!(vars.contains(&"API_SECRET_KEY".to_string()));
        assert!(!vars.iter().any(|v| v.starts_with("HTTP_")));
    }

    #[test]
    fn endpoints_strip_dynamic_segments_and_trailing_slash() {
        let content = r#"router.get('/users/:id/', handler);"#;
        let endpoints = extract_endpoints(content);
        assert_eq!(endpoints, vec!["/users".to_string()]);
    }

    #[test]
    fn schema_gate_requires_markers() {
        assert!(has_schema_markers("CREATE TABLE users (id INT);"));
        assert!(!has_schema_markers("const x = 1;"));
    }
}
