//! Parsing for the `%H|%ai|%an|%ae|%s`-shaped lines every engine asks
//! `git log`/`git show` to emit (spec §4.4, §4.8). Kept as one shared
//! parser so every caller agrees on the same date format and the same
//! tolerance for a trailing empty line.

use chrono::{DateTime, FixedOffset};

pub const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub hash: String,
    pub date: DateTime<FixedOffset>,
    pub author_name: String,
    pub author_email: Option<String>,
    pub subject: String,
}

/// Parse a `%H|%ai|%an|%ae|%s` line (used by the volatility engine and
/// engine 1's co-change scan).
pub fn parse_with_email(line: &str) -> Option<CommitRecord> {
    let mut parts = line.splitn(5, '|');
    let hash = parts.next()?.to_string();
    let date = DateTime::parse_from_str(parts.next()?, GIT_DATE_FORMAT).ok()?;
    let author_name = parts.next()?.to_string();
    let author_email = parts.next()?.to_string();
    let subject = parts.next().unwrap_or("").to_string();
    Some(CommitRecord {
        hash,
        date,
        author_name,
        author_email: Some(author_email),
        subject,
    })
}

/// Parse a `%H|%ai|%an|%s` line (used by history search).
pub fn parse_without_email(line: &str) -> Option<CommitRecord> {
    let mut parts = line.splitn(4, '|');
    let hash = parts.next()?.to_string();
    let date = DateTime::parse_from_str(parts.next()?, GIT_DATE_FORMAT).ok()?;
    let author_name = parts.next()?.to_string();
    let subject = parts.next().unwrap_or("").to_string();
    Some(CommitRecord {
        hash,
        date,
        author_name,
        author_email: None,
        subject,
    })
}

pub fn parse_log_with_email(raw: &str) -> Vec<CommitRecord> {
    raw.lines().filter(|l| !l.is_empty()).filter_map(parse_with_email).collect()
}

pub fn parse_log_without_email(raw: &str) -> Vec<CommitRecord> {
    raw.lines().filter(|l| !l.is_empty()).filter_map(parse_without_email).collect()
}

/// Age in whole days relative to `now`, never negative.
pub fn age_in_days(commit_date: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> i64 {
    (now - commit_date).num_days().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_five_field_line() {
        let line = "abc123|2024-01-15 10:23:45 +0000|Jane Doe|jane@example.com|fix: race condition";
        let rec = parse_with_email(line).unwrap();
        assert_eq!(rec.hash, "abc123");
        assert_eq!(rec.author_name, "Jane Doe");
        assert_eq!(rec.author_email.as_deref(), Some("jane@example.com"));
        assert_eq!(rec.subject, "fix: race condition");
    }

    #[test]
    fn parses_four_field_line() {
        let line = "abc123|2024-01-15 10:23:45 +0000|Jane Doe|fix: race condition";
        let rec = parse_without_email(line).unwrap();
        assert_eq!(rec.hash, "abc123");
        assert!(rec.author_email.is_none());
    }

    #[test]
    fn malformed_line_is_skipped() {
        assert!(parse_with_email("not a commit line").is_none());
    }
}
