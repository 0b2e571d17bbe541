//! Errors that can surface from a request to the analysis core.
//!
//! Only input errors and environment errors ever reach a caller (see
//! spec §7); engine errors and configuration errors are absorbed inside the
//! engine or the config loader and never construct one of these variants.

/// Errors reportable to a caller of `analyze_file` or `search_history`.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The supplied path was not absolute, did not exist, or otherwise
    /// failed basic validation before any engine ran.
    #[error("{0}")]
    InputError(String),

    /// The target path resolved fine but is not inside a version-controlled
    /// repository. Fatal for the whole request.
    #[error("this operation requires a git repository")]
    NotARepository,

    /// A history search was given a line range with `start > end`.
    #[error("invalid line range: start {start} is after end {end}")]
    InvalidLineRange { start: u32, end: u32 },

    /// A history search was missing a required query (non-line-range mode)
    /// or a required path (line-range mode).
    #[error("{0}")]
    MissingArgument(String),

    /// Any other failure that escaped an engine boundary. This should be
    /// rare: engines are specified to swallow their own errors, so this
    /// variant exists for failures in shared substrate (e.g. the cache or
    /// the git subprocess handle itself could not be constructed).
    #[error("analysis error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_error_messages_are_prefixed() {
        let err = AnalysisError::Other("boom".into());
        assert_eq!(err.to_string(), "analysis error: boom");
    }

    #[test]
    fn invalid_line_range_reports_both_bounds() {
        let err = AnalysisError::InvalidLineRange { start: 50, end: 10 };
        assert!(err.to_string().contains("50"));
        assert!(err.to_string().contains("10"));
    }
}
