//! Build-log summarisation.
//!
//! Reduces a deployment's log lines to level counts and a few error
//! excerpts, and picks the line most worth classifying when the deployment
//! record itself carries no error message.

use serde::Serialize;

use crate::domain::{LogLevel, LogLine};

/// Maximum error excerpts kept in a [`LogSummary`].
pub const MAX_ERROR_EXCERPTS: usize = 5;

/// Condensed view of a build log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogSummary {
    pub total_lines: usize,
    pub info_count: usize,
    pub warn_count: usize,
    pub error_count: usize,
    /// Message of the first `error`-level line.
    pub first_error: Option<String>,
    /// Up to [`MAX_ERROR_EXCERPTS`] error-level messages, in log order.
    pub error_excerpts: Vec<String>,
    /// First line of any level that reports a failure (`failed`, `error:`,
    /// `ERR!`), skipping zero-count status lines.
    pub first_failure_mention: Option<String>,
}

impl LogSummary {
    /// The text to classify: the first error-level line, else the first line
    /// that mentions an error or failure.
    pub fn best_error_text(&self) -> Option<&str> {
        self.first_error
            .as_deref()
            .or(self.first_failure_mention.as_deref())
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

/// Summarise `lines` in one pass.
pub fn summarize_logs(lines: &[LogLine]) -> LogSummary {
    let mut summary = LogSummary {
        total_lines: lines.len(),
        ..Default::default()
    };

    for line in lines {
        let message = line.message.trim();
        match line.level {
            LogLevel::Info => summary.info_count += 1,
            LogLevel::Warn => summary.warn_count += 1,
            LogLevel::Error => {
                summary.error_count += 1;
                if message.is_empty() {
                    continue;
                }
                if summary.first_error.is_none() {
                    summary.first_error = Some(message.to_string());
                }
                if summary.error_excerpts.len() < MAX_ERROR_EXCERPTS {
                    summary.error_excerpts.push(message.to_string());
                }
            }
        }

        if summary.first_failure_mention.is_none() && mentions_failure(message) {
            summary.first_failure_mention = Some(message.to_string());
        }
    }

    summary
}

/// Phrases that report an absence of failures.
const ZERO_COUNT_PHRASES: &[&str] = &["0 errors", "0 error(s)", "no errors", "without errors", "0 failed"];

/// Markers of an actual failure in a non-error-level line.
const FAILURE_MARKERS: &[&str] = &["failed", "error:", "err!"];

fn mentions_failure(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    if ZERO_COUNT_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }
    FAILURE_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn line(level: LogLevel, msg: &str) -> LogLine {
        LogLine::new(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(), level, msg)
    }

    #[test]
    fn test_empty_log() {
        let s = summarize_logs(&[]);
        assert_eq!(s, LogSummary::default());
        assert_eq!(s.best_error_text(), None);
        assert!(!s.has_errors());
    }

    #[test]
    fn test_counts_and_first_error() {
        let lines = vec![
            line(LogLevel::Info, "Installing dependencies"),
            line(LogLevel::Warn, "npm WARN deprecated left-pad"),
            line(LogLevel::Error, "npm ERR! ERESOLVE unable to resolve dependency tree"),
            line(LogLevel::Error, "npm ERR! peer dep missing"),
            line(LogLevel::Info, "Build failed"),
        ];
        let s = summarize_logs(&lines);
        assert_eq!(s.total_lines, 5);
        assert_eq!(s.info_count, 2);
        assert_eq!(s.warn_count, 1);
        assert_eq!(s.error_count, 2);
        assert_eq!(
            s.best_error_text(),
            Some("npm ERR! ERESOLVE unable to resolve dependency tree")
        );
        assert_eq!(s.error_excerpts.len(), 2);
    }

    #[test]
    fn test_falls_back_to_failure_mention() {
        let lines = vec![
            line(LogLevel::Info, "Starting build"),
            line(LogLevel::Info, "Command failed with exit code 1: npm run build"),
        ];
        let s = summarize_logs(&lines);
        assert!(!s.has_errors());
        assert_eq!(
            s.best_error_text(),
            Some("Command failed with exit code 1: npm run build")
        );
    }

    #[test]
    fn test_clean_status_lines_are_not_failures() {
        let lines = vec![
            line(LogLevel::Info, "Compiled with 0 errors"),
            line(LogLevel::Info, "Type check finished with no errors"),
            line(LogLevel::Info, "Loaded error-overlay plugin"),
            line(LogLevel::Info, "Tests: 0 failed, 12 passed"),
        ];
        let s = summarize_logs(&lines);
        assert_eq!(s.best_error_text(), None);
    }

    #[test]
    fn test_error_prefix_in_info_line_is_a_mention() {
        let lines = vec![
            line(LogLevel::Info, "Compiled with 0 errors"),
            line(LogLevel::Info, "Error: Cannot find module 'sharp'"),
        ];
        let s = summarize_logs(&lines);
        assert_eq!(s.best_error_text(), Some("Error: Cannot find module 'sharp'"));
    }

    #[test]
    fn test_excerpts_are_capped() {
        let lines: Vec<LogLine> = (0..12)
            .map(|i| line(LogLevel::Error, &format!("error {i}")))
            .collect();
        let s = summarize_logs(&lines);
        assert_eq!(s.error_count, 12);
        assert_eq!(s.error_excerpts.len(), MAX_ERROR_EXCERPTS);
        assert_eq!(s.error_excerpts[0], "error 0");
    }

    #[test]
    fn test_blank_error_lines_are_counted_but_not_excerpted() {
        let lines = vec![line(LogLevel::Error, "   "), line(LogLevel::Error, "real problem")];
        let s = summarize_logs(&lines);
        assert_eq!(s.error_count, 2);
        assert_eq!(s.first_error.as_deref(), Some("real problem"));
    }
}
