// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Translation of mypy report lines into LSP diagnostics.
//!
//! mypy prints one finding per line in the form
//! `path[:line[:column]] severity: message`. Line and column are 1-based and
//! either may be missing. Anything else on stdout (summaries, daemon status
//! chatter) is ignored.

use lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::document::Document;

/// Value of `Diagnostic::source` for everything this crate produces.
pub const SOURCE: &str = "mypy";

/// File name mypy reports for code passed with `-c`, which has no path to
/// compare against.
const STRING_SOURCE: &str = "<string>";

#[allow(clippy::unwrap_used, reason = "pattern is a literal and known to compile")]
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:[a-zA-Z]:)?[^:]+):(?:(\d+):)?(?:(\d+):)? (\w+): (.*)").unwrap()
});

/// Parses one line of mypy output.
///
/// Returns `None` for lines that are not findings, and for findings about a
/// file other than `document` (mypy reports on followed imports too).
/// When a document is given, the end of the range is widened to cover the
/// identifier at the reported column.
pub fn parse_line(line: &str, document: Option<&Document>) -> Option<Diagnostic> {
    let caps = LINE_PATTERN.captures(line)?;
    let file_path = caps.get(1)?.as_str();

    if file_path != STRING_SOURCE
        && let Some(doc) = document
        && !doc.path().to_string_lossy().ends_with(file_path)
    {
        warn!(
            "discarding result for {} against {}",
            file_path,
            doc.path().display()
        );
        return None;
    }

    let line_no = one_based(caps.get(2).map(|m| m.as_str()))?;
    let column = one_based(caps.get(3).map(|m| m.as_str()))?;

    let severity = if &caps[4] == "error" {
        DiagnosticSeverity::ERROR
    } else {
        DiagnosticSeverity::WARNING
    };

    let start = Position::new(line_no, column);
    let mut end = Position::new(line_no, column.saturating_add(1));

    if let Some(doc) = document {
        let word = doc.word_at_position(start);
        if !word.is_empty() {
            let len = u32::try_from(word.chars().count()).unwrap_or(u32::MAX);
            end.character = column.saturating_add(len);
        }
    }

    Some(Diagnostic {
        range: Range::new(start, end),
        severity: Some(severity),
        source: Some(SOURCE.to_string()),
        message: caps[5].to_string(),
        ..Default::default()
    })
}

/// Parses every line of a report, keeping findings in output order.
pub fn parse_report(report: &str, document: Option<&Document>) -> Vec<Diagnostic> {
    report
        .lines()
        .filter_map(|line| {
            debug!("parsing: line = {:?}", line);
            parse_line(line, document)
        })
        .collect()
}

/// Converts an optional 1-based number to 0-based, treating a missing value
/// as 1. Numbers that overflow `u32` reject the line.
fn one_based(raw: Option<&str>) -> Option<u32> {
    match raw {
        None => Some(0),
        Some(digits) => digits.parse::<u32>().ok().map(|n| n.saturating_sub(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_LINE: &str = r#"test_plugin.py:279:8: error: "Request" has no attribute "id""#;

    fn range(diag: &Diagnostic) -> ((u32, u32), (u32, u32)) {
        (
            (diag.range.start.line, diag.range.start.character),
            (diag.range.end.line, diag.range.end.character),
        )
    }

    #[test]
    fn test_parse_full_line() {
        let diag = parse_line("foo.py:10:5: error: Name 'x' is undefined", None).unwrap();
        assert_eq!(range(&diag), ((9, 4), (9, 5)));
        assert_eq!(diag.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diag.message, "Name 'x' is undefined");
        assert_eq!(diag.source.as_deref(), Some("mypy"));
    }

    #[test]
    fn test_parse_line_without_column() {
        let line = r#"test_plugin.py:279: error: "Request" has no attribute "id""#;
        let diag = parse_line(line, None).unwrap();
        assert_eq!(range(&diag), ((278, 0), (278, 1)));
        assert_eq!(diag.message, r#""Request" has no attribute "id""#);
    }

    #[test]
    fn test_parse_line_without_line() {
        let line = r#"test_plugin.py: error: "Request" has no attribute "id""#;
        let diag = parse_line(line, None).unwrap();
        assert_eq!(range(&diag), ((0, 0), (0, 1)));
    }

    #[test]
    fn test_non_error_severities_are_warnings() {
        for severity in ["note", "warning", "Error", "ERROR", "info"] {
            let line = format!("foo.py:1:1: {severity}: something");
            let diag = parse_line(&line, None).unwrap();
            assert_eq!(
                diag.severity,
                Some(DiagnosticSeverity::WARNING),
                "severity word {severity}"
            );
        }
    }

    #[test]
    fn test_windows_drive_letter_path() {
        let diag = parse_line(r"C:\proj\foo.py:3:2: error: boom", None).unwrap();
        assert_eq!(range(&diag), ((2, 1), (2, 2)));
        assert_eq!(diag.message, "boom");
    }

    #[test]
    fn test_noise_lines_are_ignored() {
        assert!(parse_line("Success: no issues found in 1 source file", None).is_none());
        assert!(parse_line("Found 3 errors in 1 file (checked 1 source file)", None).is_none());
        assert!(parse_line("Daemon started", None).is_none());
        assert!(parse_line("", None).is_none());
    }

    #[test]
    fn test_line_zero_saturates() {
        let diag = parse_line("foo.py:0:0: error: odd", None).unwrap();
        assert_eq!(range(&diag), ((0, 0), (0, 1)));
    }

    #[test]
    fn test_overflowing_line_number_is_rejected() {
        assert!(parse_line("foo.py:99999999999:1: error: odd", None).is_none());
    }

    #[test]
    fn test_other_file_is_discarded() {
        let doc = Document::new("/proj/a.py", "import b\n");
        assert!(parse_line("/proj/b.py:1: note: imported", Some(&doc)).is_none());
        assert!(parse_line("/proj/b.py:1:1: error: broken", Some(&doc)).is_none());
    }

    #[test]
    fn test_relative_path_matching_suffix_is_kept() {
        let doc = Document::new("/proj/pkg/a.py", "x = 1\n");
        assert!(parse_line("pkg/a.py:1:1: error: bad", Some(&doc)).is_some());
    }

    #[test]
    fn test_string_source_bypasses_path_check() {
        let doc = Document::new("/proj/a.py", "x = 1\n");
        let diag = parse_line("<string>:1:1: error: bad", Some(&doc)).unwrap();
        assert_eq!(diag.message, "bad");
    }

    #[test]
    fn test_end_widened_to_word() {
        let mut source = "\n".repeat(278);
        source.push_str("result.my_var = 1\n");
        let doc = Document::new("/proj/test_plugin.py", source);

        let diag = parse_line(FULL_LINE, Some(&doc)).unwrap();
        assert_eq!(range(&diag), ((278, 7), (278, 13)));
    }

    #[test]
    fn test_end_not_widened_without_word() {
        let mut source = "\n".repeat(278);
        source.push_str("result.(    )\n");
        let doc = Document::new("/proj/test_plugin.py", source);

        let diag = parse_line(FULL_LINE, Some(&doc)).unwrap();
        assert_eq!(range(&diag), ((278, 7), (278, 8)));
    }

    #[test]
    fn test_parse_report_keeps_order_and_drops_noise() {
        let doc = Document::new("/proj/a.py", "");
        let report = "\
/proj/a.py:2:1: error: second
/proj/b.py:1:1: error: elsewhere
/proj/a.py:1:1: note: first
Found 2 errors in 2 files (checked 1 source file)
";
        let diags = parse_report(report, Some(&doc));
        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["second", "first"]);
    }
}
