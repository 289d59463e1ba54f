//! Occurrence counting over decoded logs.
//!
//! Matches are non-overlapping and counted left to right, so `"aa"` occurs
//! twice in `"aaaa"` and once in `"aaa"`. An empty needle matches nothing.

use chatlog_core::{LineView, Log};

/// Which part of each line a search looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
    /// Message text only
    #[default]
    Message,
    /// Author name and message text, searched separately
    Line,
}

/// Count non-overlapping occurrences of `needle` in `haystack`
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

fn count_in_line(line: &LineView<'_>, needle: &str, scope: SearchScope) -> usize {
    let in_message = count_occurrences(line.message(), needle);
    match scope {
        SearchScope::Message => in_message,
        SearchScope::Line => in_message + count_occurrences(line.name(), needle),
    }
}

/// Count occurrences of `needle` across every line of `log`
pub fn count_in_log(log: &Log, needle: &str, scope: SearchScope) -> usize {
    log.lines()
        .map(|line| count_in_line(&line, needle, scope))
        .sum()
}

/// Count occurrences of `needle` across several logs
pub fn count_in_logs<'a>(
    logs: impl IntoIterator<Item = &'a Log>,
    needle: &str,
    scope: SearchScope,
) -> usize {
    logs.into_iter()
        .map(|log| count_in_log(log, needle, scope))
        .sum()
}
