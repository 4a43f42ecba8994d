//! Splits a challenge code into blank-line-delimited groups of trimmed lines.
//!
//! Rule lines (`<hr>` in the current dialect, `---` in the legacy one) carry no
//! data and are dropped; a group made only of rules disappears entirely.

use std::iter::Enumerate;
use std::str::Lines;

pub const RULE: &str = "<hr>";
pub const LEGACY_RULE: &str = "---";

/// One trimmed, non-blank line and its 1-based position in the comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub number: usize,
    pub text: &'a str,
}

pub type Group<'a> = Vec<Line<'a>>;

pub fn is_rule(line: &str) -> bool {
    line == RULE || line == LEGACY_RULE
}

/// Lazy iterator over the groups of a comment. Cloning restarts from the same point.
#[derive(Debug, Clone)]
pub struct Groups<'a> {
    lines: Enumerate<Lines<'a>>,
}

/// Groups of the whole text.
pub fn groups(text: &str) -> Groups<'_> {
    groups_from(text, 0)
}

/// Groups starting at the 0-based line index `skip`; line numbers stay absolute.
pub fn groups_from(text: &str, skip: usize) -> Groups<'_> {
    let mut lines = text.lines().enumerate();
    if skip > 0 {
        lines.nth(skip - 1);
    }
    Groups { lines }
}

impl<'a> Iterator for Groups<'a> {
    type Item = Group<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut group = Vec::new();
        for (idx, raw) in self.lines.by_ref() {
            let text = raw.trim();
            if text.is_empty() {
                if group.is_empty() {
                    continue;
                }
                return Some(group);
            }
            if is_rule(text) {
                continue;
            }
            group.push(Line { number: idx + 1, text });
        }
        if group.is_empty() { None } else { Some(group) }
    }
}

/// Text of a slice of lines, newline-joined.
pub fn join(lines: &[Line<'_>]) -> String {
    lines.iter().map(|l| l.text).collect::<Vec<_>>().join("\n")
}
