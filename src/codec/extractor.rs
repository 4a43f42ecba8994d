//! Requirement field extraction.
//!
//! A group is cut into entries first: a requirement line plus the lines that
//! belong to it, or a run of free text with no requirement before it. Each
//! requirement entry is then read with one of two grammars, picked once per
//! group from its first marked requirement line:
//!
//! - legacy: `01) [O] Start: <date> Finish: <date> __text__ [Title](link) extra`,
//!   one requirement per line, continuation lines follow in the same group;
//! - current: `01) [O] __text__`, then `[Title](link) // extra`, then
//!   `Start: <date> Finish: <date>`, then continuation lines; one group each.
//!
//! Raw-edit requirements never reach the grammars; callers decide that from
//! the requirement definition before calling [`extract`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::codec::classifier::ModeTracker;
use crate::codec::dates;
use crate::codec::tokenizer::Line;
use crate::domain::{Completion, LinkedItem, Mode, ANILIST_HOST};
use crate::error::ParseError;

pub const ORDINAL_EXPECTED: &str = "requirement number followed by '.' or ')'";

/// Lines of a current-dialect entry before its continuation.
const CURRENT_ENTRY_LINES: usize = 3;

static ENTRY_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^B?\d").expect("valid entry regex"));

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^B?\d+[.)]").expect("valid numbered line regex"));

static MARKED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^B?\d+[.)]\s*\[[^\]]?\]").expect("valid marked requirement regex"));

static ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<bonus>B)?(?P<number>\d+)[.)]").expect("valid ordinal regex"));

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[(?P<mark>[^\]]?)\]").expect("valid marker regex"));

static LEGACY_DATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Start:\s*(?P<start>\S+)\s+Finish:\s*(?P<finish>\S+)").expect("valid legacy dates regex")
});

static LEGACY_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"__(?P<text>.*?)__\s*\[(?P<title>.*?)\]\((?P<link>{}/anime/\d+/?)\)(?P<rest>.*)$",
        regex::escape(ANILIST_HOST)
    ))
    .expect("valid legacy tail regex")
});

static LINK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\[(?P<title>.*?)\]\((?P<link>{}/anime/\d+/?)\)(?P<rest>.*)$",
        regex::escape(ANILIST_HOST)
    ))
    .expect("valid link line regex")
});

static DATES_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Start:\s*(?P<start>\S+)\s+Finish:\s*(?P<finish>\S+)$").expect("valid dates line regex")
});

static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^__(?P<text>.*)__$").expect("valid emphasis regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Legacy,
    Current,
    /// Free text with no requirement before it in its group.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    pub kind: EntryKind,
    pub mode: Mode,
    pub lines: Vec<Line<'a>>,
}

impl<'a> Entry<'a> {
    pub fn head(&self) -> Line<'a> {
        self.lines[0]
    }

    /// Lines after the grammar's fixed part.
    pub fn continuation(&self) -> &[Line<'a>] {
        let fixed = match self.kind {
            EntryKind::Legacy => 1,
            EntryKind::Current => CURRENT_ENTRY_LINES,
            EntryKind::Text => self.lines.len(),
        };
        &self.lines[fixed.min(self.lines.len())..]
    }
}

/// Loose test for the first line of an entry; unnumbered raw-edit lines pass it.
pub fn is_entry(line: &str) -> bool {
    ENTRY_START.is_match(line)
}

/// A line carrying a requirement number; inside a legacy group it always opens a new entry.
pub fn is_numbered(line: &str) -> bool {
    NUMBERED.is_match(line)
}

/// Grammar shared by every requirement entry of a group.
///
/// Decided by the first line with a number and a completion marker. A group
/// without one (raw-edit lines only) is read line by line.
fn group_grammar(group: &[Line<'_>]) -> EntryKind {
    match group.iter().find(|l| MARKED.is_match(l.text)) {
        Some(line) if !LEGACY_DATES.is_match(line.text) => EntryKind::Current,
        _ => EntryKind::Legacy,
    }
}

/// Cut a group into entries, consuming section headers into `modes`.
pub fn split_entries<'a>(group: &[Line<'a>], modes: &mut ModeTracker) -> Vec<Entry<'a>> {
    let grammar = group_grammar(group);
    let mut entries: Vec<Entry<'a>> = Vec::new();
    let mut open = false;

    for &line in group {
        if modes.observe(line.text) {
            open = false;
            continue;
        }
        if open {
            if let Some(last) = entries.last_mut() {
                let continues = match last.kind {
                    EntryKind::Current => true,
                    EntryKind::Legacy | EntryKind::Text => !is_numbered(line.text),
                };
                if continues {
                    last.lines.push(line);
                    continue;
                }
            }
        }
        let kind = if is_entry(line.text) { grammar } else { EntryKind::Text };
        entries.push(Entry { kind, mode: modes.current(), lines: vec![line] });
        open = true;
    }
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordinal {
    pub number: Option<u32>,
    pub bonus: bool,
}

pub fn ordinal(line: &str) -> Ordinal {
    let bonus = line.starts_with('B');
    let number = ORDINAL
        .captures(line)
        .and_then(|caps| caps["number"].parse().ok());
    Ordinal { number, bonus }
}

/// Fields read from one requirement entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    pub completed: Completion,
    pub start: String,
    pub finish: String,
    pub anime: LinkedItem,
    pub text: String,
    pub inline_extra: String,
}

pub fn extract(entry: &Entry<'_>, allows_up_to_date: bool) -> Result<Fields, ParseError> {
    match entry.kind {
        EntryKind::Legacy => extract_legacy(entry.head(), allows_up_to_date),
        EntryKind::Current => extract_current(&entry.lines, allows_up_to_date),
        EntryKind::Text => {
            let head = entry.head();
            Err(ParseError::structural(head.number, "requirement entry", head.text))
        }
    }
}

fn after_ordinal<'a>(line: Line<'a>) -> Result<&'a str, ParseError> {
    let m = ORDINAL
        .find(line.text)
        .ok_or_else(|| ParseError::structural(line.number, ORDINAL_EXPECTED, line.text))?;
    Ok(&line.text[m.end()..])
}

fn completion<'a>(line: Line<'_>, rest: &'a str, allows_up_to_date: bool) -> Result<(Completion, &'a str), ParseError> {
    let expected = if allows_up_to_date {
        "completion marker [X], [O] or [U]"
    } else {
        "completion marker [X] or [O]"
    };
    let caps = MARKER
        .captures(rest)
        .ok_or_else(|| ParseError::structural(line.number, expected, line.text))?;
    let completed = caps["mark"]
        .chars()
        .next()
        .and_then(Completion::from_marker)
        .filter(|c| allows_up_to_date || *c != Completion::UpToDate)
        .ok_or_else(|| ParseError::structural(line.number, expected, line.text))?;
    let end = caps.get(0).map_or(0, |m| m.end());
    Ok((completed, &rest[end..]))
}

fn date(line: Line<'_>, value: &str) -> Result<String, ParseError> {
    dates::normalize(value).ok_or_else(|| ParseError::structural(line.number, "date", value))
}

fn linked_item(line: Line<'_>, title: &str, link: &str) -> Result<LinkedItem, ParseError> {
    LinkedItem::from_link(title, link).ok_or_else(|| ParseError::structural(line.number, "anime link", line.text))
}

fn extract_legacy(line: Line<'_>, allows_up_to_date: bool) -> Result<Fields, ParseError> {
    let rest = after_ordinal(line)?;
    let (completed, rest) = completion(line, rest, allows_up_to_date)?;

    let dates = LEGACY_DATES
        .captures(rest)
        .ok_or_else(|| ParseError::structural(line.number, "Start: and Finish: dates", line.text))?;
    let start = date(line, &dates["start"])?;
    let finish = date(line, &dates["finish"])?;

    let tail = LEGACY_TAIL
        .captures(rest)
        .ok_or_else(|| ParseError::structural(line.number, "__text__ followed by an anime link", line.text))?;
    let anime = linked_item(line, &tail["title"], &tail["link"])?;

    Ok(Fields {
        completed,
        start,
        finish,
        anime,
        text: tail["text"].trim().to_string(),
        inline_extra: tail["rest"].trim().to_string(),
    })
}

fn extract_current(lines: &[Line<'_>], allows_up_to_date: bool) -> Result<Fields, ParseError> {
    let head = lines[0];
    let rest = after_ordinal(head)?;
    let (completed, rest) = completion(head, rest, allows_up_to_date)?;
    let rest = rest.trim();
    let text = EMPHASIS
        .captures(rest)
        .map_or(rest, |caps| caps.name("text").map_or(rest, |m| m.as_str()))
        .trim()
        .to_string();

    let last = lines[lines.len() - 1].number;
    let link_line = lines
        .get(1)
        .copied()
        .ok_or_else(|| ParseError::structural(last, "anime link line", "end of requirement"))?;
    let link = LINK_LINE
        .captures(link_line.text)
        .ok_or_else(|| ParseError::structural(link_line.number, "anime link line", link_line.text))?;
    let anime = linked_item(link_line, &link["title"], &link["link"])?;
    let trailing = link["rest"].trim();
    let inline_extra = trailing.strip_prefix("//").unwrap_or(trailing).trim().to_string();

    let dates_line = lines
        .get(2)
        .copied()
        .ok_or_else(|| ParseError::structural(last, "Start: and Finish: dates", "end of requirement"))?;
    let dates = DATES_LINE
        .captures(dates_line.text)
        .ok_or_else(|| ParseError::structural(dates_line.number, "Start: and Finish: dates", dates_line.text))?;
    let start = date(dates_line, &dates["start"])?;
    let finish = date(dates_line, &dates["finish"])?;

    Ok(Fields { completed, start, finish, anime, text, inline_extra })
}
