//! Challenge code → structured requirement states.
//!
//! Decoding is all-or-nothing: the first structural problem or unknown
//! requirement aborts and the caller gets the comment back untouched.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::codec::classifier::ModeTracker;
use crate::codec::dates;
use crate::codec::definitions::RequirementSet;
use crate::codec::extractor::{extract, ordinal, split_entries, Entry, EntryKind, ORDINAL_EXPECTED};
use crate::codec::tokenizer::{groups_from, join, Line};
use crate::codec::LEGEND;
use crate::domain::{padded_number, Category, Challenge, Progress, RequirementState, Tracked};
use crate::error::{ParseError, ParseFailure};

static START_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Challenge Start Date:\s*(?P<date>.*)$").expect("valid start date regex"));

static FINISH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Challenge Finish Date:\s*(?P<date>.*)$").expect("valid finish date regex"));

static PREREQUISITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?P<name>.*?)\]\((?P<link>[^)]*)\)\s*Finish Date:\s*(?P<date>.*)$")
        .expect("valid prerequisite regex")
});

/// A successfully decoded challenge code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedChallenge {
    pub start: String,
    pub finish: String,
    pub category: Category,
    /// Prerequisite name → finish date; present when the challenge has prerequisites.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<BTreeMap<String, String>>,
    pub requirements: Vec<RequirementState>,
    pub extra: String,
}

#[instrument(level = "debug", target = "challenge_code", skip_all, fields(challenge = %challenge.name, comment_len = comment.len()))]
pub fn parse_challenge_text(
    comment: &str,
    challenge: &Challenge,
    definitions: &RequirementSet,
) -> Result<ParsedChallenge, ParseFailure> {
    match decode(comment, challenge, definitions) {
        Ok(parsed) => {
            debug!(target: "challenge_code", requirements = parsed.requirements.len(), "Challenge code decoded");
            Ok(parsed)
        }
        Err(error) => {
            warn!(target: "challenge_code", challenge = %challenge.name, %error, "Challenge code rejected");
            Err(ParseFailure { error, comment: comment.to_string() })
        }
    }
}

fn decode(comment: &str, challenge: &Challenge, definitions: &RequirementSet) -> Result<ParsedChallenge, ParseError> {
    let lines: Vec<&str> = comment.lines().collect();
    let legend = lines
        .iter()
        .position(|l| l.contains(LEGEND))
        .ok_or_else(|| ParseError::structural(lines.len(), "legend line", "end of comment"))?;

    let mut start = None;
    let mut finish = None;
    let mut prerequisites = (!challenge.prerequisites.is_empty()).then(BTreeMap::new);

    for (idx, raw) in lines[..legend].iter().enumerate() {
        let line = Line { number: idx + 1, text: raw.trim() };
        if let Some(caps) = START_DATE.captures(line.text) {
            start = Some(header_date(line, &caps["date"])?);
        } else if let Some(caps) = FINISH_DATE.captures(line.text) {
            finish = Some(header_date(line, &caps["date"])?);
        } else if let (Some(found), Some(caps)) = (prerequisites.as_mut(), PREREQUISITE.captures(line.text)) {
            found.insert(caps["name"].trim().to_string(), header_date(line, &caps["date"])?);
        }
    }

    let start = start.ok_or_else(|| ParseError::structural(legend + 1, "Challenge Start Date line", "legend line"))?;
    let finish = finish.ok_or_else(|| ParseError::structural(legend + 1, "Challenge Finish Date line", "legend line"))?;

    let scan = groups_from(comment, legend + 1)
        .try_fold(Scan::new(challenge, definitions), |scan, group| scan.absorb(&group))?;

    Ok(ParsedChallenge {
        start,
        finish,
        category: challenge.category,
        prerequisites,
        requirements: scan.requirements,
        extra: scan.extra.join("\n\n"),
    })
}

fn header_date(line: Line<'_>, value: &str) -> Result<String, ParseError> {
    dates::normalize(value).ok_or_else(|| ParseError::structural(line.number, "date", line.text))
}

/// Accumulator threaded through the groups of one decode call.
struct Scan<'d> {
    definitions: &'d RequirementSet,
    allows_up_to_date: bool,
    modes: ModeTracker,
    /// Last requirement number seen, per (regular, bonus) partition.
    last_number: [u32; 2],
    requirements: Vec<RequirementState>,
    extra: Vec<String>,
}

impl<'d> Scan<'d> {
    fn new(challenge: &Challenge, definitions: &'d RequirementSet) -> Self {
        Self {
            definitions,
            allows_up_to_date: challenge.allows_up_to_date,
            modes: ModeTracker::default(),
            last_number: [0; 2],
            requirements: Vec::new(),
            extra: Vec::new(),
        }
    }

    fn absorb(mut self, group: &[Line<'_>]) -> Result<Self, ParseError> {
        for entry in split_entries(group, &mut self.modes) {
            if entry.kind == EntryKind::Text {
                self.extra.push(join(&entry.lines));
            } else {
                let state = self.requirement(&entry)?;
                self.requirements.push(state);
            }
        }
        Ok(self)
    }

    fn requirement(&mut self, entry: &Entry<'_>) -> Result<RequirementState, ParseError> {
        let head = entry.head();
        let ord = ordinal(head.text);
        let slot = usize::from(ord.bonus);
        // Entries without a readable number can only be raw-edit lines, matched by position.
        let number = ord.number.unwrap_or(self.last_number[slot] + 1);

        let definition = match (self.definitions.get(number, ord.bonus), ord.number) {
            (Some(d), _) => d,
            (None, Some(_)) => {
                return Err(ParseError::UnknownRequirement { line: head.number, number, bonus: ord.bonus })
            }
            (None, None) => return Err(ParseError::structural(head.number, ORDINAL_EXPECTED, head.text)),
        };
        self.last_number[slot] = number;

        let progress = if definition.force_raw_edit() {
            Progress::Raw { raw_requirement: join(&entry.lines) }
        } else {
            if ord.number.is_none() {
                return Err(ParseError::structural(head.number, ORDINAL_EXPECTED, head.text));
            }
            let fields = extract(entry, self.allows_up_to_date)?;
            let mut extra: Vec<&str> = Vec::new();
            if !fields.inline_extra.is_empty() {
                extra.push(&fields.inline_extra);
            }
            extra.extend(entry.continuation().iter().map(|l| l.text));
            Progress::Tracked(Tracked {
                completed: fields.completed,
                start: fields.start,
                finish: fields.finish,
                anime: definition.linked_item().cloned().unwrap_or(fields.anime),
                extra: extra.join("\n"),
            })
        };

        Ok(RequirementState {
            mode: entry.mode,
            number: padded_number(number),
            bonus: ord.bonus,
            progress,
        })
    }
}
