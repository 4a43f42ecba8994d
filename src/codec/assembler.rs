//! Structured fields → challenge code.
//!
//! The output is built as blocks joined by a blank line. Per-requirement lines
//! follow the same grammars the extractor reads, so decoding what is written
//! here gives back the same fields.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::codec::classifier::{mode_header, Season};
use crate::codec::dates::{self, PLACEHOLDER};
use crate::codec::decoder::ParsedChallenge;
use crate::codec::definitions::{RequirementDefinition, RequirementSet};
use crate::codec::tokenizer::{LEGACY_RULE, RULE};
use crate::codec::{Dialect, LEGEND, UP_TO_DATE_LEGEND};
use crate::domain::{
    padded_number, Category, Challenge, CommentLocator, Completion, LinkedItem, Mode, Progress, RequirementKey,
};

pub const PLACEHOLDER_POST: &str = "https://anilist.co/forum/thread/0000/comment/00000";

/// Genre section order; Default is emitted last under `__Misc__`.
const GENRE_SECTIONS: [Mode; 5] = [Mode::Easy, Mode::Normal, Mode::Hard, Mode::Bonus, Mode::Default];

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid year regex"));

/// Submitted values for one requirement. Anything left out falls back to the definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementFields {
    pub number: u32,
    #[serde(default)] pub bonus: bool,
    #[serde(default)] pub mode: Option<Mode>,
    #[serde(default)] pub completed: Option<Completion>,
    #[serde(default)] pub start: Option<String>,
    #[serde(default)] pub finish: Option<String>,
    #[serde(default)] pub anime: Option<LinkedItem>,
    #[serde(default)] pub extra: Option<String>,
    #[serde(default)] pub raw_requirement: Option<String>,
}

/// Submitted values for a whole challenge code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeFields {
    #[serde(default)] pub start: Option<String>,
    #[serde(default)] pub finish: Option<String>,
    /// Prerequisite name → finish date.
    #[serde(default)] pub prerequisites: BTreeMap<String, String>,
    #[serde(default)] pub extra: Option<String>,
    #[serde(default)] pub requirements: Vec<RequirementFields>,
}

impl ChallengeFields {
    pub fn requirement(&self, key: RequirementKey) -> Option<&RequirementFields> {
        self.requirements
            .iter()
            .find(|r| r.number == key.number && r.bonus == key.bonus)
    }

    /// Fields that re-render a decoded comment.
    pub fn from_parsed(parsed: &ParsedChallenge) -> Self {
        let requirements = parsed
            .requirements
            .iter()
            .filter_map(|state| {
                let key = state.key()?;
                let mut fields = RequirementFields {
                    number: key.number,
                    bonus: key.bonus,
                    mode: Some(state.mode),
                    ..Default::default()
                };
                match &state.progress {
                    Progress::Tracked(t) => {
                        fields.completed = Some(t.completed);
                        fields.start = Some(t.start.clone());
                        fields.finish = Some(t.finish.clone());
                        fields.anime = Some(t.anime.clone());
                        fields.extra = Some(t.extra.clone());
                    }
                    Progress::Raw { raw_requirement } => fields.raw_requirement = Some(raw_requirement.clone()),
                }
                Some(fields)
            })
            .collect();

        Self {
            start: Some(parsed.start.clone()),
            finish: Some(parsed.finish.clone()),
            prerequisites: parsed.prerequisites.clone().unwrap_or_default(),
            extra: Some(parsed.extra.clone()),
            requirements,
        }
    }
}

/// A prerequisite challenge and, if the user joined it, where their code lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    pub name: String,
    pub post: Option<CommentLocator>,
}

/// One rendered requirement, ready to be placed in a section.
struct Rendered {
    number: u32,
    bonus: bool,
    mode: Mode,
    text: String,
}

pub fn legend(challenge: &Challenge) -> String {
    if challenge.allows_up_to_date {
        format!("{}{}", LEGEND, UP_TO_DATE_LEGEND)
    } else {
        LEGEND.to_string()
    }
}

#[instrument(level = "debug", target = "challenge_code", skip_all, fields(challenge = %challenge.name, ?dialect))]
pub fn render_challenge_text(
    challenge: &Challenge,
    prerequisites: &[Prerequisite],
    definitions: &RequirementSet,
    fields: &ChallengeFields,
    dialect: Dialect,
) -> String {
    let mut blocks: Vec<String> = vec![format!("# __{}__", challenge.name)];

    if !prerequisites.is_empty() {
        let lines: Vec<String> = prerequisites
            .iter()
            .map(|p| {
                let link = p.post.map_or_else(|| PLACEHOLDER_POST.to_string(), |post| post.url());
                let finish = fields.prerequisites.get(&p.name).map_or(PLACEHOLDER, String::as_str);
                format!("[{}]({}) Finish Date: {}", p.name, link, dates::normalize_or_keep(finish))
            })
            .collect();
        blocks.push(lines.join("\n"));
        if dialect == Dialect::Current {
            blocks.push(RULE.to_string());
        }
    }

    blocks.push(format!(
        "Challenge Start Date: {}\nChallenge Finish Date: {}\n{}",
        dates::normalize_or_keep(fields.start.as_deref().unwrap_or(PLACEHOLDER)),
        dates::normalize_or_keep(fields.finish.as_deref().unwrap_or(PLACEHOLDER)),
        legend(challenge),
    ));
    if dialect == Dialect::Current {
        blocks.push(RULE.to_string());
    }

    let rendered: Vec<Rendered> = definitions
        .iter()
        .map(|def| render_requirement(def, fields.requirement(def.key()), challenge.allows_up_to_date, dialect))
        .collect();
    let count = rendered.len();
    blocks.extend(layout(challenge, rendered, dialect));

    let extra = fields.extra.as_deref().unwrap_or(&challenge.extra).trim();
    if !extra.is_empty() {
        if dialect == Dialect::Current {
            blocks.push(RULE.to_string());
        }
        blocks.push(extra.to_string());
    }

    debug!(target: "challenge_code", requirements = count, "Challenge code rendered");
    blocks.retain(|b| !b.trim().is_empty());
    blocks.join("\n\n")
}

fn render_requirement(
    def: &dyn RequirementDefinition,
    submitted: Option<&RequirementFields>,
    allows_up_to_date: bool,
    dialect: Dialect,
) -> Rendered {
    let mode = submitted.and_then(|f| f.mode).unwrap_or_else(|| def.mode());
    let mut out = Rendered { number: def.number(), bonus: def.bonus(), mode, text: String::new() };

    if def.force_raw_edit() {
        out.text = submitted
            .and_then(|f| f.raw_requirement.as_deref())
            .or_else(|| def.raw_requirement())
            .unwrap_or_default()
            .trim()
            .to_string();
        return out;
    }

    let completed = match submitted.and_then(|f| f.completed).unwrap_or_default() {
        Completion::UpToDate if !allows_up_to_date => Completion::NotCompleted,
        c => c,
    };
    let start = dates::normalize_or_keep(submitted.and_then(|f| f.start.as_deref()).unwrap_or(PLACEHOLDER));
    let finish = dates::normalize_or_keep(submitted.and_then(|f| f.finish.as_deref()).unwrap_or(PLACEHOLDER));
    let anime = def
        .linked_item()
        .cloned()
        .or_else(|| submitted.and_then(|f| f.anime.clone()))
        .unwrap_or_else(LinkedItem::placeholder);
    let extra = submitted
        .and_then(|f| f.extra.as_deref())
        .unwrap_or_else(|| def.extra())
        .trim();

    let ordinal = format!("{}{})", if def.bonus() { "B" } else { "" }, padded_number(def.number()));
    let marker = completed.marker();

    out.text = match dialect {
        Dialect::Legacy => {
            let mut line = format!(
                "{} [{}] Start: {} Finish: {} __{}__ [{}]({})",
                ordinal, marker, start, finish, def.text(), anime.title, anime.link
            );
            if !extra.is_empty() {
                line.push(if def.extra_newline() { '\n' } else { ' ' });
                line.push_str(extra);
            }
            line
        }
        Dialect::Current => {
            let mut group = format!("{} [{}] __{}__\n[{}]({})", ordinal, marker, def.text(), anime.title, anime.link);
            // Only one line fits after `//`; the rest follows the dates line.
            let (inline, below) = match extra.split_once('\n') {
                _ if extra.is_empty() || def.extra_newline() => ("", extra),
                Some((first, rest)) => (first.trim_end(), rest),
                None => (extra, ""),
            };
            if !inline.is_empty() {
                group.push_str(" // ");
                group.push_str(inline);
            }
            group.push_str(&format!("\nStart: {} Finish: {}", start, finish));
            if !below.is_empty() {
                group.push('\n');
                group.push_str(below);
            }
            group
        }
    };
    out
}

/// Arrange rendered requirements into blocks according to the category.
fn layout(challenge: &Challenge, rendered: Vec<Rendered>, dialect: Dialect) -> Vec<String> {
    match challenge.category {
        Category::Genre => {
            let mut blocks = Vec::new();
            for mode in GENRE_SECTIONS {
                let mut members: Vec<&Rendered> = rendered.iter().filter(|r| r.mode == mode).collect();
                if members.is_empty() {
                    continue;
                }
                members.sort_by_key(|r| r.number);
                let header = mode_header(mode).to_string();
                let texts = members.iter().map(|r| r.text.clone());
                match dialect {
                    Dialect::Current => {
                        blocks.push(header);
                        blocks.extend(texts);
                    }
                    Dialect::Legacy => {
                        let mut section = vec![LEGACY_RULE.to_string(), header];
                        section.extend(texts);
                        blocks.push(section.join("\n"));
                    }
                }
            }
            blocks
        }
        Category::Classic => {
            let year = YEAR.find(&challenge.name).map(|m| m.as_str());
            let mut pieces = Vec::new();
            for r in rendered {
                if !r.bonus {
                    if let Some(season) = Season::starting_at(r.number) {
                        pieces.push(season.header(year));
                    }
                }
                pieces.push(r.text);
            }
            flat(pieces, dialect)
        }
        Category::Timed | Category::Tier | Category::Collection | Category::Puzzle | Category::Special => {
            flat(rendered.into_iter().map(|r| r.text).collect(), dialect)
        }
    }
}

fn flat(pieces: Vec<String>, dialect: Dialect) -> Vec<String> {
    match dialect {
        Dialect::Current => pieces,
        Dialect::Legacy if pieces.is_empty() => Vec::new(),
        Dialect::Legacy => vec![pieces.join("\n")],
    }
}
