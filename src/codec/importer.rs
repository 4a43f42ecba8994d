//! Challenge template → Challenge + Requirement rows.
//!
//! Lenient where the decoder is strict: an entry that cannot be read is stored
//! as a raw-edit requirement holding its lines verbatim. Only a missing title
//! line aborts.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::codec::classifier::ModeTracker;
use crate::codec::definitions::template_size;
use crate::codec::extractor::{extract, ordinal, split_entries, Entry, EntryKind};
use crate::codec::tokenizer::{groups_from, join};
use crate::codec::{LEGEND, UP_TO_DATE_LEGEND};
use crate::domain::{Category, Challenge, Requirement, RequirementKey};
use crate::error::ImportError;
use crate::store::ChallengeStore;

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s*__(?P<name>.*)__\s*$").expect("valid title regex"));

static PREREQUISITE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(?P<name>[^\]]+)\]\(").expect("valid prerequisite name regex"));

#[derive(Debug, Clone)]
pub enum ImportOutcome {
    Created { challenge: Challenge, requirements: Vec<Requirement> },
    /// A challenge with the same name exists; nothing was written.
    AlreadyExists(Challenge),
}

impl ImportOutcome {
    pub fn challenge(&self) -> &Challenge {
        match self {
            ImportOutcome::Created { challenge, .. } => challenge,
            ImportOutcome::AlreadyExists(challenge) => challenge,
        }
    }
}

#[instrument(level = "info", target = "challenge_code", skip(store, text), fields(text_len = text.len()))]
pub fn import_challenge_from_text<S: ChallengeStore + ?Sized>(
    store: &mut S,
    text: &str,
    thread_id: u64,
    category: Category,
) -> Result<ImportOutcome, ImportError> {
    let lines: Vec<&str> = text.lines().collect();
    let name = lines
        .first()
        .and_then(|l| TITLE.captures(l.trim()))
        .map(|caps| caps["name"].trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(ImportError::MissingTitle)?;

    if let Some(existing) = store.challenge_by_name(&name) {
        info!(target: "challenge_code", %name, "Challenge already imported; skipping");
        return Ok(ImportOutcome::AlreadyExists(existing));
    }

    let mut challenge = Challenge::new(name, thread_id, category);
    let legend = lines.iter().skip(1).position(|l| l.contains(LEGEND)).map(|idx| idx + 1);
    let body_start = match legend {
        Some(idx) => {
            challenge.allows_up_to_date = lines[idx].contains(UP_TO_DATE_LEGEND.trim());
            idx + 1
        }
        None => {
            warn!(target: "challenge_code", challenge = %challenge.name, "Template has no legend line; reading body after the title");
            1
        }
    };

    for line in &lines[1..legend.unwrap_or(1)] {
        let Some(caps) = PREREQUISITE_NAME.captures(line.trim()) else { continue };
        let full = caps["name"].trim();
        let fragment = full.split(' ').next().unwrap_or(full);
        match store.find_challenge_containing(fragment) {
            Some(found) => challenge.prerequisites.push(found.id),
            None => warn!(target: "challenge_code", prerequisite = %full, "Prerequisite challenge not found; skipped"),
        }
    }

    let template = template_size(&challenge.name).is_some();
    let walk = groups_from(text, body_start).fold(Walk::new(challenge.id, template), |mut walk, group| {
        for entry in split_entries(&group, &mut walk.modes) {
            walk.absorb(&entry);
        }
        walk
    });

    challenge.extra = walk.extra.join("\n\n");
    store.insert_challenge(challenge.clone());
    for requirement in &walk.requirements {
        store.insert_requirement(requirement.clone());
    }

    let raw = walk.requirements.iter().filter(|r| r.force_raw_edit).count();
    info!(
        target: "challenge_code",
        challenge = %challenge.name,
        %thread_id,
        requirements = walk.requirements.len(),
        raw,
        prerequisites = challenge.prerequisites.len(),
        "Challenge imported"
    );
    Ok(ImportOutcome::Created { challenge, requirements: walk.requirements })
}

struct Walk {
    challenge_id: uuid::Uuid,
    template: bool,
    modes: ModeTracker,
    last_number: [u32; 2],
    requirements: Vec<Requirement>,
    extra: Vec<String>,
}

impl Walk {
    fn new(challenge_id: uuid::Uuid, template: bool) -> Self {
        Self {
            challenge_id,
            template,
            modes: ModeTracker::default(),
            last_number: [0; 2],
            requirements: Vec::new(),
            extra: Vec::new(),
        }
    }

    fn absorb(&mut self, entry: &Entry<'_>) {
        if entry.kind == EntryKind::Text {
            self.extra.push(join(&entry.lines));
            return;
        }
        if self.template {
            return;
        }

        let ord = ordinal(entry.head().text);
        let slot = usize::from(ord.bonus);
        let number = ord.number.unwrap_or(self.last_number[slot] + 1);
        self.last_number[slot] = number;

        let key = RequirementKey { number, bonus: ord.bonus };
        if self.requirements.iter().any(|r| r.number == key.number && r.bonus == key.bonus) {
            warn!(target: "challenge_code", line = entry.head().number, number, bonus = ord.bonus, "Duplicate requirement number; entry skipped");
            return;
        }

        let mut requirement = Requirement::new(self.challenge_id, number, entry.mode, ord.bonus);
        match extract(entry, true) {
            Ok(fields) if ord.number.is_some() => {
                let continuation: Vec<&str> = entry.continuation().iter().map(|l| l.text).collect();
                requirement.text = fields.text;
                requirement.extra_newline = fields.inline_extra.is_empty() && !continuation.is_empty();
                let mut extra: Vec<&str> = Vec::new();
                if !fields.inline_extra.is_empty() {
                    extra.push(&fields.inline_extra);
                }
                extra.extend(continuation);
                requirement.extra = extra.join("\n");
                requirement.linked_item = Some(fields.anime).filter(|a| !a.is_placeholder());
            }
            outcome => {
                let reason = outcome.err().map_or_else(|| "missing number".to_string(), |e| e.to_string());
                warn!(target: "challenge_code", line = entry.head().number, %reason, "Requirement kept as raw text");
                requirement.force_raw_edit = true;
                requirement.raw_requirement = Some(join(&entry.lines));
            }
        }
        self.requirements.push(requirement);
    }
}
