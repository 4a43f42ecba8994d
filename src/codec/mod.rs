//! Challenge code engine: the round trip between a forum comment and structured
//! requirement state.
//!
//! Pipeline: tokenizer (groups) → classifier (running mode) → extractor (fields)
//! for reading; assembler for writing; importer turns a template into rows.

pub mod assembler;
pub mod classifier;
pub mod dates;
pub mod decoder;
pub mod definitions;
pub mod extractor;
pub mod importer;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

pub use assembler::{render_challenge_text, ChallengeFields, Prerequisite, RequirementFields};
pub use decoder::{parse_challenge_text, ParsedChallenge};
pub use definitions::{MockRequirementSet, RequirementDefinition, RequirementSet};
pub use importer::{import_challenge_from_text, ImportOutcome};

pub const LEGEND: &str = "Legend: [X] = Completed [O] = Not Completed";
pub const UP_TO_DATE_LEGEND: &str = " [U] = Up-to-date";

/// Which requirement grammar the assembler writes. The decoder reads both.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// One line per requirement, dates inline.
    Legacy,
    /// One group per requirement, `<hr>` separated blocks.
    #[default]
    Current,
}
