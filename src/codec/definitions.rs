//! Requirement definitions as seen by the codec.
//!
//! Stored challenges read their `Requirement` rows. Template-driven challenges
//! (Seasonal, Classic) have no rows and get a synthetic set of numbered
//! placeholders instead. Both are used through [`RequirementDefinition`].

use crate::domain::{Challenge, LinkedItem, Mode, Requirement, RequirementKey};

pub const SEASONAL_COUNT: usize = 7;
pub const CLASSIC_COUNT: usize = 40;

pub trait RequirementDefinition {
    fn number(&self) -> u32;
    fn mode(&self) -> Mode;
    fn text(&self) -> &str;
    fn bonus(&self) -> bool;
    fn extra(&self) -> &str;
    fn extra_newline(&self) -> bool;
    fn linked_item(&self) -> Option<&LinkedItem>;
    fn force_raw_edit(&self) -> bool;
    fn raw_requirement(&self) -> Option<&str>;

    fn key(&self) -> RequirementKey {
        RequirementKey { number: self.number(), bonus: self.bonus() }
    }
}

impl RequirementDefinition for Requirement {
    fn number(&self) -> u32 { self.number }
    fn mode(&self) -> Mode { self.mode }
    fn text(&self) -> &str { &self.text }
    fn bonus(&self) -> bool { self.bonus }
    fn extra(&self) -> &str { &self.extra }
    fn extra_newline(&self) -> bool { self.extra_newline }
    fn linked_item(&self) -> Option<&LinkedItem> { self.linked_item.as_ref() }
    fn force_raw_edit(&self) -> bool { self.force_raw_edit }
    fn raw_requirement(&self) -> Option<&str> { self.raw_requirement.as_deref() }
}

/// Placeholder definition: Default mode, no text, no extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockRequirement {
    number: u32,
}

impl RequirementDefinition for MockRequirement {
    fn number(&self) -> u32 { self.number }
    fn mode(&self) -> Mode { Mode::Default }
    fn text(&self) -> &str { "" }
    fn bonus(&self) -> bool { false }
    fn extra(&self) -> &str { "" }
    fn extra_newline(&self) -> bool { false }
    fn linked_item(&self) -> Option<&LinkedItem> { None }
    fn force_raw_edit(&self) -> bool { false }
    fn raw_requirement(&self) -> Option<&str> { None }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequirementSet {
    requirements: Vec<MockRequirement>,
}

impl MockRequirementSet {
    pub fn new(count: usize) -> Self {
        let requirements = (1..=count as u32).map(|number| MockRequirement { number }).collect();
        Self { requirements }
    }
}

/// Number of synthetic requirements for a template-driven challenge name.
pub fn template_size(name: &str) -> Option<usize> {
    if name.contains("Seasonal") {
        Some(SEASONAL_COUNT)
    } else if name.contains("Classic") {
        Some(CLASSIC_COUNT)
    } else {
        None
    }
}

/// Ordered definitions of one challenge.
#[derive(Debug, Clone, PartialEq)]
pub enum RequirementSet {
    Stored(Vec<Requirement>),
    Template(MockRequirementSet),
}

impl RequirementSet {
    /// Pick the variant by challenge name; `load` only runs for stored challenges.
    pub fn for_challenge(challenge: &Challenge, load: impl FnOnce() -> Vec<Requirement>) -> Self {
        match template_size(&challenge.name) {
            Some(count) => RequirementSet::Template(MockRequirementSet::new(count)),
            None => RequirementSet::Stored(load()),
        }
    }

    pub fn get(&self, number: u32, bonus: bool) -> Option<&dyn RequirementDefinition> {
        self.iter().find(|d| d.number() == number && d.bonus() == bonus)
    }

    /// Definitions in definition order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &dyn RequirementDefinition> + '_> {
        match self {
            RequirementSet::Stored(rows) => Box::new(rows.iter().map(|r| r as &dyn RequirementDefinition)),
            RequirementSet::Template(set) => {
                Box::new(set.requirements.iter().map(|r| r as &dyn RequirementDefinition))
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequirementSet::Stored(rows) => rows.len(),
            RequirementSet::Template(set) => set.requirements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
