//! In-memory persistence for challenges, requirement rows and submissions.
//!
//! The codec only needs the narrow [`ChallengeStore`] view; the HTTP layer uses
//! the concrete [`MemoryStore`] behind a `tokio::sync::RwLock` in `AppState`.

use std::collections::HashMap;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{Challenge, Requirement, Submission};

/// Lookups and inserts the importer and decoder rely on.
pub trait ChallengeStore {
    fn challenge_by_name(&self, name: &str) -> Option<Challenge>;
    fn challenge_by_id(&self, id: Uuid) -> Option<Challenge>;
    fn challenge_by_thread(&self, thread_id: u64) -> Option<Challenge>;
    /// First challenge (by name order) whose name contains `fragment`.
    fn find_challenge_containing(&self, fragment: &str) -> Option<Challenge>;
    fn insert_challenge(&mut self, challenge: Challenge);
    fn insert_requirement(&mut self, requirement: Requirement);
    /// Requirement rows of a challenge in insertion order.
    fn requirements(&self, challenge_id: Uuid) -> Vec<Requirement>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    challenges: HashMap<Uuid, Challenge>,
    requirements: HashMap<Uuid, Vec<Requirement>>,
    submissions: HashMap<Uuid, Submission>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All challenges sorted by name.
    pub fn list_challenges(&self) -> Vec<Challenge> {
        let mut all: Vec<Challenge> = self.challenges.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    #[instrument(level = "debug", skip(self, submission), fields(user = %submission.user, challenge = %submission.challenge_id))]
    pub fn insert_submission(&mut self, submission: Submission) {
        // One submission per (user, challenge); a newer registration replaces the old one.
        let stale: Vec<Uuid> = self
            .submissions
            .values()
            .filter(|s| s.user == submission.user && s.challenge_id == submission.challenge_id)
            .map(|s| s.id)
            .collect();
        for id in stale {
            self.submissions.remove(&id);
        }
        debug!(target: "awc_backend", comment_id = submission.comment_id, "Submission stored");
        self.submissions.insert(submission.id, submission);
    }

    pub fn submission(&self, user: &str, challenge_id: Uuid) -> Option<Submission> {
        self.submissions
            .values()
            .find(|s| s.user == user && s.challenge_id == challenge_id)
            .cloned()
    }

    /// Submissions of one user, ordered by challenge name.
    pub fn submissions_for(&self, user: &str) -> Vec<(Submission, Challenge)> {
        let mut out: Vec<(Submission, Challenge)> = self
            .submissions
            .values()
            .filter(|s| s.user == user)
            .filter_map(|s| Some((s.clone(), self.challenges.get(&s.challenge_id)?.clone())))
            .collect();
        out.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        out
    }

    /// Record (or with `None`, clear) the announcement comment of a submission.
    pub fn set_announcement(&mut self, submission_id: Uuid, comment_id: Option<u64>) -> Option<Submission> {
        let submission = self.submissions.get_mut(&submission_id)?;
        submission.announcement_comment_id = comment_id;
        Some(submission.clone())
    }

    pub fn remove_submission(&mut self, submission_id: Uuid) -> Option<Submission> {
        self.submissions.remove(&submission_id)
    }
}

impl ChallengeStore for MemoryStore {
    fn challenge_by_name(&self, name: &str) -> Option<Challenge> {
        self.challenges.values().find(|c| c.name == name).cloned()
    }

    fn challenge_by_id(&self, id: Uuid) -> Option<Challenge> {
        self.challenges.get(&id).cloned()
    }

    fn challenge_by_thread(&self, thread_id: u64) -> Option<Challenge> {
        self.challenges.values().find(|c| c.thread_id == thread_id).cloned()
    }

    fn find_challenge_containing(&self, fragment: &str) -> Option<Challenge> {
        self.list_challenges().into_iter().find(|c| c.name.contains(fragment))
    }

    fn insert_challenge(&mut self, challenge: Challenge) {
        self.challenges.insert(challenge.id, challenge);
    }

    fn insert_requirement(&mut self, requirement: Requirement) {
        self.requirements.entry(requirement.challenge_id).or_default().push(requirement);
    }

    fn requirements(&self, challenge_id: Uuid) -> Vec<Requirement> {
        self.requirements.get(&challenge_id).cloned().unwrap_or_default()
    }
}
