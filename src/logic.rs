//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Importing challenge templates and listing challenges
//!   - Rendering and parsing challenge codes for a user
//!   - Creating, updating, announcing and deleting forum submissions
//!   - Profile code generation and the submission scan

use std::collections::BTreeMap;

use chrono::Local;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::codec::{
  import_challenge_from_text, parse_challenge_text, render_challenge_text, ChallengeFields, Dialect, ImportOutcome,
};
use crate::domain::{Challenge, CommentLocator, Submission};
use crate::error::ApiError;
use crate::protocol::{submission_out, to_out, ChallengeOut, ImportIn, ImportOut, ParseOut, SubmissionOut, SubmitOut};
use crate::state::AppState;
use crate::store::ChallengeStore;

pub async fn list_challenges(state: &AppState) -> Vec<ChallengeOut> {
  state.store.read().await.list_challenges().iter().map(to_out).collect()
}

#[instrument(level = "info", skip(state, body), fields(thread_id = body.thread_id, category = ?body.category, text_len = body.text.len()))]
pub async fn import_challenge(state: &AppState, body: ImportIn) -> Result<ImportOut, ApiError> {
  let mut store = state.store.write().await;
  let outcome = import_challenge_from_text(&mut *store, &body.text, body.thread_id, body.category)?;
  let out = match outcome {
    ImportOutcome::Created { challenge, requirements } => ImportOut {
      created: true,
      challenge: to_out(&challenge),
      requirements: requirements.len(),
      raw_requirements: requirements.iter().filter(|r| r.force_raw_edit).count(),
    },
    ImportOutcome::AlreadyExists(challenge) => ImportOut {
      created: false,
      requirements: store.requirements(challenge.id).len(),
      raw_requirements: store.requirements(challenge.id).iter().filter(|r| r.force_raw_edit).count(),
      challenge: to_out(&challenge),
    },
  };
  Ok(out)
}

/// Render a challenge code for `user` (prerequisite links) from submitted fields.
#[instrument(level = "info", skip(state, fields), fields(%challenge_id))]
pub async fn render_for_user(
  state: &AppState,
  challenge_id: Uuid,
  user: Option<&str>,
  fields: &ChallengeFields,
  dialect: Option<Dialect>,
) -> Result<String, ApiError> {
  let challenge = state.get_challenge(challenge_id).await?;
  Ok(render(state, &challenge, user, fields, dialect).await)
}

async fn render(
  state: &AppState,
  challenge: &Challenge,
  user: Option<&str>,
  fields: &ChallengeFields,
  dialect: Option<Dialect>,
) -> String {
  let definitions = state.requirement_set(challenge).await;
  let prerequisites = state.prerequisites(challenge, user).await;
  let dialect = dialect.unwrap_or(state.config.codec.dialect);
  render_challenge_text(challenge, &prerequisites, &definitions, fields, dialect)
}

#[instrument(level = "info", skip(state, comment), fields(%challenge_id, comment_len = comment.len()))]
pub async fn parse_comment(state: &AppState, challenge_id: Uuid, comment: &str) -> Result<ParseOut, ApiError> {
  let challenge = state.get_challenge(challenge_id).await?;
  let definitions = state.requirement_set(&challenge).await;
  Ok(parse_challenge_text(comment, &challenge, &definitions).into())
}

async fn require_submission(state: &AppState, user: &str, challenge_id: Uuid) -> Result<Submission, ApiError> {
  state
    .store
    .read()
    .await
    .submission(user, challenge_id)
    .ok_or_else(|| ApiError::not_found(format!("{} has no submission for challenge {}", user, challenge_id)))
}

fn require_token(token: Option<&str>) -> Result<&str, ApiError> {
  token.ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))
}

/// Fetch the user's submission comment from the forum and decode it.
#[instrument(level = "info", skip(state, token), fields(%challenge_id, %user))]
pub async fn fetch_submission(state: &AppState, token: Option<&str>, challenge_id: Uuid, user: &str) -> Result<ParseOut, ApiError> {
  let challenge = state.get_challenge(challenge_id).await?;
  let submission = require_submission(state, user, challenge_id).await?;
  let comment = state.forum()?.fetch_comment(token, submission.locator()).await?;
  let definitions = state.requirement_set(&challenge).await;
  let out: ParseOut = parse_challenge_text(&comment.comment, &challenge, &definitions).into();
  if out.failed {
    warn!(target: "awc_backend", %user, challenge = %challenge.name, "Stored submission does not parse");
  }
  Ok(out)
}

/// Re-render the user's challenge code and overwrite their forum comment.
#[instrument(level = "info", skip(state, token, fields), fields(%challenge_id, %user))]
pub async fn update_submission(
  state: &AppState,
  token: Option<&str>,
  challenge_id: Uuid,
  user: &str,
  fields: &ChallengeFields,
  dialect: Option<Dialect>,
) -> Result<SubmitOut, ApiError> {
  let token = require_token(token)?;
  let challenge = state.get_challenge(challenge_id).await?;
  let submission = require_submission(state, user, challenge_id).await?;
  let comment = render(state, &challenge, Some(user), fields, dialect).await;
  state.forum()?.save_comment(token, submission.thread_id, Some(submission.comment_id), &comment).await?;
  info!(target: "awc_backend", %user, challenge = %challenge.name, comment_id = submission.comment_id, "Submission updated");
  Ok(SubmitOut { submission: submission_out(&submission, state.config.forum.announcement_thread_id), comment })
}

/// Post a fresh challenge code for `user` and register it.
///
/// Every prerequisite must already have a submission. The start date defaults
/// to today and the finish date to the placeholder.
#[instrument(level = "info", skip(state, token, fields), fields(%challenge_id, %user))]
pub async fn join_challenge(
  state: &AppState,
  token: Option<&str>,
  challenge_id: Uuid,
  user: &str,
  fields: &ChallengeFields,
  dialect: Option<Dialect>,
) -> Result<SubmitOut, ApiError> {
  let token = require_token(token)?;
  let challenge = state.get_challenge(challenge_id).await?;
  if challenge.archived {
    return Err(ApiError::Forbidden(format!("{} is archived", challenge.name)));
  }
  if let Some(existing) = { state.store.read().await.submission(user, challenge_id) } {
    return Err(ApiError::bad_request(format!("{} already joined {} ({})", user, challenge.name, existing.locator().url())));
  }
  let missing: Vec<String> = state
    .prerequisites(&challenge, Some(user))
    .await
    .into_iter()
    .filter(|p| p.post.is_none())
    .map(|p| p.name)
    .collect();
  if !missing.is_empty() {
    return Err(ApiError::Forbidden(format!("missing prerequisites: {}", missing.join(", "))));
  }

  let mut fields = fields.clone();
  if fields.start.is_none() {
    fields.start = Some(Local::now().date_naive().format("%Y-%m-%d").to_string());
  }
  let comment = render(state, &challenge, Some(user), &fields, dialect).await;
  let saved = state.forum()?.save_comment(token, challenge.thread_id, None, &comment).await?;

  let submission = Submission {
    id: Uuid::new_v4(),
    user: user.to_string(),
    challenge_id,
    thread_id: saved.thread_id,
    comment_id: saved.comment_id,
    announcement_comment_id: None,
  };
  state.store.write().await.insert_submission(submission.clone());
  info!(target: "awc_backend", %user, challenge = %challenge.name, url = %saved.url(), "Challenge joined");
  Ok(SubmitOut { submission: submission_out(&submission, state.config.forum.announcement_thread_id), comment })
}

/// Register a comment that already exists on the forum as the user's submission.
#[instrument(level = "info", skip(state), fields(%challenge_id, %user))]
pub async fn register_submission(state: &AppState, challenge_id: Uuid, user: &str, comment_id: u64) -> Result<SubmissionOut, ApiError> {
  let challenge = state.get_challenge(challenge_id).await?;
  let submission = Submission {
    id: Uuid::new_v4(),
    user: user.to_string(),
    challenge_id,
    thread_id: challenge.thread_id,
    comment_id,
    announcement_comment_id: None,
  };
  state.store.write().await.insert_submission(submission.clone());
  Ok(submission_out(&submission, state.config.forum.announcement_thread_id))
}

/// Announce a finished challenge in the announcement thread.
#[instrument(level = "info", skip(state, token), fields(%challenge_id, %user))]
pub async fn announce_submission(state: &AppState, token: Option<&str>, challenge_id: Uuid, user: &str) -> Result<SubmissionOut, ApiError> {
  let token = require_token(token)?;
  let challenge = state.get_challenge(challenge_id).await?;
  let submission = require_submission(state, user, challenge_id).await?;
  let text = announcement_text(&challenge, &submission);
  let thread_id = state.config.forum.announcement_thread_id;
  let saved = state.forum()?.save_comment(token, thread_id, None, &text).await?;

  let updated = state
    .store
    .write()
    .await
    .set_announcement(submission.id, Some(saved.comment_id))
    .ok_or_else(|| ApiError::not_found("submission removed while announcing"))?;
  info!(target: "awc_backend", %user, challenge = %challenge.name, announcement = saved.comment_id, "Submission announced");
  Ok(submission_out(&updated, thread_id))
}

pub fn announcement_text(challenge: &Challenge, submission: &Submission) -> String {
  format!("{}: {}", challenge.name, submission.locator().url())
}

/// Delete the submission comment (or only its announcement) from the forum and forget it.
#[instrument(level = "info", skip(state, token), fields(%challenge_id, %user))]
pub async fn delete_submission(
  state: &AppState,
  token: Option<&str>,
  challenge_id: Uuid,
  user: &str,
  announcement_only: bool,
) -> Result<(), ApiError> {
  let token = require_token(token)?;
  let submission = require_submission(state, user, challenge_id).await?;
  let target = if announcement_only {
    submission
      .announcement_comment_id
      .ok_or_else(|| ApiError::not_found("submission has no announcement"))?
  } else {
    submission.comment_id
  };

  if !state.forum()?.delete_comment(token, target).await? {
    return Err(ApiError::BadGateway(format!("forum refused to delete comment {}", target)));
  }
  let mut store = state.store.write().await;
  if announcement_only {
    store.set_announcement(submission.id, None);
  } else {
    store.remove_submission(submission.id);
  }
  info!(target: "awc_backend", %user, comment_id = target, announcement_only, "Submission comment deleted");
  Ok(())
}

/// `__Current__` / `__Past__` link lists for a forum profile.
pub fn profile_code(submissions: &[(Submission, Challenge)]) -> String {
  let link = |(s, c): &(Submission, Challenge)| format!("[{}]({})", c.name, s.locator().url());
  let current: Vec<String> = submissions.iter().filter(|(s, _)| s.announcement_comment_id.is_none()).map(link).collect();
  let past: Vec<String> = submissions.iter().filter(|(s, _)| s.announcement_comment_id.is_some()).map(link).collect();

  let mut sections = Vec::new();
  if !current.is_empty() {
    sections.push(format!("__Current__\n\n{}", current.join(" | ")));
  }
  if !past.is_empty() {
    sections.push(format!("__Past__\n\n{}", past.join(" | ")));
  }
  sections.join("\n\n")
}

pub async fn profile_code_for(state: &AppState, user: &str) -> String {
  let submissions = state.store.read().await.submissions_for(user);
  debug!(target: "awc_backend", %user, submissions = submissions.len(), "Building profile code");
  profile_code(&submissions)
}

/// Earliest comment per thread.
pub fn first_comment_per_thread(comments: &[CommentLocator]) -> BTreeMap<u64, u64> {
  let mut first: BTreeMap<u64, u64> = BTreeMap::new();
  for c in comments {
    first
      .entry(c.thread_id)
      .and_modify(|id| *id = (*id).min(c.comment_id))
      .or_insert(c.comment_id);
  }
  first
}

/// Register the user's earliest comment in every challenge thread they have no submission for.
#[instrument(level = "info", skip(state, token), fields(%user))]
/// Register submissions from the user's forum comments. Without `user_id` the
/// token's owner is scanned.
pub async fn scan_submissions(state: &AppState, token: Option<&str>, user: &str, user_id: Option<u64>) -> Result<Vec<SubmissionOut>, ApiError> {
  let forum = state.forum()?;
  let user_id = match user_id {
    Some(id) => id,
    None => forum.viewer(require_token(token)?).await?.id,
  };
  let comments = forum.user_thread_comments(token, user_id).await?;
  Ok(register_scanned(state, user, &comments).await)
}

pub async fn register_scanned(state: &AppState, user: &str, comments: &[CommentLocator]) -> Vec<SubmissionOut> {
  let thread = state.config.forum.announcement_thread_id;
  let mut store = state.store.write().await;
  let mut registered = Vec::new();
  for (thread_id, comment_id) in first_comment_per_thread(comments) {
    let Some(challenge) = store.challenge_by_thread(thread_id) else { continue };
    if store.submission(user, challenge.id).is_some() {
      continue;
    }
    let submission = Submission {
      id: Uuid::new_v4(),
      user: user.to_string(),
      challenge_id: challenge.id,
      thread_id,
      comment_id,
      announcement_comment_id: None,
    };
    store.insert_submission(submission.clone());
    registered.push(submission_out(&submission, thread));
  }
  info!(target: "awc_backend", %user, scanned = comments.len(), registered = registered.len(), "Scan finished");
  registered
}
