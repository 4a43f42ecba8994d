//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::{ChallengeFields, Dialect, ParsedChallenge};
use crate::domain::{Category, Challenge, CommentLocator, Submission};
use crate::error::{ParseError, ParseFailure};

/// DTO for challenge listings.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeOut {
    pub id: Uuid,
    pub name: String,
    pub thread_id: u64,
    pub category: Category,
    pub allows_up_to_date: bool,
    pub archived: bool,
    pub prerequisites: Vec<Uuid>,
}

/// Convert full `Challenge` (internal) to the public DTO.
pub fn to_out(c: &Challenge) -> ChallengeOut {
    ChallengeOut {
        id: c.id,
        name: c.name.clone(),
        thread_id: c.thread_id,
        category: c.category,
        allows_up_to_date: c.allows_up_to_date,
        archived: c.archived,
        prerequisites: c.prerequisites.clone(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionOut {
    pub id: Uuid,
    pub user: String,
    pub challenge_id: Uuid,
    pub url: String,
    pub announcement_url: Option<String>,
}

pub fn submission_out(s: &Submission, announcement_thread_id: u64) -> SubmissionOut {
    SubmissionOut {
        id: s.id,
        user: s.user.clone(),
        challenge_id: s.challenge_id,
        url: s.locator().url(),
        announcement_url: s
            .announcement_comment_id
            .map(|comment_id| CommentLocator { thread_id: announcement_thread_id, comment_id }.url()),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportIn {
    pub text: String,
    pub thread_id: u64,
    pub category: Category,
}
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportOut {
    pub created: bool,
    pub challenge: ChallengeOut,
    pub requirements: usize,
    pub raw_requirements: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RenderIn {
    /// Links prerequisites to this user's submissions.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub dialect: Option<Dialect>,
    #[serde(default)]
    pub fields: ChallengeFields,
}
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentOut {
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParseIn {
    pub comment: String,
}

/// Outcome of decoding a comment. On failure the comment comes back untouched.
#[derive(Debug, Serialize)]
pub struct ParseOut {
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedChallenge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ParseError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl From<Result<ParsedChallenge, ParseFailure>> for ParseOut {
    fn from(result: Result<ParsedChallenge, ParseFailure>) -> Self {
        match result {
            Ok(parsed) => ParseOut { failed: false, parsed: Some(parsed), error: None, message: None, comment: None },
            Err(failure) => ParseOut {
                failed: true,
                parsed: None,
                message: Some(failure.error.to_string()),
                error: Some(failure.error),
                comment: Some(failure.comment),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    pub user: String,
    #[serde(default)]
    pub dialect: Option<Dialect>,
    #[serde(default)]
    pub fields: ChallengeFields,
}

#[derive(Debug, Serialize)]
pub struct SubmitOut {
    pub submission: SubmissionOut,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterIn {
    pub user: String,
    pub comment_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct ScanIn {
    /// Forum id of the user whose comments are scanned; the token's owner when absent.
    #[serde(default)]
    pub user_id: Option<u64>,
}
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanOut {
    pub registered: Vec<SubmissionOut>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileCodeOut {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthOut {
    pub ok: bool,
    pub forum: bool,
}
