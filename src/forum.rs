//! Minimal AniList GraphQL client for forum comments.
//!
//! We only read, save and delete thread comments and page through a user's
//! comments. The user's bearer token is passed per call and never logged.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::config::ForumConfig;
use crate::domain::CommentLocator;
use crate::error::ForumError;
use crate::util::trunc_for_log;

const VIEWER_QUERY: &str = r#"
query {
  Viewer { id, name }
}
"#;

const GET_COMMENT_QUERY: &str = r#"
query ($thread_id: Int, $comment_id: Int) {
  ThreadComment (threadId: $thread_id, id: $comment_id) { id, threadId, comment }
}
"#;

const SAVE_COMMENT_MUTATION: &str = r#"
mutation ($id: Int, $thread_id: Int, $comment: String) {
  SaveThreadComment (id: $id, threadId: $thread_id, comment: $comment) { id, threadId }
}
"#;

const DELETE_COMMENT_MUTATION: &str = r#"
mutation ($id: Int) {
  DeleteThreadComment (id: $id) { deleted }
}
"#;

const USER_COMMENTS_QUERY: &str = r#"
query ($page_number: Int, $user_id: Int) {
  Page (page: $page_number, perPage: 50) {
    pageInfo { currentPage, hasNextPage }
    threadComments (userId: $user_id) { id, threadId }
  }
}
"#;

#[derive(Clone)]
pub struct AniList {
  pub client: reqwest::Client,
  pub api_url: String,
}

/// Authenticated forum user.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Viewer {
  pub id: u64,
  pub name: String,
}

/// One thread comment with its text.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ForumComment {
  pub id: u64,
  #[serde(rename = "threadId")]
  pub thread_id: u64,
  #[serde(default)]
  pub comment: String,
}

impl ForumComment {
  pub fn locator(&self) -> CommentLocator {
    CommentLocator { thread_id: self.thread_id, comment_id: self.id }
  }
}

/// One page of a user's thread comments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentPage {
  pub comments: Vec<CommentLocator>,
  pub has_next_page: bool,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
  query: &'a str,
  variables: Value,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
  data: Option<T>,
  #[serde(default)]
  errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
  message: String,
}

#[derive(Deserialize)]
struct ViewerData {
  #[serde(rename = "Viewer")]
  viewer: Option<Viewer>,
}

#[derive(Deserialize)]
struct CommentData {
  // AniList answers a single-comment query with a one-element list.
  #[serde(rename = "ThreadComment")]
  thread_comment: Option<Vec<ForumComment>>,
}

#[derive(Deserialize)]
struct SaveData {
  #[serde(rename = "SaveThreadComment")]
  saved: Option<SavedComment>,
}

#[derive(Deserialize)]
struct SavedComment {
  id: u64,
  #[serde(rename = "threadId")]
  thread_id: Option<u64>,
}

#[derive(Deserialize)]
struct DeleteData {
  #[serde(rename = "DeleteThreadComment")]
  deleted: Option<Deleted>,
}

#[derive(Deserialize)]
struct Deleted {
  deleted: bool,
}

#[derive(Deserialize)]
struct PageData {
  #[serde(rename = "Page")]
  page: Option<Page>,
}

#[derive(Deserialize)]
struct Page {
  #[serde(rename = "pageInfo")]
  page_info: PageInfo,
  #[serde(rename = "threadComments", default)]
  thread_comments: Vec<CommentRef>,
}

#[derive(Deserialize)]
struct PageInfo {
  #[serde(rename = "hasNextPage", default)]
  has_next_page: bool,
}

#[derive(Deserialize)]
struct CommentRef {
  id: u64,
  #[serde(rename = "threadId")]
  thread_id: u64,
}

impl AniList {
  /// Build the client from config; `None` when disabled or the HTTP client cannot be built.
  pub fn from_config(cfg: &ForumConfig) -> Option<Self> {
    if !cfg.enabled {
      return None;
    }
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()
      .ok()?;
    Some(Self { client, api_url: cfg.api_url.clone() })
  }

  /// POST one GraphQL document and unwrap its `data`.
  #[instrument(level = "debug", skip(self, token, query, variables), fields(authorised = token.is_some()))]
  async fn post<T: DeserializeOwned>(&self, token: Option<&str>, query: &str, variables: Value) -> Result<T, ForumError> {
    let mut req = self.client.post(&self.api_url)
      .header(USER_AGENT, "awc-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(ACCEPT, "application/json");
    if let Some(token) = token {
      req = req.header(AUTHORIZATION, format!("Bearer {}", token));
    }

    let start = std::time::Instant::now();
    let res = req.json(&GraphQlRequest { query, variables }).send().await?;
    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      error!(target: "awc_backend", %status, body = %trunc_for_log(&body, 300), "Forum HTTP error");
      return Err(ForumError::Status { status: status.as_u16(), body });
    }

    let body: GraphQlResponse<T> = res.json().await?;
    info!(target: "awc_backend", elapsed = ?start.elapsed(), errors = body.errors.len(), "Forum response received");
    if let Some(first) = body.errors.into_iter().next() {
      return Err(ForumError::Api(first.message));
    }
    body.data.ok_or(ForumError::MissingField("data"))
  }

  #[instrument(level = "info", skip(self, token))]
  pub async fn viewer(&self, token: &str) -> Result<Viewer, ForumError> {
    let data: ViewerData = self.post(Some(token), VIEWER_QUERY, json!({})).await?;
    data.viewer.ok_or(ForumError::MissingField("Viewer"))
  }

  #[instrument(level = "info", skip(self, token), fields(thread_id = locator.thread_id, comment_id = locator.comment_id))]
  pub async fn fetch_comment(&self, token: Option<&str>, locator: CommentLocator) -> Result<ForumComment, ForumError> {
    let data: CommentData = self
      .post(token, GET_COMMENT_QUERY, json!({ "thread_id": locator.thread_id, "comment_id": locator.comment_id }))
      .await?;
    data.thread_comment
      .and_then(|list| list.into_iter().next())
      .ok_or(ForumError::MissingField("ThreadComment"))
  }

  /// Create a comment (`comment_id = None`) or update an existing one.
  #[instrument(level = "info", skip(self, token, comment), fields(comment_len = comment.len()))]
  pub async fn save_comment(
    &self,
    token: &str,
    thread_id: u64,
    comment_id: Option<u64>,
    comment: &str,
  ) -> Result<CommentLocator, ForumError> {
    let data: SaveData = self
      .post(Some(token), SAVE_COMMENT_MUTATION, json!({ "id": comment_id, "thread_id": thread_id, "comment": comment }))
      .await?;
    let saved = data.saved.ok_or(ForumError::MissingField("SaveThreadComment"))?;
    Ok(CommentLocator { thread_id: saved.thread_id.unwrap_or(thread_id), comment_id: saved.id })
  }

  #[instrument(level = "info", skip(self, token))]
  pub async fn delete_comment(&self, token: &str, comment_id: u64) -> Result<bool, ForumError> {
    let data: DeleteData = self.post(Some(token), DELETE_COMMENT_MUTATION, json!({ "id": comment_id })).await?;
    Ok(data.deleted.map_or(false, |d| d.deleted))
  }

  #[instrument(level = "debug", skip(self, token))]
  pub async fn user_comments_page(&self, token: Option<&str>, user_id: u64, page: u32) -> Result<CommentPage, ForumError> {
    let data: PageData = self
      .post(token, USER_COMMENTS_QUERY, json!({ "page_number": page, "user_id": user_id }))
      .await?;
    let page = data.page.ok_or(ForumError::MissingField("Page"))?;
    Ok(CommentPage {
      comments: page.thread_comments
        .into_iter()
        .map(|c| CommentLocator { thread_id: c.thread_id, comment_id: c.id })
        .collect(),
      has_next_page: page.page_info.has_next_page,
    })
  }

  /// Every thread comment of a user, across all pages.
  #[instrument(level = "info", skip(self, token))]
  pub async fn user_thread_comments(&self, token: Option<&str>, user_id: u64) -> Result<Vec<CommentLocator>, ForumError> {
    let mut all = Vec::new();
    let mut page = 1;
    loop {
      let chunk = self.user_comments_page(token, user_id, page).await?;
      all.extend(chunk.comments);
      if !chunk.has_next_page {
        break;
      }
      page += 1;
    }
    info!(target: "awc_backend", %user_id, comments = all.len(), pages = page, "Fetched user thread comments");
    Ok(all)
  }
}
