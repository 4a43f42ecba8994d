//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, Json, response::IntoResponse};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;
use crate::util::bearer_token;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, forum: state.forum.is_some() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_challenges(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(list_challenges(&state).await)
}

#[instrument(level = "info", skip(state, body), fields(thread_id = body.thread_id, text_len = body.text.len()))]
pub async fn http_import_challenge(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ImportIn>,
) -> Result<impl IntoResponse, ApiError> {
  let out = import_challenge(&state, body).await?;
  info!(target: "awc_backend", name = %out.challenge.name, created = out.created, requirements = out.requirements, "HTTP import handled");
  let status = if out.created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(out)))
}

#[instrument(level = "info", skip(state, body), fields(%id))]
pub async fn http_render(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RenderIn>,
) -> Result<impl IntoResponse, ApiError> {
  let comment = render_for_user(&state, id, body.user.as_deref(), &body.fields, body.dialect).await?;
  Ok(Json(CommentOut { comment }))
}

#[instrument(level = "info", skip(state, body), fields(%id, comment_len = body.comment.len()))]
pub async fn http_parse(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ParseIn>,
) -> Result<impl IntoResponse, ApiError> {
  let out = parse_comment(&state, id, &body.comment).await?;
  info!(target: "awc_backend", %id, failed = out.failed, "HTTP parse handled");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, headers), fields(%id, user = %q.user))]
pub async fn http_fetch_submission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Query(q): Query<UserQuery>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
  Ok(Json(fetch_submission(&state, bearer_token(&headers), id, &q.user).await?))
}

#[instrument(level = "info", skip(state, headers, body), fields(%id, user = %body.user))]
pub async fn http_update_submission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<SubmitIn>,
) -> Result<impl IntoResponse, ApiError> {
  let out = update_submission(&state, bearer_token(&headers), id, &body.user, &body.fields, body.dialect).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, headers, body), fields(%id, user = %body.user))]
pub async fn http_join(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<SubmitIn>,
) -> Result<impl IntoResponse, ApiError> {
  let out = join_challenge(&state, bearer_token(&headers), id, &body.user, &body.fields, body.dialect).await?;
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state, body), fields(%id, user = %body.user, comment_id = body.comment_id))]
pub async fn http_register(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RegisterIn>,
) -> Result<impl IntoResponse, ApiError> {
  let out = register_submission(&state, id, &body.user, body.comment_id).await?;
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state, headers), fields(%id, user = %q.user))]
pub async fn http_delete_submission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Query(q): Query<UserQuery>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
  delete_submission(&state, bearer_token(&headers), id, &q.user, false).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, headers), fields(%id, user = %q.user))]
pub async fn http_announce(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Query(q): Query<UserQuery>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
  let out = announce_submission(&state, bearer_token(&headers), id, &q.user).await?;
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state, headers), fields(%id, user = %q.user))]
pub async fn http_delete_announcement(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Query(q): Query<UserQuery>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
  delete_submission(&state, bearer_token(&headers), id, &q.user, true).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state), fields(%user))]
pub async fn http_profile_code(
  State(state): State<Arc<AppState>>,
  Path(user): Path<String>,
) -> impl IntoResponse {
  Json(ProfileCodeOut { code: profile_code_for(&state, &user).await })
}

#[instrument(level = "info", skip(state, headers, body), fields(%user, user_id = ?body.user_id))]
pub async fn http_scan(
  State(state): State<Arc<AppState>>,
  Path(user): Path<String>,
  headers: HeaderMap,
  Json(body): Json<ScanIn>,
) -> Result<impl IntoResponse, ApiError> {
  let registered = scan_submissions(&state, bearer_token(&headers), &user, body.user_id).await?;
  info!(target: "awc_backend", %user, registered = registered.len(), "HTTP scan handled");
  Ok(Json(ScanOut { registered }))
}
