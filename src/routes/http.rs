//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; student handlers lock the session for the whole step.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppResult;
use crate::identity::Identity;
use crate::logic;
use crate::protocol::*;
use crate::report::Report;
use crate::state::AppState;

pub const TEACHER_TOKEN_HEADER: &str = "x-teacher-token";

async fn require_teacher(state: &AppState, headers: &HeaderMap) -> AppResult<Identity> {
  let token = headers.get(TEACHER_TOKEN_HEADER).and_then(|v| v.to_str().ok());
  state.teacher(token).await
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_catalog() -> impl IntoResponse { Json(logic::catalog()) }

// -------- Teacher --------

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn http_teacher_login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoginIn>,
) -> AppResult<Json<LoginOut>> {
  Ok(Json(logic::login(&state, &body.email, &body.password).await?))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_create_assignment(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CreateAssignmentIn>,
) -> AppResult<(StatusCode, Json<AssignmentOut>)> {
  let teacher = require_teacher(&state, &headers).await?;
  let out = logic::create_assignment(&state, &teacher, body).await?;
  info!(target: "readfit_backend", code = %out.assignment.access_code, teacher = %teacher.email, "HTTP assignment created");
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_list_assignments(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<ListQuery>,
) -> AppResult<Json<AssignmentsOut>> {
  require_teacher(&state, &headers).await?;
  Ok(Json(logic::list_assignments(&state, q.limit).await?))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_list_submissions(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(code): Path<String>,
  Query(q): Query<ListQuery>,
) -> AppResult<Json<SubmissionsOut>> {
  require_teacher(&state, &headers).await?;
  Ok(Json(logic::list_submissions(&state, &code, q.limit).await?))
}

// -------- Student --------

#[instrument(level = "info", skip(state, body), fields(code = %body.access_code))]
pub async fn http_student_enter(
  State(state): State<Arc<AppState>>,
  Json(body): Json<EnterIn>,
) -> AppResult<(StatusCode, Json<SessionView>)> {
  let session = logic::enter(&state, &body.access_code, &body.student_name).await?;
  let view = session_view(&session);
  state.insert_session(session).await;
  Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
  let shared = state.session(id).await?;
  let session = shared.lock().await;
  Ok(Json(session_view(&session)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_submit_quiz(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<QuizIn>,
) -> AppResult<Json<QuizResultOut>> {
  let shared = state.session(id).await?;
  let mut session = shared.lock().await;
  Ok(Json(logic::submit_quiz(&mut session, &body.answers)?))
}

#[instrument(level = "info", skip(state), fields(mission = %body.mission))]
pub async fn http_choose_mission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MissionIn>,
) -> AppResult<Json<SessionView>> {
  let shared = state.session(id).await?;
  let mut session = shared.lock().await;
  Ok(Json(logic::choose_mission(&mut session, body.mission)?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_start_activity(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> AppResult<Json<ActivityOut>> {
  let shared = state.session(id).await?;
  let mut session = shared.lock().await;
  Ok(Json(logic::start_activity(&state, &mut session).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_hint(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> AppResult<Json<HintOut>> {
  let shared = state.session(id).await?;
  let mut session = shared.lock().await;
  Ok(Json(logic::hint(&mut session)?))
}

#[instrument(level = "info", skip(state, body), fields(answer_len = body.answer.len()))]
pub async fn http_submit_activity(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ActivityIn>,
) -> AppResult<Json<Report>> {
  let shared = state.session(id).await?;
  let mut session = shared.lock().await;
  Ok(Json(logic::submit_activity(&state, &mut session, &body.answer).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_report(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> AppResult<Json<Report>> {
  let shared = state.session(id).await?;
  let session = shared.lock().await;
  Ok(Json(logic::report(&session)?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_retry(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
  let shared = state.session(id).await?;
  let mut session = shared.lock().await;
  Ok(Json(logic::retry(&mut session)?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_leave(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> impl IntoResponse {
  let left = state.remove_session(id).await;
  info!(target: "session", %id, left, "HTTP leave");
  Json(LeaveOut { left })
}
