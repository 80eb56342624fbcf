//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; credential tokens are never recorded.

use std::sync::Arc;
use axum::{
  body::Bytes,
  extract::{Path, State},
  http::{header::AUTHORIZATION, HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::error::FlowError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;
use crate::util::bearer_token;

impl IntoResponse for FlowError {
  fn into_response(self) -> Response {
    let status = match &self {
      FlowError::UnknownLesson(_) | FlowError::UnknownFlow(_) => StatusCode::NOT_FOUND,
      FlowError::AnswerRequired | FlowError::InvalidBody(_) => StatusCode::BAD_REQUEST,
    };
    (status, Json(ErrorOut { message: self.to_string() })).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_lessons(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let out: Vec<LessonSummaryOut> = state.lessons().iter().map(to_summary).collect();
  Json(out)
}

#[instrument(level = "info", skip(state), fields(%lesson_id))]
pub async fn http_get_lesson(
  State(state): State<Arc<AppState>>,
  Path(lesson_id): Path<String>,
) -> Result<Json<crate::domain::Lesson>, FlowError> {
  state.lesson(&lesson_id).cloned().map(Json).ok_or(FlowError::UnknownLesson(lesson_id))
}

#[instrument(level = "info", skip(state, headers, body), fields(lesson_id = %body.lesson_id))]
pub async fn http_create_flow(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CreateFlowIn>,
) -> Result<(StatusCode, Json<FlowOut>), FlowError> {
  let token = headers
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(bearer_token);
  let out = start_flow(&state, &body.lesson_id, token).await?;
  info!(target: "lesson_flow", flow_id = %out.flow_id, "HTTP flow created");
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state), fields(%flow_id))]
pub async fn http_get_flow(
  State(state): State<Arc<AppState>>,
  Path(flow_id): Path<String>,
) -> Result<Json<FlowOut>, FlowError> {
  current_flow(&state, &flow_id).await.map(Json)
}

/// An empty body means "no flag"; anything else must parse as `AdvanceIn`.
fn parse_advance_body(body: &[u8]) -> Result<AdvanceIn, FlowError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(AdvanceIn::default());
  }
  serde_json::from_slice(body).map_err(|e| FlowError::InvalidBody(e.to_string()))
}

#[instrument(level = "info", skip(state, body), fields(%flow_id, body_len = body.len()))]
pub async fn http_advance_flow(
  State(state): State<Arc<AppState>>,
  Path(flow_id): Path<String>,
  body: Bytes,
) -> Result<Json<FlowOut>, FlowError> {
  let body = parse_advance_body(&body)?;
  advance_flow(&state, &flow_id, body.answered_correctly).await.map(Json)
}

#[instrument(level = "info", skip(state), fields(%flow_id))]
pub async fn http_start_final_quiz(
  State(state): State<Arc<AppState>>,
  Path(flow_id): Path<String>,
) -> Result<Json<FlowOut>, FlowError> {
  start_final_quiz(&state, &flow_id).await.map(Json)
}

#[instrument(level = "info", skip(state), fields(%flow_id))]
pub async fn http_delete_flow(
  State(state): State<Arc<AppState>>,
  Path(flow_id): Path<String>,
) -> Result<StatusCode, FlowError> {
  discard_flow(&state, &flow_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
