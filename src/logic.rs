//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting a lesson attempt from the lesson bank
//!   - Advancing an attempt / starting its final quiz
//!   - Reading and discarding attempts (finished attempts are dropped once
//!     their final snapshot is returned)

use tracing::{info, instrument, warn};

use crate::domain::FlowState;
use crate::error::FlowError;
use crate::protocol::FlowOut;
use crate::state::AppState;

#[instrument(level = "info", skip(state, token), fields(%lesson_id, has_token = token.is_some()))]
pub async fn start_flow(state: &AppState, lesson_id: &str, token: Option<String>) -> Result<FlowOut, FlowError> {
  let lesson = state.lesson(lesson_id).ok_or_else(|| FlowError::UnknownLesson(lesson_id.to_string()))?;
  if token.is_none() {
    warn!(target: "lesson_flow", %lesson_id, "Flow started without a credential token; the score will not be submitted");
  }
  let (flow_id, first) = state.create_flow(lesson, token.unwrap_or_default()).await;
  Ok(FlowOut { flow_id, lesson_id: lesson.id.clone(), applied: true, state: first })
}

#[instrument(level = "debug", skip(state), fields(%flow_id))]
pub async fn current_flow(state: &AppState, flow_id: &str) -> Result<FlowOut, FlowError> {
  let flow = state.flow(flow_id).await.ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))?;
  let engine = flow.lock().await;
  Ok(FlowOut {
    flow_id: flow_id.to_string(),
    lesson_id: engine.lesson_id().to_string(),
    applied: false,
    state: engine.state(),
  })
}

/// The correctness flag may be omitted everywhere except on a final-quiz question.
#[instrument(level = "info", skip(state), fields(%flow_id, ?answered_correctly))]
pub async fn advance_flow(state: &AppState, flow_id: &str, answered_correctly: Option<bool>) -> Result<FlowOut, FlowError> {
  let flow = state.flow(flow_id).await.ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))?;
  let mut engine = flow.lock().await;

  let answered = match (engine.state(), answered_correctly) {
    (FlowState::FinalQuiz { .. }, None) => return Err(FlowError::AnswerRequired),
    (_, flag) => flag.unwrap_or(false),
  };
  let applied = engine.advance(answered);
  let out = FlowOut { flow_id: flow_id.to_string(), lesson_id: engine.lesson_id().to_string(), applied, state: engine.state() };
  let correct = engine.context().final_quiz_score;
  drop(engine);

  if out.state.is_finished() {
    state.remove_flow(flow_id).await;
    info!(target: "lesson_flow", %flow_id, correct, "Flow finished and released");
  }
  Ok(out)
}

#[instrument(level = "info", skip(state), fields(%flow_id))]
pub async fn start_final_quiz(state: &AppState, flow_id: &str) -> Result<FlowOut, FlowError> {
  let flow = state.flow(flow_id).await.ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))?;
  let mut engine = flow.lock().await;
  let applied = engine.start_final_quiz();
  Ok(FlowOut { flow_id: flow_id.to_string(), lesson_id: engine.lesson_id().to_string(), applied, state: engine.state() })
}

#[instrument(level = "info", skip(state), fields(%flow_id))]
pub async fn discard_flow(state: &AppState, flow_id: &str) -> Result<(), FlowError> {
  if state.remove_flow(flow_id).await {
    Ok(())
  } else {
    Err(FlowError::UnknownFlow(flow_id.to_string()))
  }
}
