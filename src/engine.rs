//! Lesson-flow state machine.
//!
//! A lesson runs as: Practice(step) -> Question(step) for every step in order,
//! then FinalQuizIntro, then five FinalQuiz questions, then Finished. The final
//! transition fires one best-effort score submission.
//!
//! `FlowContext` is plain data and `transition` is a pure function over it
//! (randomness comes in through the `rng` argument). `LessonFlowEngine` owns a
//! context, keeps the published state in a watch cell, and spawns the
//! submission without waiting for it.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::backend::{ScoreSubmission, ScoreSubmitter};
use crate::domain::{FlowState, LessonStep};
use crate::quiz::{generate_answers, sample_final_quiz, score_percentage, FINAL_QUIZ_QUESTIONS};

/// Progress bookkeeping. Never shown to the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlowContext {
  pub current_step_index: usize,
  pub is_question_phase: bool,
  pub is_final_quiz: bool,
  pub final_quiz_count: usize,
  pub final_quiz_steps: Vec<LessonStep>,
  pub final_quiz_score: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowInput {
  Advance { answered_correctly: bool },
  StartFinalQuiz,
}

/// Side effect requested by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowEffect {
  SubmitScore { correct: usize, percentage: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
  pub context: FlowContext,
  pub state: FlowState,
  pub effect: Option<FlowEffect>,
}

/// Caller misuse. Turned into a logged no-op by the engine.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Misuse {
  #[error("flow already finished")]
  AfterFinished,
  #[error("final quiz can only start from the intro")]
  NotAtIntro,
  #[error("final quiz intro is showing; start the final quiz first")]
  AwaitingFinalQuizStart,
  #[error("final quiz has no steps")]
  NoFinalQuizSteps,
}

/// First state for a step sequence. Empty lessons are finished from the start.
pub fn initial(steps: &[LessonStep]) -> (FlowContext, FlowState) {
  let state = match steps.first() {
    Some(step) => FlowState::Practice { step: step.clone() },
    None => FlowState::Finished,
  };
  (FlowContext::default(), state)
}

/// Final-quiz questions cycle through the sample when it holds fewer than five steps.
fn final_quiz_step(ctx: &FlowContext, count: usize) -> Option<&LessonStep> {
  if ctx.final_quiz_steps.is_empty() {
    return None;
  }
  ctx.final_quiz_steps.get(count % ctx.final_quiz_steps.len())
}

pub fn transition<R: Rng + ?Sized>(
  steps: &[LessonStep],
  ctx: &FlowContext,
  current: &FlowState,
  input: FlowInput,
  rng: &mut R,
) -> Result<Transition, Misuse> {
  if current.is_finished() {
    return Err(Misuse::AfterFinished);
  }
  let mut next = ctx.clone();

  let answered_correctly = match input {
    FlowInput::StartFinalQuiz => {
      if !matches!(current, FlowState::FinalQuizIntro) {
        return Err(Misuse::NotAtIntro);
      }
      let step = final_quiz_step(ctx, 0).ok_or(Misuse::NoFinalQuizSteps)?.clone();
      let answers = generate_answers(steps, &step.title, rng);
      return Ok(Transition {
        context: next,
        state: FlowState::FinalQuiz { step, answers, question_number: 1 },
        effect: None,
      });
    }
    FlowInput::Advance { answered_correctly } => answered_correctly,
  };

  if matches!(current, FlowState::FinalQuizIntro) {
    return Err(Misuse::AwaitingFinalQuizStart);
  }

  if next.is_final_quiz {
    if answered_correctly {
      next.final_quiz_score += 1;
    }
    next.final_quiz_count += 1;

    if next.final_quiz_count < FINAL_QUIZ_QUESTIONS {
      let step = final_quiz_step(&next, next.final_quiz_count).ok_or(Misuse::NoFinalQuizSteps)?.clone();
      let answers = generate_answers(steps, &step.title, rng);
      let question_number = next.final_quiz_count + 1;
      return Ok(Transition {
        context: next,
        state: FlowState::FinalQuiz { step, answers, question_number },
        effect: None,
      });
    }

    let effect = FlowEffect::SubmitScore {
      correct: next.final_quiz_score,
      percentage: score_percentage(next.final_quiz_score),
    };
    return Ok(Transition { context: next, state: FlowState::Finished, effect: Some(effect) });
  }

  if !next.is_question_phase {
    let Some(step) = steps.get(next.current_step_index).cloned() else {
      return Ok(Transition { context: next, state: FlowState::Finished, effect: None });
    };
    let answers = generate_answers(steps, &step.title, rng);
    next.is_question_phase = true;
    return Ok(Transition { context: next, state: FlowState::Question { step, answers }, effect: None });
  }

  next.current_step_index += 1;
  next.is_question_phase = false;
  if let Some(step) = steps.get(next.current_step_index) {
    let state = FlowState::Practice { step: step.clone() };
    return Ok(Transition { context: next, state, effect: None });
  }

  next.final_quiz_steps = sample_final_quiz(steps, rng);
  next.final_quiz_count = 0;
  next.final_quiz_score = 0;
  next.is_final_quiz = true;
  Ok(Transition { context: next, state: FlowState::FinalQuizIntro, effect: None })
}

/// One lesson attempt. Driven by one caller at a time; discarded once finished.
pub struct LessonFlowEngine {
  steps: Vec<LessonStep>,
  token: String,
  lesson_id: String,
  submitter: Arc<dyn ScoreSubmitter>,
  context: FlowContext,
  state_tx: watch::Sender<FlowState>,
  rng: StdRng,
}

impl LessonFlowEngine {
  pub fn new(
    steps: Vec<LessonStep>,
    token: String,
    lesson_id: String,
    submitter: Arc<dyn ScoreSubmitter>,
  ) -> Self {
    Self::with_rng(steps, token, lesson_id, submitter, StdRng::from_entropy())
  }

  pub fn with_rng(
    steps: Vec<LessonStep>,
    token: String,
    lesson_id: String,
    submitter: Arc<dyn ScoreSubmitter>,
    rng: StdRng,
  ) -> Self {
    let (context, state) = initial(&steps);
    debug!(target: "flow", %lesson_id, steps = steps.len(), state = state.label(), "Flow created");
    let (state_tx, _) = watch::channel(state);
    Self { steps, token, lesson_id, submitter, context, state_tx, rng }
  }

  pub fn state(&self) -> FlowState {
    self.state_tx.borrow().clone()
  }

  pub fn context(&self) -> &FlowContext {
    &self.context
  }

  pub fn lesson_id(&self) -> &str {
    &self.lesson_id
  }

  /// Move one step forward. `answered_correctly` only matters for final-quiz
  /// questions. Returns whether a transition happened.
  pub fn advance(&mut self, answered_correctly: bool) -> bool {
    self.apply(FlowInput::Advance { answered_correctly })
  }

  /// Leave the final-quiz intro and show question 1.
  pub fn start_final_quiz(&mut self) -> bool {
    self.apply(FlowInput::StartFinalQuiz)
  }

  fn apply(&mut self, input: FlowInput) -> bool {
    let current = self.state();
    match transition(&self.steps, &self.context, &current, input, &mut self.rng) {
      Ok(t) => {
        debug!(target: "flow", lesson_id = %self.lesson_id, from = current.label(), to = t.state.label(), ?input, "Flow transition");
        self.context = t.context;
        self.state_tx.send_replace(t.state);
        if let Some(FlowEffect::SubmitScore { correct, percentage }) = t.effect {
          self.submit_score(correct, percentage);
        }
        true
      }
      Err(misuse) => {
        warn!(target: "flow", lesson_id = %self.lesson_id, state = current.label(), ?input, reason = %misuse, "Ignoring flow input");
        false
      }
    }
  }

  /// Fire-and-forget. `Finished` is already published when this runs.
  fn submit_score(&self, correct: usize, percentage: u32) {
    if self.token.trim().is_empty() {
      warn!(target: "flow", lesson_id = %self.lesson_id, %percentage, "No credential token; skipping score submission");
      return;
    }
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
      error!(target: "flow", lesson_id = %self.lesson_id, %percentage, "No async runtime; score not submitted");
      return;
    };

    let submission = ScoreSubmission {
      token: self.token.clone(),
      lesson_id: self.lesson_id.clone(),
      score: percentage.to_string(),
    };
    let submitter = Arc::clone(&self.submitter);
    let span = info_span!(target: "flow", "score_submission", lesson_id = %self.lesson_id, correct, percentage);
    handle.spawn(
      async move {
        match submitter.submit(submission).await {
          Ok(()) => info!(target: "flow", "Score submitted"),
          Err(e) => error!(target: "flow", error = %e, "Score submission failed"),
        }
      }
      .instrument(span),
    );
  }
}
