//! Domain models: lesson steps, lessons, and the observable flow state.

use serde::{Deserialize, Serialize};

/// One unit of practice content. Identity is by `title`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonStep {
  pub title: String,
  /// Image/video locator shown on the practice screen.
  pub media: String,
}

impl LessonStep {
  pub fn new(title: impl Into<String>, media: impl Into<String>) -> Self {
    Self { title: title.into(), media: media.into() }
  }
}

/// A lesson as served by the bank: an ordered, immutable list of steps.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub steps: Vec<LessonStep>,
}

/// What the client should currently present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowState {
  Practice {
    step: LessonStep,
  },
  Question {
    step: LessonStep,
    answers: Vec<String>,
  },
  FinalQuizIntro,
  FinalQuiz {
    step: LessonStep,
    answers: Vec<String>,
    #[serde(rename = "questionNumber")]
    question_number: usize,
  },
  Finished,
}

impl FlowState {
  pub fn is_finished(&self) -> bool {
    matches!(self, FlowState::Finished)
  }

  /// Short name for logs.
  pub fn label(&self) -> &'static str {
    match self {
      FlowState::Practice { .. } => "practice",
      FlowState::Question { .. } => "question",
      FlowState::FinalQuizIntro => "final_quiz_intro",
      FlowState::FinalQuiz { .. } => "final_quiz",
      FlowState::Finished => "finished",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn final_quiz_state_serializes_with_camel_question_number() {
    let state = FlowState::FinalQuiz {
      step: LessonStep::new("A", "a.gif"),
      answers: vec!["A".into(), "B".into()],
      question_number: 2,
    };
    let json = serde_json::to_value(&state).expect("json");
    assert_eq!(json["type"], "final_quiz");
    assert_eq!(json["questionNumber"], 2);
    assert_eq!(json["step"]["title"], "A");
  }

  #[test]
  fn unit_variants_carry_only_the_tag() {
    let json = serde_json::to_value(FlowState::FinalQuizIntro).expect("json");
    assert_eq!(json, serde_json::json!({ "type": "final_quiz_intro" }));
    assert!(FlowState::Finished.is_finished());
  }
}
