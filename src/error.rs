//! Error types: score submission (logged only) and client-facing flow errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
  #[error("no credential token available")]
  MissingToken,
  #[error("score submission failed with status {status}: {body}")]
  HttpStatus { status: reqwest::StatusCode, body: String },
  #[error(transparent)]
  Http(#[from] reqwest::Error),
}

/// Failures reported to HTTP/WebSocket clients driving a flow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
  #[error("unknown lesson: {0}")]
  UnknownLesson(String),
  #[error("unknown flow: {0}")]
  UnknownFlow(String),
  #[error("answeredCorrectly is required while a final-quiz question is shown")]
  AnswerRequired,
  #[error("invalid request body: {0}")]
  InvalidBody(String),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn submit_errors_render_for_logs() {
    for err in [
      SubmitError::MissingToken,
      SubmitError::HttpStatus { status: reqwest::StatusCode::UNAUTHORIZED, body: "token expired".into() },
    ] {
      let text = match &err {
        SubmitError::MissingToken => "no credential token available".to_string(),
        SubmitError::HttpStatus { status, body } => format!("score submission failed with status {status}: {body}"),
        SubmitError::Http(e) => e.to_string(),
      };
      assert_eq!(err.to_string(), text);
    }
    assert_eq!(
      FlowError::InvalidBody("expected value".into()).to_string(),
      "invalid request body: expected value"
    );
  }
}
