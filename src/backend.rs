//! Score-submission collaborator.
//!
//! The engine only knows the `ScoreSubmitter` trait; `HttpScoreClient` is the
//! production implementation talking to the learning backend:
//!
//!   POST {base_url}/lessons/{lessonId}/answer
//!   Authorization: Bearer <token>
//!   { "calificacion": "<0-100>" }
//!
//! Tokens are never logged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::SubmitError;
use crate::util::trunc_for_log;

/// Everything one outbound score request carries.
#[derive(Clone, PartialEq, Eq)]
pub struct ScoreSubmission {
  pub token: String,
  pub lesson_id: String,
  /// Integer percentage rendered as a string, e.g. "80".
  pub score: String,
}

impl std::fmt::Debug for ScoreSubmission {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ScoreSubmission")
      .field("token", &"<redacted>")
      .field("lesson_id", &self.lesson_id)
      .field("score", &self.score)
      .finish()
  }
}

#[async_trait]
pub trait ScoreSubmitter: Send + Sync {
  async fn submit(&self, submission: ScoreSubmission) -> Result<(), SubmitError>;
}

#[derive(Serialize)]
struct AnswerBody<'a> {
  calificacion: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  error: Option<String>,
}

#[derive(Clone)]
pub struct HttpScoreClient {
  pub client: reqwest::Client,
  pub base_url: String,
}

impl HttpScoreClient {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmitError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
  }

  pub fn answer_url(&self, lesson_id: &str) -> String {
    format!("{}/lessons/{}/answer", self.base_url, lesson_id)
  }
}

#[async_trait]
impl ScoreSubmitter for HttpScoreClient {
  #[instrument(level = "info", skip(self, submission), fields(lesson_id = %submission.lesson_id, score = %submission.score))]
  async fn submit(&self, submission: ScoreSubmission) -> Result<(), SubmitError> {
    if submission.token.trim().is_empty() {
      return Err(SubmitError::MissingToken);
    }

    let url = self.answer_url(&submission.lesson_id);
    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "lesson-flow/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", submission.token))
      .json(&AnswerBody { calificacion: &submission.score })
      .send().await?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let msg = extract_error(&body).unwrap_or(body);
      return Err(SubmitError::HttpStatus { status, body: trunc_for_log(&msg, 256) });
    }

    info!(elapsed = ?start.elapsed(), %status, "Score accepted by backend");
    Ok(())
  }
}

/// Pull a human message out of a JSON error body, if there is one.
fn extract_error(body: &str) -> Option<String> {
  let parsed: ErrorBody = serde_json::from_str(body).ok()?;
  parsed.message.or(parsed.error)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn answer_url_joins_without_double_slash() {
    let client = HttpScoreClient::new("https://api.example.com/", Duration::from_secs(5)).expect("client");
    assert_eq!(client.answer_url("42"), "https://api.example.com/lessons/42/answer");
  }

  #[test]
  fn body_uses_calificacion_field() {
    let json = serde_json::to_value(AnswerBody { calificacion: "80" }).expect("json");
    assert_eq!(json, serde_json::json!({ "calificacion": "80" }));
  }

  #[test]
  fn error_body_prefers_message() {
    assert_eq!(extract_error(r#"{"message":"token expired"}"#).as_deref(), Some("token expired"));
    assert_eq!(extract_error(r#"{"error":"nope"}"#).as_deref(), Some("nope"));
    assert_eq!(extract_error("<html>"), None);
  }

  #[test]
  fn debug_output_hides_token() {
    let s = ScoreSubmission { token: "secret".into(), lesson_id: "1".into(), score: "100".into() };
    assert!(!format!("{s:?}").contains("secret"));
  }

  #[tokio::test]
  async fn blank_token_is_rejected_before_any_request() {
    let client = HttpScoreClient::new("http://127.0.0.1:9", Duration::from_secs(1)).expect("client");
    let err = client
      .submit(ScoreSubmission { token: "  ".into(), lesson_id: "1".into(), score: "0".into() })
      .await
      .unwrap_err();
    assert!(matches!(err, SubmitError::MissingToken));
  }
}
