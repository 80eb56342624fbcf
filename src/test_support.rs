//! Shared fakes for unit tests.

use async_trait::async_trait;

use crate::backend::{ScoreSubmission, ScoreSubmitter};
use crate::error::SubmitError;

/// Accepts every submission and does nothing.
pub struct NullSubmitter;

#[async_trait]
impl ScoreSubmitter for NullSubmitter {
  async fn submit(&self, _submission: ScoreSubmission) -> Result<(), SubmitError> {
    Ok(())
  }
}
