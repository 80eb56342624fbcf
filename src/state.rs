//! Application state: lesson bank, live lesson-flow attempts, and the score submitter.
//!
//! This module owns:
//!   - the lesson bank (TOML lessons first, then built-in seeds; ids are unique)
//!   - one `LessonFlowEngine` per live attempt, keyed by a generated flow id;
//!     finished attempts are dropped and idle ones expire after `idle_ttl`
//!   - the shared `ScoreSubmitter` every engine reports to

use std::{
  collections::HashMap,
  sync::Arc,
  time::{Duration, Instant},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::backend::{HttpScoreClient, ScoreSubmitter};
use crate::config::{load_flow_config_from_env, FlowConfig};
use crate::domain::{FlowState, Lesson};
use crate::engine::LessonFlowEngine;
use crate::error::SubmitError;
use crate::seeds::seed_lessons;

pub type SharedFlow = Arc<Mutex<LessonFlowEngine>>;

struct FlowSlot {
  flow: SharedFlow,
  touched: Instant,
}

pub struct AppState {
  lessons: Vec<Lesson>,
  by_id: HashMap<String, usize>,
  flows: RwLock<HashMap<String, FlowSlot>>,
  idle_ttl: Duration,
  submitter: Arc<dyn ScoreSubmitter>,
}

impl AppState {
  /// Build state from env: load config, build the lesson bank, init the backend client.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Result<Self, SubmitError> {
    let cfg = load_flow_config_from_env();
    let client = HttpScoreClient::new(&cfg.backend.base_url, Duration::from_secs(cfg.backend.timeout_secs))?;
    info!(target: "lesson_flow", base_url = %client.base_url, timeout_secs = cfg.backend.timeout_secs, "Score backend configured");
    Ok(Self::from_config(&cfg, Arc::new(client)))
  }

  pub fn from_config(cfg: &FlowConfig, submitter: Arc<dyn ScoreSubmitter>) -> Self {
    let mut lessons = Vec::<Lesson>::new();
    let mut by_id = HashMap::<String, usize>::new();

    for lc in &cfg.lessons {
      let id = match &lc.id {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => {
          error!(target: "lesson_flow", title = ?lc.title, "Skipping bank lesson: missing id.");
          continue;
        }
      };
      if by_id.contains_key(&id) {
        error!(target: "lesson_flow", %id, "Skipping bank lesson: duplicate id.");
        continue;
      }
      by_id.insert(id.clone(), lessons.len());
      lessons.push(Lesson {
        title: lc.title.clone().unwrap_or_else(|| id.clone()),
        id,
        steps: lc.steps.clone(),
      });
    }

    // Seeds never overwrite bank lessons.
    for lesson in seed_lessons() {
      if !by_id.contains_key(&lesson.id) {
        by_id.insert(lesson.id.clone(), lessons.len());
        lessons.push(lesson);
      }
    }

    for l in &lessons {
      info!(target: "lesson_flow", id = %l.id, steps = l.steps.len(), "Lesson available");
    }

    Self {
      lessons,
      by_id,
      flows: RwLock::new(HashMap::new()),
      idle_ttl: Duration::from_secs(cfg.flows.idle_ttl_secs),
      submitter,
    }
  }

  pub fn lessons(&self) -> &[Lesson] {
    &self.lessons
  }

  pub fn lesson(&self, id: &str) -> Option<&Lesson> {
    self.by_id.get(id).map(|&i| &self.lessons[i])
  }

  /// Start a new attempt for `lesson` and return its id and initial state.
  /// Attempts that start finished (empty lessons) are never stored.
  #[instrument(level = "info", skip(self, lesson, token), fields(lesson_id = %lesson.id))]
  pub async fn create_flow(&self, lesson: &Lesson, token: String) -> (String, FlowState) {
    let engine = LessonFlowEngine::new(
      lesson.steps.clone(),
      token,
      lesson.id.clone(),
      Arc::clone(&self.submitter),
    );
    let state = engine.state();
    let flow_id = Uuid::new_v4().to_string();
    if !state.is_finished() {
      let now = Instant::now();
      let mut flows = self.flows.write().await;
      let before = flows.len();
      flows.retain(|_, slot| now.duration_since(slot.touched) < self.idle_ttl);
      if flows.len() < before {
        debug!(target: "lesson_flow", expired = before - flows.len(), "Expired idle flows");
      }
      flows.insert(flow_id.clone(), FlowSlot { flow: Arc::new(Mutex::new(engine)), touched: now });
    }
    info!(target: "lesson_flow", %flow_id, state = state.label(), "Flow started");
    (flow_id, state)
  }

  /// Look up a live attempt and mark it as recently used.
  pub async fn flow(&self, flow_id: &str) -> Option<SharedFlow> {
    let mut flows = self.flows.write().await;
    let slot = flows.get_mut(flow_id)?;
    slot.touched = Instant::now();
    Some(Arc::clone(&slot.flow))
  }

  #[instrument(level = "debug", skip(self), fields(%flow_id))]
  pub async fn remove_flow(&self, flow_id: &str) -> bool {
    self.flows.write().await.remove(flow_id).is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::LessonCfg;
  use crate::domain::LessonStep;
  use crate::test_support::NullSubmitter;

  fn cfg(lessons: Vec<LessonCfg>) -> FlowConfig {
    FlowConfig { lessons, ..FlowConfig::default() }
  }

  #[test]
  fn bank_lessons_come_first_and_shadow_seeds() {
    let state = AppState::from_config(
      &cfg(vec![
        LessonCfg { id: Some("saludos-1".into()), title: Some("Mis saludos".into()), steps: vec![LessonStep::new("Hola", "h.gif")] },
        LessonCfg { id: None, title: Some("sin id".into()), steps: vec![] },
        LessonCfg { id: Some("saludos-1".into()), title: None, steps: vec![] },
      ]),
      Arc::new(NullSubmitter),
    );
    assert_eq!(state.lessons()[0].id, "saludos-1");
    assert_eq!(state.lesson("saludos-1").map(|l| l.title.as_str()), Some("Mis saludos"));
    assert_eq!(state.lessons().iter().filter(|l| l.id == "saludos-1").count(), 1);
    assert!(state.lesson("abecedario-1").is_some());
  }

  #[tokio::test]
  async fn flows_are_created_looked_up_and_removed() {
    let state = AppState::from_config(&FlowConfig::default(), Arc::new(NullSubmitter));
    let lesson = state.lesson("saludos-1").cloned().expect("seed lesson");
    let (id, first) = state.create_flow(&lesson, "tok".into()).await;
    assert_eq!(first, FlowState::Practice { step: lesson.steps[0].clone() });

    let flow = state.flow(&id).await.expect("flow");
    assert!(flow.lock().await.advance(false));
    assert!(state.remove_flow(&id).await);
    assert!(state.flow(&id).await.is_none());
    assert!(!state.remove_flow(&id).await);
  }

  #[tokio::test]
  async fn idle_flows_expire_when_a_new_one_starts() {
    let mut config = FlowConfig::default();
    config.flows.idle_ttl_secs = 0;
    let state = AppState::from_config(&config, Arc::new(NullSubmitter));
    let lesson = state.lesson("saludos-1").cloned().expect("seed lesson");

    let (stale, _) = state.create_flow(&lesson, "tok".into()).await;
    let (fresh, _) = state.create_flow(&lesson, "tok".into()).await;
    assert!(state.flow(&stale).await.is_none());
    assert!(state.flow(&fresh).await.is_some());
    assert_eq!(state.flows.read().await.len(), 1);
  }

  #[tokio::test]
  async fn empty_lessons_are_never_held() {
    let state = AppState::from_config(&FlowConfig::default(), Arc::new(NullSubmitter));
    let empty = Lesson { id: "vacia".into(), title: "Vacía".into(), steps: vec![] };
    let (id, first) = state.create_flow(&empty, "tok".into()).await;
    assert!(first.is_finished());
    assert!(state.flow(&id).await.is_none());
    assert!(state.flows.read().await.is_empty());
  }
}
