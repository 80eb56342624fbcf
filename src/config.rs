//! Loading service configuration (backend endpoint + optional lesson bank) from TOML.
//!
//! Schema:
//!
//! ```toml
//! [backend]
//! base_url = "https://api.example.com"
//! timeout_secs = 20
//!
//! [flows]
//! idle_ttl_secs = 1800
//!
//! [[lessons]]
//! id = "abecedario-1"
//! title = "Abecedario"
//! [[lessons.steps]]
//! title = "A"
//! media = "https://cdn.example.com/signs/a.gif"
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::LessonStep;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_IDLE_TTL_SECS: u64 = 1800;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct FlowConfig {
  #[serde(default)]
  pub backend: BackendCfg,
  #[serde(default)]
  pub flows: FlowsCfg,
  #[serde(default)]
  pub lessons: Vec<LessonCfg>,
}

/// Live attempts untouched for `idle_ttl_secs` are dropped.
#[derive(Clone, Debug, Deserialize)]
pub struct FlowsCfg {
  #[serde(default = "default_idle_ttl_secs")]
  pub idle_ttl_secs: u64,
}

impl Default for FlowsCfg {
  fn default() -> Self {
    Self { idle_ttl_secs: default_idle_ttl_secs() }
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackendCfg {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for BackendCfg {
  fn default() -> Self {
    Self { base_url: default_base_url(), timeout_secs: default_timeout_secs() }
  }
}

fn default_base_url() -> String { DEFAULT_BASE_URL.into() }
fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }
fn default_idle_ttl_secs() -> u64 { DEFAULT_IDLE_TTL_SECS }

/// Lesson entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct LessonCfg {
  #[serde(default)] pub id: Option<String>,
  #[serde(default)] pub title: Option<String>,
  #[serde(default)] pub steps: Vec<LessonStep>,
}

impl FlowConfig {
  pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(s)
  }

  /// Environment overrides on top of whatever the file said.
  pub fn apply_env(&mut self) {
    if let Ok(url) = std::env::var("BACKEND_BASE_URL") {
      if !url.trim().is_empty() {
        self.backend.base_url = url;
      }
    }
  }
}

/// Load `FlowConfig` from FLOW_CONFIG_PATH (if set) then apply env overrides.
/// Any IO/parse error is logged and defaults are used instead.
pub fn load_flow_config_from_env() -> FlowConfig {
  let mut cfg = match std::env::var("FLOW_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match FlowConfig::parse(&s) {
        Ok(cfg) => {
          info!(target: "lesson_flow", %path, lessons = cfg.lessons.len(), "Loaded flow config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "lesson_flow", %path, error = %e, "Failed to parse TOML config");
          FlowConfig::default()
        }
      },
      Err(e) => {
        error!(target: "lesson_flow", %path, error = %e, "Failed to read TOML config file");
        FlowConfig::default()
      }
    },
    Err(_) => FlowConfig::default(),
  };
  cfg.apply_env();
  cfg
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_backend_and_lessons() {
    let cfg = FlowConfig::parse(
      r#"
        [backend]
        base_url = "https://api.example.com"

        [[lessons]]
        id = "l1"
        title = "Colores"
        [[lessons.steps]]
        title = "Rojo"
        media = "rojo.gif"
        [[lessons.steps]]
        title = "Azul"
        media = "azul.gif"
      "#,
    )
    .expect("config");
    assert_eq!(cfg.backend.base_url, "https://api.example.com");
    assert_eq!(cfg.backend.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(cfg.lessons.len(), 1);
    assert_eq!(cfg.lessons[0].steps[1], LessonStep::new("Azul", "azul.gif"));
  }

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = FlowConfig::parse("").expect("config");
    assert_eq!(cfg.backend.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.flows.idle_ttl_secs, DEFAULT_IDLE_TTL_SECS);
    assert!(cfg.lessons.is_empty());
  }

  #[test]
  fn malformed_toml_is_an_error() {
    assert!(FlowConfig::parse("[[lessons]\nid = ").is_err());
  }
}
