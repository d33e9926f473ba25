//! Loading planner configuration (prompts + optional course bank) from TOML.
//!
//! See `PlannerConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PlannerConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub courses: Vec<CourseCfg>,
}

/// Catalog entry accepted in TOML configuration. Lets a deployment ship its
/// own course bank next to the built-in seeds.
#[derive(Clone, Debug, Deserialize)]
pub struct CourseCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub subtitle: Option<String>,
  #[serde(default)] pub description: Option<String>,
  pub level: String,
  #[serde(default)] pub categories: Vec<String>,
  #[serde(default)] pub rating: Option<f32>,
  #[serde(default)] pub duration: Option<String>,
  #[serde(default)] pub will_learn: Vec<String>,
  #[serde(default)] pub thumbnail: Option<String>,
  #[serde(default)] pub price: Option<f64>,
}

/// Prompts used by the generative-text client. Defaults are sensible for the
/// Vietnamese marketplace copy. Override in TOML to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  // Per-course recommendation reasons (batched)
  pub rationale_system: String,
  pub rationale_user_template: String,
  // Per-phase title/rationale/weeks (batched)
  pub narration_system: String,
  pub narration_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      rationale_system: "You are a course advisor for a Vietnamese e-learning marketplace. Respond ONLY with a strict JSON array, one object per course, in the given order. Each object: {\"reason\": string}. Reasons are Vietnamese, max 100 characters, concrete and student-specific.".into(),
      rationale_user_template: "Student profile:\n- goal: {goal}\n- objectives: {objectives}\n- level: {level}\n- weekly study hours: {weekly}\n- target timeline: {timeline}\n- interested skills: {skills}\n\nCourses (in order):\n{courses}\n\nReturn a JSON array of exactly {count} objects.".into(),
      narration_system: "You are a learning-path coach for a Vietnamese e-learning marketplace. Respond ONLY with a strict JSON array, one object per phase, in the given order. Each object: {\"title\": string, \"rationale\": string, \"estimated_weeks\": integer}. Titles short and motivating, rationale 1-2 Vietnamese sentences tied to the student's goal.".into(),
      narration_user_template: "Student profile:\n- goal: {goal}\n- level: {level}\n- weekly study hours: {weekly}\n- target timeline: {timeline}\n\nPhases (in order):\n{phases}\n\nReturn a JSON array of exactly {count} objects.".into(),
    }
  }
}

/// Attempt to load `PlannerConfig` from PLANNER_CONFIG_PATH. On any
/// parsing/IO error, returns None.
pub fn load_planner_config_from_env() -> Option<PlannerConfig> {
  let path = std::env::var("PLANNER_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<PlannerConfig>(&s) {
      Ok(cfg) => {
        info!(target: "lotrinh_backend", %path, "Loaded planner config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lotrinh_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lotrinh_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
