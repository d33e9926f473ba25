//! Phase narration: one batched generative call for per-phase titles,
//! rationales, and (optionally) revised week estimates, with deterministic
//! Vietnamese templates when the collaborator is unusable.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{error, instrument};

use crate::config::Prompts;
use crate::domain::{Level, Phase, PreferenceProfile};
use crate::engine::phases::human_time_for_weeks;
use crate::genai::{generate_with_retry, GenRequest, TextGenerationPort};
use crate::util::fill_template;

const FALLBACK_TITLE_TEMPLATE: &str = "Giai Đoạn {n}: {level}";
const FALLBACK_FIRST_TEMPLATE: &str =
  "Khởi đầu với các khóa {level} để xây nền tảng vững chắc cho mục tiêu \"{goal}\".";
const FALLBACK_MIDDLE_TEMPLATE: &str =
  "Tiếp tục nâng dần độ khó từ nền tảng {level}, giữ nhịp học đều đặn để về đích trong {timeline}.";
const FALLBACK_LAST_TEMPLATE: &str =
  "Chặng cuối ở cấp độ {level}: hoàn thiện kỹ năng và chạm tới mục tiêu \"{goal}\" đúng hạn {timeline}.";

/// Fill title/rationale on every phase, in place. An AI-supplied
/// `estimated_weeks` overrides the computed value for that phase;
/// days and the display string are always re-derived from the final weeks.
#[instrument(level = "info", skip_all, fields(phases = phases.len(), ai = port.is_some()))]
pub async fn narrate(
  port: Option<&dyn TextGenerationPort>,
  prompts: &Prompts,
  profile: &PreferenceProfile,
  phases: &mut [Phase],
  levels_by_course: &HashMap<String, Level>,
) {
  if phases.is_empty() {
    return;
  }

  let items = match port {
    Some(port) => match request_narration(port, prompts, profile, phases, levels_by_course).await {
      Ok(items) => Some(items),
      Err(e) => {
        error!(target: "pathgen", error = %e, "Phase narration failed; using template fallback");
        None
      }
    },
    None => None,
  };

  let total = phases.len();
  for (i, phase) in phases.iter_mut().enumerate() {
    let entry = items.as_ref().and_then(|v| v.get(i));
    apply_narration(phase, entry, i, total, profile, levels_by_course);
  }
}

async fn request_narration(
  port: &dyn TextGenerationPort,
  prompts: &Prompts,
  profile: &PreferenceProfile,
  phases: &[Phase],
  levels_by_course: &HashMap<String, Level>,
) -> Result<Vec<Value>, crate::genai::GenAiError> {
  let phase_lines: Vec<String> = phases
    .iter()
    .map(|p| {
      let levels: Vec<&str> = p
        .courses
        .iter()
        .filter_map(|c| c.course_id.as_deref())
        .filter_map(|id| levels_by_course.get(id))
        .map(|l| l.label_vi())
        .collect();
      format!(
        "{}. courses={} hours={:.1} computed_weeks={} levels=[{}]",
        p.order,
        p.courses.len(),
        p.total_hours,
        p.estimated_weeks,
        levels.join(", "),
      )
    })
    .collect();

  let user = fill_template(
    &prompts.narration_user_template,
    &[
      ("goal", &profile.learning_goal),
      ("level", profile.current_level.label_vi()),
      ("weekly", &profile.weekly_study_hours),
      ("timeline", &profile.target_completion_time),
      ("phases", &phase_lines.join("\n")),
      ("count", &phases.len().to_string()),
    ],
  );

  let req = GenRequest {
    instructions: prompts.narration_system.clone(),
    prompt: user,
    temperature: 0.7,
    max_tokens: Some(phases.len() as u32 * 120 + 200),
    expected_len: phases.len(),
  };

  generate_with_retry(port, &req).await
}

fn apply_narration(
  phase: &mut Phase,
  entry: Option<&Value>,
  index: usize,
  total: usize,
  profile: &PreferenceProfile,
  levels_by_course: &HashMap<String, Level>,
) {
  let level = dominant_level(phase, levels_by_course);

  phase.title = entry
    .and_then(|e| non_empty_str(e, "title"))
    .unwrap_or_else(|| fallback_title(phase.order, level));

  phase.phase_rationale = entry
    .and_then(|e| non_empty_str(e, "rationale"))
    .unwrap_or_else(|| fallback_rationale(index, total, level, profile));

  if let Some(weeks) = entry.and_then(ai_weeks) {
    phase.estimated_weeks = weeks;
    phase.estimated_days = weeks * 7;
    phase.estimated_time = human_time_for_weeks(weeks);
  }
}

fn non_empty_str(entry: &Value, key: &str) -> Option<String> {
  entry
    .get(key)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
}

/// The narrator may express weeks as a number or a numeric string.
fn ai_weeks(entry: &Value) -> Option<u32> {
  let v = entry.get("estimated_weeks").or_else(|| entry.get("estimatedWeeks"))?;
  let weeks = match v {
    Value::Number(n) => n.as_u64()?,
    Value::String(s) => s.trim().parse::<u64>().ok()?,
    _ => return None,
  };
  (weeks >= 1).then_some(weeks.min(u64::from(u32::MAX)) as u32)
}

/// Most frequent course level in the phase; ties break toward the harder
/// level since later material dominates the phase's character.
fn dominant_level(phase: &Phase, levels_by_course: &HashMap<String, Level>) -> Level {
  let mut counts: HashMap<Level, usize> = HashMap::new();
  for c in &phase.courses {
    if let Some(level) = c.course_id.as_deref().and_then(|id| levels_by_course.get(id)) {
      *counts.entry(*level).or_insert(0) += 1;
    }
  }
  counts
    .into_iter()
    .max_by_key(|(level, n)| (*n, level.rank()))
    .map(|(level, _)| level)
    .unwrap_or(Level::Beginner)
}

fn fallback_title(order: u32, level: Level) -> String {
  fill_template(
    FALLBACK_TITLE_TEMPLATE,
    &[("n", &order.to_string()), ("level", level.label_vi())],
  )
}

fn fallback_rationale(index: usize, total: usize, level: Level, profile: &PreferenceProfile) -> String {
  let template = if index == 0 {
    FALLBACK_FIRST_TEMPLATE
  } else if index + 1 == total {
    FALLBACK_LAST_TEMPLATE
  } else {
    FALLBACK_MIDDLE_TEMPLATE
  };
  fill_template(
    template,
    &[
      ("level", level.label_vi()),
      ("goal", &profile.learning_goal),
      ("timeline", &profile.target_completion_time),
    ],
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::PhaseCourse;
  use crate::genai::GenAiError;
  use async_trait::async_trait;
  use chrono::Utc;

  struct ScriptedPort(Vec<Value>);

  #[async_trait]
  impl TextGenerationPort for ScriptedPort {
    async fn generate_array(&self, _req: &GenRequest) -> Result<Vec<Value>, GenAiError> {
      Ok(self.0.clone())
    }
  }

  struct DeadPort;

  #[async_trait]
  impl TextGenerationPort for DeadPort {
    async fn generate_array(&self, _req: &GenRequest) -> Result<Vec<Value>, GenAiError> {
      Err(GenAiError::Status { status: 503, message: "unavailable".into() })
    }
  }

  fn phase(order: u32, ids: &[&str], weeks: u32) -> Phase {
    Phase {
      title: String::new(),
      description: "2 khóa học".into(),
      phase_rationale: String::new(),
      order,
      estimated_weeks: weeks,
      estimated_days: weeks * 7,
      estimated_time: human_time_for_weeks(weeks),
      total_hours: 10.0,
      courses: ids
        .iter()
        .enumerate()
        .map(|(j, id)| PhaseCourse {
          course_id: Some((*id).to_string()),
          title: None,
          reason: "r".into(),
          order: (j + 1) as u32,
          match_score: 50,
          estimated_hours: 5.0,
        })
        .collect(),
    }
  }

  fn profile() -> PreferenceProfile {
    PreferenceProfile {
      student_id: "s1".into(),
      learning_goal: "thành thạo backend".into(),
      objectives: vec![],
      interested_skills: vec!["backend".into()],
      current_level: Level::Intermediate,
      weekly_study_hours: "8-15".into(),
      target_completion_time: "6-months".into(),
      survey_completed: true,
      completed_at: Utc::now(),
    }
  }

  fn levels() -> HashMap<String, Level> {
    [
      ("a".to_string(), Level::Beginner),
      ("b".to_string(), Level::Beginner),
      ("c".to_string(), Level::Intermediate),
      ("d".to_string(), Level::Advanced),
    ]
    .into_iter()
    .collect()
  }

  #[tokio::test]
  async fn outage_fills_every_phase_with_position_aware_templates() {
    let mut phases = vec![phase(1, &["a", "b"], 2), phase(2, &["c"], 2), phase(3, &["d"], 3)];
    let port: &dyn TextGenerationPort = &DeadPort;
    narrate(Some(port), &Prompts::default(), &profile(), &mut phases, &levels()).await;

    for p in &phases {
      assert!(!p.title.is_empty());
      assert!(!p.phase_rationale.is_empty());
    }
    assert_eq!(phases[0].title, "Giai Đoạn 1: Người mới bắt đầu");
    assert_eq!(phases[2].title, "Giai Đoạn 3: Nâng cao");
    assert!(phases[0].phase_rationale.starts_with("Khởi đầu"));
    assert!(phases[1].phase_rationale.starts_with("Tiếp tục"));
    assert!(phases[2].phase_rationale.starts_with("Chặng cuối"));
    assert!(phases[2].phase_rationale.contains("6-months"));
    // Computed schedule stays untouched on the fallback path.
    assert_eq!(phases[0].estimated_weeks, 2);
  }

  #[tokio::test]
  async fn ai_weeks_override_rederives_days_and_display() {
    let mut phases = vec![phase(1, &["a", "b"], 2)];
    let port = ScriptedPort(vec![serde_json::json!({
      "title": "Nền tảng web",
      "rationale": "Bắt đầu từ HTML/CSS.",
      "estimated_weeks": 6
    })]);
    let port: &dyn TextGenerationPort = &port;
    narrate(Some(port), &Prompts::default(), &profile(), &mut phases, &levels()).await;

    assert_eq!(phases[0].title, "Nền tảng web");
    assert_eq!(phases[0].estimated_weeks, 6);
    assert_eq!(phases[0].estimated_days, 42);
    assert_eq!(phases[0].estimated_time, "2 tháng");
  }

  #[tokio::test]
  async fn missing_fields_fall_back_per_phase() {
    let mut phases = vec![phase(1, &["a"], 2), phase(2, &["d"], 3)];
    let port = ScriptedPort(vec![
      serde_json::json!({"rationale": "chỉ có rationale"}),
      serde_json::json!({"title": "Chuyên sâu", "estimated_weeks": "4"}),
    ]);
    let port: &dyn TextGenerationPort = &port;
    narrate(Some(port), &Prompts::default(), &profile(), &mut phases, &levels()).await;

    // Entry 1: AI rationale kept, title from template, weeks untouched.
    assert_eq!(phases[0].title, "Giai Đoạn 1: Người mới bắt đầu");
    assert_eq!(phases[0].phase_rationale, "chỉ có rationale");
    assert_eq!(phases[0].estimated_weeks, 2);
    // Entry 2: numeric-string weeks accepted and re-derived.
    assert_eq!(phases[1].title, "Chuyên sâu");
    assert_eq!(phases[1].estimated_weeks, 4);
    assert_eq!(phases[1].estimated_time, "1 tháng");
  }

  #[tokio::test]
  async fn zero_weeks_from_the_model_is_ignored() {
    let mut phases = vec![phase(1, &["a"], 2)];
    let port = ScriptedPort(vec![serde_json::json!({
      "title": "t", "rationale": "r", "estimated_weeks": 0
    })]);
    let port: &dyn TextGenerationPort = &port;
    narrate(Some(port), &Prompts::default(), &profile(), &mut phases, &levels()).await;
    assert_eq!(phases[0].estimated_weeks, 2);
  }
}
