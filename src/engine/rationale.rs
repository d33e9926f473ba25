//! Per-course recommendation reasons: one batched generative call with a
//! deterministic template fallback.
//!
//! The fallback output has the same shape and cardinality as the AI path so
//! everything downstream is uniform.

use serde_json::Value;
use tracing::{error, instrument};

use crate::config::Prompts;
use crate::domain::{PreferenceProfile, Recommendation, ScoredCandidate};
use crate::genai::{generate_with_retry, GenRequest, TextGenerationPort};
use crate::util::fill_template;

const MAX_REASON_CHARS: usize = 100;
const FALLBACK_REASON_TEMPLATE: &str = "Phù hợp với cấp độ {level} & kỹ năng {categories}";

/// Annotate the selected candidates with reasons, preserving input order.
/// Any collaborator failure (after retries) degrades to the template reason
/// for every course; a partial AI answer never mixes with a partial fallback.
#[instrument(level = "info", skip_all, fields(selected = selected.len(), ai = port.is_some()))]
pub async fn annotate(
  port: Option<&dyn TextGenerationPort>,
  prompts: &Prompts,
  profile: &PreferenceProfile,
  selected: &[ScoredCandidate],
) -> Vec<Recommendation> {
  let reasons = match port {
    Some(port) => match generate_reasons(port, prompts, profile, selected).await {
      Ok(reasons) => reasons,
      Err(e) => {
        error!(target: "pathgen", error = %e, "Reason generation failed; using template fallback");
        fallback_reasons(profile, selected)
      }
    },
    None => fallback_reasons(profile, selected),
  };

  selected
    .iter()
    .zip(reasons)
    .enumerate()
    .map(|(i, (s, reason))| Recommendation {
      course_id: s.candidate.course_id.clone(),
      reason,
      priority: (i + 1) as u32,
      match_score: s.match_score,
      estimated_hours: s.candidate.content_hours,
    })
    .collect()
}

async fn generate_reasons(
  port: &dyn TextGenerationPort,
  prompts: &Prompts,
  profile: &PreferenceProfile,
  selected: &[ScoredCandidate],
) -> Result<Vec<String>, crate::genai::GenAiError> {
  let course_lines: Vec<String> = selected
    .iter()
    .map(|s| {
      format!(
        "{}. id={} level={} score={} hours={:.1} categories=[{}]",
        s.rank,
        s.candidate.course_id,
        s.candidate.level.label_vi(),
        s.match_score,
        s.candidate.content_hours,
        s.candidate.categories.join(", "),
      )
    })
    .collect();

  let user = fill_template(
    &prompts.rationale_user_template,
    &[
      ("goal", &profile.learning_goal),
      ("objectives", &profile.objectives.join("; ")),
      ("level", profile.current_level.label_vi()),
      ("weekly", &profile.weekly_study_hours),
      ("timeline", &profile.target_completion_time),
      ("skills", &profile.interested_skills.join(", ")),
      ("courses", &course_lines.join("\n")),
      ("count", &selected.len().to_string()),
    ],
  );

  let req = GenRequest {
    instructions: prompts.rationale_system.clone(),
    prompt: user,
    temperature: 0.7,
    max_tokens: Some(selected.len() as u32 * 80 + 200),
    expected_len: selected.len(),
  };

  let items = generate_with_retry(port, &req).await?;
  Ok(
    items
      .iter()
      .zip(selected)
      .map(|(item, s)| match reason_of(item) {
        Some(r) => clip_reason(&r),
        // A present-but-empty entry degrades alone; the array shape held.
        None => fallback_reason(profile, s),
      })
      .collect(),
  )
}

fn reason_of(item: &Value) -> Option<String> {
  item
    .get("reason")
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
}

fn fallback_reasons(profile: &PreferenceProfile, selected: &[ScoredCandidate]) -> Vec<String> {
  selected.iter().map(|s| fallback_reason(profile, s)).collect()
}

fn fallback_reason(profile: &PreferenceProfile, s: &ScoredCandidate) -> String {
  let categories = if s.candidate.categories.is_empty() {
    if profile.interested_skills.is_empty() {
      "tổng quát".to_string()
    } else {
      profile.interested_skills.join(", ")
    }
  } else {
    s.candidate.categories.join(", ")
  };
  clip_reason(&fill_template(
    FALLBACK_REASON_TEMPLATE,
    &[("level", s.candidate.level.label_vi()), ("categories", &categories)],
  ))
}

fn clip_reason(reason: &str) -> String {
  reason.chars().take(MAX_REASON_CHARS).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{CourseCandidate, Level};
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
      Err(GenAiError::Timeout)
    }
  }

  fn selected() -> Vec<ScoredCandidate> {
    vec![
      ScoredCandidate {
        candidate: CourseCandidate {
          course_id: "c1".into(),
          level: Level::Beginner,
          categories: vec!["web".into()],
          rating: 4.0,
          content_hours: 8.0,
          description_len: 120,
          has_will_learn: true,
        },
        match_score: 90,
        rank: 1,
      },
      ScoredCandidate {
        candidate: CourseCandidate {
          course_id: "c2".into(),
          level: Level::Beginner,
          categories: vec![],
          rating: 3.5,
          content_hours: 5.0,
          description_len: 10,
          has_will_learn: false,
        },
        match_score: 60,
        rank: 2,
      },
    ]
  }

  fn profile() -> PreferenceProfile {
    PreferenceProfile {
      student_id: "s1".into(),
      learning_goal: "trở thành web developer".into(),
      objectives: vec![],
      interested_skills: vec!["web".into()],
      current_level: Level::Beginner,
      weekly_study_hours: "4-7".into(),
      target_completion_time: "3-months".into(),
      survey_completed: true,
      completed_at: Utc::now(),
    }
  }

  #[tokio::test]
  async fn ai_reasons_are_used_in_order_and_clipped() {
    let long = "x".repeat(300);
    let port = ScriptedPort(vec![
      serde_json::json!({"reason": "Bám sát mục tiêu web"}),
      serde_json::json!({"reason": long}),
    ]);
    let port: &dyn TextGenerationPort = &port;
    let recs = annotate(Some(port), &Prompts::default(), &profile(), &selected()).await;
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].reason, "Bám sát mục tiêu web");
    assert_eq!(recs[1].reason.chars().count(), MAX_REASON_CHARS);
    assert_eq!(recs[0].priority, 1);
    assert_eq!(recs[1].priority, 2);
    assert_eq!(recs[1].estimated_hours, 5.0);
  }

  #[tokio::test]
  async fn collaborator_outage_degrades_to_template_for_every_course() {
    let port: &dyn TextGenerationPort = &DeadPort;
    let recs = annotate(Some(port), &Prompts::default(), &profile(), &selected()).await;
    assert_eq!(recs.len(), 2);
    for r in &recs {
      assert!(!r.reason.is_empty(), "fallback must fill every reason");
      assert!(r.reason.starts_with("Phù hợp với cấp độ"));
    }
    // Candidate categories win; profile skills only back an empty list.
    assert!(recs[0].reason.contains("web"));
  }

  #[tokio::test]
  async fn empty_entry_in_a_valid_array_falls_back_alone() {
    let port = ScriptedPort(vec![
      serde_json::json!({"reason": "ok"}),
      serde_json::json!({"reason": "  "}),
    ]);
    let port: &dyn TextGenerationPort = &port;
    let recs = annotate(Some(port), &Prompts::default(), &profile(), &selected()).await;
    assert_eq!(recs[0].reason, "ok");
    assert!(recs[1].reason.starts_with("Phù hợp với cấp độ"));
  }

  #[tokio::test]
  async fn no_port_means_template_reasons() {
    let recs = annotate(None, &Prompts::default(), &profile(), &selected()).await;
    assert!(recs.iter().all(|r| r.reason.starts_with("Phù hợp với cấp độ")));
  }
}
