//! The learning-path engine: an explicit pipeline over individually
//! testable stages.
//!
//! Generation order is strict: narration depends on phase composition,
//! which depends on the rationale-annotated selection.
//!
//!   filter → score → budget → rationale → phases → narrate → assemble
//!
//! The two AI-calling stages (rationale, narrator) are the only stages with
//! external effects, and both absorb every collaborator failure through
//! deterministic fallbacks: a collaborator outage degrades the copy, never
//! the request.

pub mod assembler;
pub mod budget;
pub mod filter;
pub mod ingest;
pub mod narrator;
pub mod phases;
pub mod rationale;
pub mod scoring;

use std::collections::HashMap;

use tracing::{info, instrument};

use crate::domain::{Level, PreferenceProfile};
use crate::error::{ActionRequired, AppError};
use crate::protocol::{CustomPlanIn, PathOut};
use crate::state::AppState;

/// Run the full generation pipeline for a student and persist the result.
#[instrument(level = "info", skip(state), fields(%student_id))]
pub async fn generate_path(state: &AppState, student_id: &str) -> Result<PathOut, AppError> {
  let profile = require_profile(state, student_id).await?;

  let courses = state.active_courses().await;
  let enrolled = state.enrolled_ids(student_id).await;
  let candidates = filter::filter_candidates(&courses, &profile, &enrolled);
  if candidates.is_empty() {
    return Err(AppError::NotFound {
      resource: "matching courses",
      action_required: ActionRequired::CompleteSurvey,
    });
  }

  let scored = scoring::score_all(candidates, &profile);
  let max = budget::max_courses(&profile.target_completion_time, &profile.weekly_study_hours);
  let selected = budget::select_top(scored, max);
  info!(target: "pathgen", %student_id, selected = selected.len(), budget = max, "Candidates selected");

  let port = state.genai.as_deref();
  let recommendations = rationale::annotate(port, &state.prompts, &profile, &selected).await;

  let mut planned = phases::plan_phases(
    &selected,
    &recommendations,
    &profile.weekly_study_hours,
    &profile.target_completion_time,
  );
  let levels_by_course: HashMap<String, Level> = selected
    .iter()
    .map(|s| (s.candidate.course_id.clone(), s.candidate.level))
    .collect();
  narrator::narrate(port, &state.prompts, &profile, &mut planned, &levels_by_course).await;

  let path = assembler::build_path(&profile, recommendations, planned, &selected);
  let stored = state.store_path(path).await?;
  Ok(assembler::hydrate(state, &stored, vec![]).await)
}

/// Persist a caller-submitted plan instead of generating one.
#[instrument(level = "info", skip(state, plan), fields(%student_id))]
pub async fn ingest_custom_path(
  state: &AppState,
  student_id: &str,
  plan: &CustomPlanIn,
) -> Result<PathOut, AppError> {
  let profile = state.get_profile(student_id).await;
  let (path, warnings) = ingest::ingest(student_id, profile.as_ref(), plan)?;
  let stored = state.store_path(path).await?;
  Ok(assembler::hydrate(state, &stored, warnings).await)
}

/// Return the stored plan, hydrated; otherwise signal what the client
/// should do next (finish the survey, or trigger a generation).
#[instrument(level = "info", skip(state), fields(%student_id))]
pub async fn read_path(state: &AppState, student_id: &str) -> Result<PathOut, AppError> {
  match state.get_path(student_id).await {
    Some(path) => Ok(assembler::hydrate(state, &path, vec![]).await),
    None => {
      let action = match state.get_profile(student_id).await {
        Some(p) if p.survey_completed => ActionRequired::GeneratePath,
        _ => ActionRequired::CompleteSurvey,
      };
      Err(AppError::NotFound { resource: "learning path", action_required: action })
    }
  }
}

async fn require_profile(
  state: &AppState,
  student_id: &str,
) -> Result<PreferenceProfile, AppError> {
  match state.get_profile(student_id).await {
    Some(p) if p.survey_completed => Ok(p),
    _ => Err(AppError::NotFound {
      resource: "preference profile",
      action_required: ActionRequired::CompleteSurvey,
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::genai::{GenAiError, GenRequest, TextGenerationPort};
  use crate::protocol::{CustomPhaseIn, CustomStepIn};
  use crate::seeds::seed_courses;
  use async_trait::async_trait;
  use chrono::Utc;
  use serde_json::Value;
  use std::sync::Arc;

  /// One object shape serves both AI stages: `reason` feeds the rationale
  /// stage, the rest feeds the narrator.
  struct UniversalPort;

  #[async_trait]
  impl TextGenerationPort for UniversalPort {
    async fn generate_array(&self, req: &GenRequest) -> Result<Vec<Value>, GenAiError> {
      Ok(vec![
        serde_json::json!({
          "reason": "AI lý do",
          "title": "AI tiêu đề",
          "rationale": "AI diễn giải",
          "estimated_weeks": 2
        });
        req.expected_len
      ])
    }
  }

  struct DeadPort;

  #[async_trait]
  impl TextGenerationPort for DeadPort {
    async fn generate_array(&self, _req: &GenRequest) -> Result<Vec<Value>, GenAiError> {
      Err(GenAiError::Timeout)
    }
  }

  async fn seeded_state(port: Option<Arc<dyn TextGenerationPort>>) -> AppState {
    let state = AppState::bare(port);
    for c in seed_courses() {
      state.insert_course(c).await;
    }
    state
  }

  async fn submit_profile(state: &AppState, level: Level, weekly: &str, timeline: &str) {
    let p = PreferenceProfile {
      student_id: "s1".into(),
      learning_goal: "trở thành web developer".into(),
      objectives: vec!["làm sản phẩm thật".into()],
      interested_skills: vec!["web".into()],
      current_level: level,
      weekly_study_hours: weekly.into(),
      target_completion_time: timeline.into(),
      survey_completed: true,
      completed_at: Utc::now(),
    };
    state.upsert_profile(p).await.expect("profile");
  }

  #[tokio::test]
  async fn full_fallback_generation_satisfies_the_path_invariants() {
    let state = seeded_state(None).await;
    submit_profile(&state, Level::Beginner, "4-7", "3-months").await;

    let out = generate_path(&state, "s1").await.expect("generate");

    // beginner × web on the seed catalog → 2 matches, under the 3-months/4-7
    // budget of 3.
    assert!(out.recommended_courses.len() <= 3);
    assert!(!out.recommended_courses.is_empty());

    // Phase orders are 1..K with no gaps; every recommendation appears in
    // exactly one phase.
    let stored = state.get_path("s1").await.expect("stored");
    for (i, p) in stored.phases.iter().enumerate() {
      assert_eq!(p.order, (i + 1) as u32);
      assert!(!p.courses.is_empty());
    }
    let mut in_phases: Vec<String> = stored
      .phases
      .iter()
      .flat_map(|p| p.courses.iter().filter_map(|c| c.course_id.clone()))
      .collect();
    in_phases.sort();
    let mut recommended: Vec<String> =
      stored.recommended_courses.iter().map(|r| r.course_id.clone()).collect();
    recommended.sort();
    assert_eq!(in_phases, recommended);

    // Fallback completeness: no AI, yet every reason/title/rationale is set.
    for r in &stored.recommended_courses {
      assert!(!r.reason.is_empty());
      assert!(r.match_score <= 100);
    }
    for p in &stored.phases {
      assert!(!p.title.is_empty());
      assert!(!p.phase_rationale.is_empty());
      assert!(p.estimated_weeks >= 1);
    }
    assert_eq!(stored.regeneration_count, 1);
  }

  #[tokio::test]
  async fn worked_example_three_selected_two_phases() {
    let state = seeded_state(None).await;
    // All four beginner seeds match a skill-free beginner profile.
    let p = PreferenceProfile {
      student_id: "s1".into(),
      learning_goal: "học lập trình".into(),
      objectives: vec![],
      interested_skills: vec![],
      current_level: Level::Beginner,
      weekly_study_hours: "4-7".into(),
      target_completion_time: "3-months".into(),
      survey_completed: true,
      completed_at: Utc::now(),
    };
    state.upsert_profile(p).await.expect("profile");

    let out = generate_path(&state, "s1").await.expect("generate");
    assert_eq!(out.recommended_courses.len(), 3);
    assert_eq!(out.phases.len(), 2, "min(3, ceil(3/2)) = 2");
  }

  #[tokio::test]
  async fn enrolled_courses_are_never_recommended() {
    let state = seeded_state(None).await;
    submit_profile(&state, Level::Beginner, "15+", "1-year+").await;
    let enrolled_id = "5e9cbf4e-8f3a-4f0e-9b2a-0d6e4a1c2b31"; // HTML & CSS seed
    state
      .enrollments
      .write()
      .await
      .entry("s1".into())
      .or_default()
      .insert(enrolled_id.to_string());

    let out = generate_path(&state, "s1").await.expect("generate");
    assert!(out.recommended_courses.iter().all(|r| r.course.id != enrolled_id));
  }

  #[tokio::test]
  async fn regeneration_increments_and_replaces_whole() {
    let state = seeded_state(None).await;
    submit_profile(&state, Level::Beginner, "4-7", "3-months").await;

    generate_path(&state, "s1").await.expect("first");
    let first = state.get_path("s1").await.expect("stored");

    submit_profile(&state, Level::Advanced, "15+", "1-month").await;
    generate_path(&state, "s1").await.expect("second");
    let second = state.get_path("s1").await.expect("stored");

    assert_eq!(first.regeneration_count, 1);
    assert_eq!(second.regeneration_count, 2);
    // Advanced profile selects a different catalog slice: prior phases and
    // recommendations are gone, not appended to.
    let first_ids: Vec<&String> =
      first.recommended_courses.iter().map(|r| &r.course_id).collect();
    assert!(second.recommended_courses.iter().all(|r| !first_ids.contains(&&r.course_id)));
  }

  #[tokio::test]
  async fn ai_narration_flows_into_the_stored_path() {
    let port: Arc<dyn TextGenerationPort> = Arc::new(UniversalPort);
    let state = seeded_state(Some(port)).await;
    submit_profile(&state, Level::Beginner, "4-7", "3-months").await;

    let out = generate_path(&state, "s1").await.expect("generate");
    assert!(out.recommended_courses.iter().all(|r| r.reason == "AI lý do"));
    for p in &out.phases {
      assert_eq!(p.title, "AI tiêu đề");
      assert_eq!(p.phase_rationale, "AI diễn giải");
      // AI weeks override, days/display re-derived.
      assert_eq!(p.estimated_weeks, 2);
      assert_eq!(p.estimated_days, 14);
      assert_eq!(p.estimated_time, "2 tuần");
    }
  }

  #[tokio::test]
  async fn dead_collaborator_still_completes_the_request() {
    let port: Arc<dyn TextGenerationPort> = Arc::new(DeadPort);
    let state = seeded_state(Some(port)).await;
    submit_profile(&state, Level::Beginner, "4-7", "3-months").await;

    let out = generate_path(&state, "s1").await.expect("degraded, not failed");
    assert!(out.recommended_courses.iter().all(|r| !r.reason.is_empty()));
    assert!(out.phases.iter().all(|p| !p.title.is_empty() && !p.phase_rationale.is_empty()));
  }

  #[tokio::test]
  async fn missing_profile_or_catalog_signal_remedial_actions() {
    // No profile at all → complete the survey.
    let state = seeded_state(None).await;
    match generate_path(&state, "ghost").await {
      Err(AppError::NotFound { action_required, .. }) => {
        assert_eq!(action_required, ActionRequired::CompleteSurvey)
      }
      other => panic!("expected not-found, got {:?}", other.map(|_| ())),
    }

    // Empty catalog → no match at all.
    let empty = AppState::bare(None);
    submit_profile(&empty, Level::Beginner, "4-7", "3-months").await;
    assert!(matches!(
      generate_path(&empty, "s1").await,
      Err(AppError::NotFound { .. })
    ));

    // Read signals: survey first, then generation.
    match read_path(&state, "ghost").await {
      Err(AppError::NotFound { action_required, .. }) => {
        assert_eq!(action_required, ActionRequired::CompleteSurvey)
      }
      other => panic!("expected not-found, got {:?}", other.map(|_| ())),
    }
    submit_profile(&state, Level::Beginner, "4-7", "3-months").await;
    match read_path(&state, "s1").await {
      Err(AppError::NotFound { action_required, .. }) => {
        assert_eq!(action_required, ActionRequired::GeneratePath)
      }
      other => panic!("expected not-found, got {:?}", other.map(|_| ())),
    }
  }

  #[tokio::test]
  async fn custom_plan_bypasses_the_pipeline_and_hydrates() {
    let state = seeded_state(None).await;
    let plan = CustomPlanIn {
      path_title: Some("Kế hoạch riêng".into()),
      learning_goal: None,
      phases: vec![CustomPhaseIn {
        title: Some("Tự chọn".into()),
        description: None,
        phase_rationale: None,
        order: None,
        steps: vec![
          CustomStepIn {
            title: Some("Học HTML".into()),
            description: None,
            course_id: Some("5e9cbf4e-8f3a-4f0e-9b2a-0d6e4a1c2b31".into()),
            order: None,
          },
          CustomStepIn {
            title: Some("Bước tự do".into()),
            description: None,
            course_id: Some("not-an-id".into()),
            order: None,
          },
        ],
      }],
    };

    let out = ingest_custom_path(&state, "s1", &plan).await.expect("ingest");
    assert_eq!(out.path_title, "Kế hoạch riêng");
    assert_eq!(out.warnings.len(), 1);
    // Only the resolvable step appears hydrated; both persist raw.
    assert_eq!(out.phases[0].courses.len(), 1);
    assert_eq!(out.phases[0].courses[0].course.title, "HTML & CSS cho người mới");
    let stored = state.get_path("s1").await.expect("stored");
    assert_eq!(stored.phases[0].courses.len(), 2);
    assert_eq!(stored.regeneration_count, 1);

    // A later generated path overwrites the custom one entirely.
    submit_profile(&state, Level::Beginner, "4-7", "3-months").await;
    generate_path(&state, "s1").await.expect("generate");
    let replaced = state.get_path("s1").await.expect("stored");
    assert_eq!(replaced.regeneration_count, 2);
    assert_ne!(replaced.path_title, "Kế hoạch riêng");
  }
}
