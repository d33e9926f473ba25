//! Custom-plan ingestion: validate and normalize a caller-submitted plan
//! into the same LearningPath shape the generator produces.
//!
//! This path trusts the caller's structure: no filtering, scoring, or AI
//! calls. Structural problems reject the submission with field-level detail;
//! a bad course id only degrades that step (nulled, with a warning).

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{LearningPath, PathSummary, Phase, PhaseCourse, PreferenceProfile, Recommendation};
use crate::error::AppError;
use crate::protocol::CustomPlanIn;

const CUSTOM_PATH_TITLE: &str = "Lộ trình tùy chỉnh";
const CUSTOM_PROGRESSION: &str = "Tùy chỉnh";

/// Validate and normalize; returns the aggregate (unstamped, the store
/// write assigns regeneration bookkeeping) plus per-step warnings.
#[instrument(level = "info", skip(profile, plan), fields(%student_id, phases = plan.phases.len()))]
pub fn ingest(
  student_id: &str,
  profile: Option<&PreferenceProfile>,
  plan: &CustomPlanIn,
) -> Result<(LearningPath, Vec<String>), AppError> {
  if plan.phases.is_empty() {
    return Err(AppError::validation("phases", "at least one phase is required"));
  }

  let mut warnings: Vec<String> = Vec::new();

  // Keep the caller's ordering intent, then renumber contiguously so the
  // stored aggregate always satisfies order == index + 1.
  let mut indexed: Vec<(usize, &crate::protocol::CustomPhaseIn)> =
    plan.phases.iter().enumerate().collect();
  indexed.sort_by_key(|(i, p)| (p.order.unwrap_or((*i as u32) + 1), *i));

  let mut phases: Vec<Phase> = Vec::with_capacity(indexed.len());
  for (out_idx, (in_idx, p)) in indexed.into_iter().enumerate() {
    let title = match p.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
      Some(t) => t.to_string(),
      None => {
        return Err(AppError::validation(
          format!("phases[{in_idx}].title"),
          "phase title is required",
        ));
      }
    };

    let mut steps: Vec<(usize, &crate::protocol::CustomStepIn)> =
      p.steps.iter().enumerate().collect();
    steps.sort_by_key(|(j, s)| (s.order.unwrap_or((*j as u32) + 1), *j));

    let mut courses: Vec<PhaseCourse> = Vec::with_capacity(steps.len());
    for (out_j, (in_j, s)) in steps.into_iter().enumerate() {
      let step_title = match s.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_string(),
        None => {
          return Err(AppError::validation(
            format!("phases[{in_idx}].steps[{in_j}].title"),
            "step title is required",
          ));
        }
      };

      let course_id = match s.course_id.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) if Uuid::parse_str(raw).is_ok() => Some(raw.to_string()),
        Some(raw) => {
          warn!(target: "pathgen", %student_id, course_id = %raw, "Clearing malformed course id in custom plan");
          warnings.push(format!(
            "phases[{in_idx}].steps[{in_j}].courseId: \"{raw}\" is not a valid course id; cleared"
          ));
          None
        }
        None => None,
      };

      courses.push(PhaseCourse {
        course_id,
        title: Some(step_title),
        reason: s.description.clone().unwrap_or_default(),
        order: (out_j + 1) as u32,
        match_score: 0,
        estimated_hours: 0.0,
      });
    }

    phases.push(Phase {
      title,
      description: p.description.clone().unwrap_or_default(),
      phase_rationale: p.phase_rationale.clone().unwrap_or_default(),
      order: (out_idx + 1) as u32,
      estimated_weeks: 1,
      estimated_days: 7,
      estimated_time: "1 tuần".into(),
      total_hours: 0.0,
      courses,
    });
  }

  // Flatten to recommendations: first-seen order across all steps.
  let mut recommended_courses: Vec<Recommendation> = Vec::new();
  for phase in &phases {
    for c in &phase.courses {
      let Some(id) = &c.course_id else { continue };
      if recommended_courses.iter().any(|r| &r.course_id == id) {
        continue;
      }
      recommended_courses.push(Recommendation {
        course_id: id.clone(),
        reason: c.title.clone().unwrap_or_default(),
        priority: recommended_courses.len() as u32 + 1,
        match_score: 0,
        estimated_hours: 0.0,
      });
    }
  }

  let learning_goal = plan
    .learning_goal
    .clone()
    .or_else(|| profile.map(|p| p.learning_goal.clone()))
    .unwrap_or_default();

  let path = LearningPath {
    student_id: student_id.to_string(),
    path_title: plan
      .path_title
      .clone()
      .filter(|t| !t.trim().is_empty())
      .unwrap_or_else(|| CUSTOM_PATH_TITLE.into()),
    learning_goal,
    path_summary: PathSummary {
      total_courses: recommended_courses.len(),
      total_estimated_hours: 0.0,
      total_phases: phases.len(),
      skills_covered: vec![],
      level_progression: CUSTOM_PROGRESSION.into(),
    },
    phases,
    recommended_courses,
    last_generated_at: chrono::Utc::now(),
    regeneration_count: 0,
  };

  info!(target: "pathgen", %student_id, phases = path.phases.len(), courses = path.recommended_courses.len(), warnings = warnings.len(), "Custom plan ingested");
  Ok((path, warnings))
}
