//! Path assembly: compose the LearningPath aggregate, persist it as one
//! overwrite, and hydrate course ids into display snapshots for responses.

use chrono::Utc;
use tracing::{instrument, warn};

use crate::domain::{LearningPath, PathSummary, Phase, PreferenceProfile, Recommendation, ScoredCandidate};
use crate::protocol::{CourseSnapshot, PathOut, PathSummaryOut, PhaseCourseOut, PhaseOut, RecommendationOut};
use crate::state::AppState;
use crate::util::fill_template;

const PATH_TITLE_TEMPLATE: &str = "Lộ trình: {goal}";

/// Compose the aggregate from the annotated selection and planned phases.
/// `regeneration_count`/`last_generated_at` are stamped by the store write.
pub fn build_path(
  profile: &PreferenceProfile,
  recommendations: Vec<Recommendation>,
  phases: Vec<Phase>,
  selected: &[ScoredCandidate],
) -> LearningPath {
  let total_estimated_hours: f64 =
    recommendations.iter().map(|r| r.estimated_hours).sum();

  let mut skills_covered: Vec<String> = Vec::new();
  for s in selected {
    for cat in &s.candidate.categories {
      if !skills_covered.contains(cat) {
        skills_covered.push(cat.clone());
      }
    }
  }

  let level_progression = match (
    selected.iter().map(|s| s.candidate.level).min(),
    selected.iter().map(|s| s.candidate.level).max(),
  ) {
    (Some(lo), Some(hi)) if lo != hi => format!("{} → {}", lo.label_vi(), hi.label_vi()),
    (Some(lo), _) => lo.label_vi().to_string(),
    _ => String::new(),
  };

  LearningPath {
    student_id: profile.student_id.clone(),
    path_title: fill_template(PATH_TITLE_TEMPLATE, &[("goal", &profile.learning_goal)]),
    learning_goal: profile.learning_goal.clone(),
    path_summary: PathSummary {
      total_courses: recommendations.len(),
      total_estimated_hours,
      total_phases: phases.len(),
      skills_covered,
      level_progression,
    },
    phases,
    recommended_courses: recommendations,
    last_generated_at: Utc::now(),
    regeneration_count: 0,
  }
}

/// Replace every course id in the stored aggregate with a catalog snapshot.
/// Ids that no longer resolve (course deleted since generation) are dropped
/// from the view; the persisted raw lists keep them.
#[instrument(level = "debug", skip(state, path), fields(student_id = %path.student_id))]
pub async fn hydrate(state: &AppState, path: &LearningPath, warnings: Vec<String>) -> PathOut {
  let courses = state.courses.read().await;

  let snapshot = |id: &str| -> Option<CourseSnapshot> {
    match courses.get(id) {
      Some(c) => Some(CourseSnapshot::from_course(c)),
      None => {
        warn!(target: "pathgen", course_id = %id, "Dropping stale course id from hydrated view");
        None
      }
    }
  };

  let recommended_courses: Vec<RecommendationOut> = path
    .recommended_courses
    .iter()
    .filter_map(|r| {
      snapshot(&r.course_id).map(|course| RecommendationOut {
        course,
        reason: r.reason.clone(),
        priority: r.priority,
        match_score: r.match_score,
        estimated_hours: r.estimated_hours,
      })
    })
    .collect();

  let phases: Vec<PhaseOut> = path
    .phases
    .iter()
    .map(|p| PhaseOut {
      title: p.title.clone(),
      description: p.description.clone(),
      phase_rationale: p.phase_rationale.clone(),
      order: p.order,
      estimated_weeks: p.estimated_weeks,
      estimated_days: p.estimated_days,
      estimated_time: p.estimated_time.clone(),
      total_hours: p.total_hours,
      courses: p
        .courses
        .iter()
        .filter_map(|c| {
          let course = snapshot(c.course_id.as_deref()?)?;
          Some(PhaseCourseOut {
            course,
            title: c.title.clone(),
            reason: c.reason.clone(),
            order: c.order,
            match_score: c.match_score,
            estimated_hours: c.estimated_hours,
          })
        })
        .collect(),
    })
    .collect();

  PathOut {
    path_title: path.path_title.clone(),
    learning_goal: path.learning_goal.clone(),
    phases,
    recommended_courses,
    path_summary: PathSummaryOut::from_summary(&path.path_summary),
    last_generated_at: path.last_generated_at,
    regeneration_count: path.regeneration_count,
    warnings,
  }
}
