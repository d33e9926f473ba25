//! Public request/response structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Persisted aggregates carry bare course ids; every response view replaces
//! them with hydrated catalog snapshots (stale ids silently dropped).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Course, Level, PathSummary};

//
// Inbound
//

/// Survey submission; the only writer of a student's PreferenceProfile.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyIn {
    pub student_id: String,
    pub learning_goal: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub interested_skills: Vec<String>,
    pub current_level: String,
    pub weekly_study_hours: String,
    pub target_completion_time: String,
}

#[derive(Serialize)]
pub struct SurveyOut {
    pub ok: bool,
}

/// Generate request: without `plan` the full pipeline runs; with `plan` the
/// payload ingestor runs instead (no filtering, scoring, or AI calls).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIn {
    pub student_id: String,
    #[serde(default)]
    pub plan: Option<CustomPlanIn>,
}

/// Caller-submitted custom plan.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPlanIn {
    #[serde(default)]
    pub path_title: Option<String>,
    #[serde(default)]
    pub learning_goal: Option<String>,
    #[serde(default)]
    pub phases: Vec<CustomPhaseIn>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPhaseIn {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phase_rationale: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub steps: Vec<CustomStepIn>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomStepIn {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(rename = "studentId")]
    pub student_id: String,
}

//
// Outbound
//

/// Display snapshot of a catalog course, resolved at read time.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSnapshot {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub thumbnail: String,
    pub level: Level,
    pub duration: String,
    pub price: f64,
    pub rating: f32,
    pub categories: Vec<String>,
}

impl CourseSnapshot {
    pub fn from_course(c: &Course) -> Self {
        CourseSnapshot {
            id: c.id.clone(),
            title: c.title.clone(),
            subtitle: c.subtitle.clone(),
            thumbnail: c.thumbnail.clone(),
            level: c.level,
            duration: c.duration.clone(),
            price: c.price,
            rating: c.rating,
            categories: c.categories.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOut {
    pub course: CourseSnapshot,
    pub reason: String,
    pub priority: u32,
    pub match_score: u8,
    pub estimated_hours: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseCourseOut {
    pub course: CourseSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub reason: String,
    pub order: u32,
    pub match_score: u8,
    pub estimated_hours: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseOut {
    pub title: String,
    pub description: String,
    pub phase_rationale: String,
    pub order: u32,
    pub estimated_weeks: u32,
    pub estimated_days: u32,
    pub estimated_time: String,
    pub total_hours: f64,
    pub courses: Vec<PhaseCourseOut>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSummaryOut {
    pub total_courses: usize,
    pub total_estimated_hours: f64,
    pub total_phases: usize,
    pub skills_covered: Vec<String>,
    pub level_progression: String,
}

impl PathSummaryOut {
    pub fn from_summary(s: &PathSummary) -> Self {
        PathSummaryOut {
            total_courses: s.total_courses,
            total_estimated_hours: s.total_estimated_hours,
            total_phases: s.total_phases,
            skills_covered: s.skills_covered.clone(),
            level_progression: s.level_progression.clone(),
        }
    }
}

/// The hydrated learning-path view returned by generate and read.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathOut {
    pub path_title: String,
    pub learning_goal: String,
    pub phases: Vec<PhaseOut>,
    pub recommended_courses: Vec<RecommendationOut>,
    pub path_summary: PathSummaryOut,
    pub last_generated_at: DateTime<Utc>,
    pub regeneration_count: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
