//! Domain models: student preference profile, catalog courses, and the
//! learning-path aggregate with its phases and recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::parse_duration_hours;

/// Self-reported skill level from the survey; also the difficulty tag on
/// catalog courses. Ordering matters: phases progress along this rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
  Beginner,
  Intermediate,
  Advanced,
  Expert,
}

impl Level {
  pub fn rank(self) -> u8 {
    match self {
      Level::Beginner => 0,
      Level::Intermediate => 1,
      Level::Advanced => 2,
      Level::Expert => 3,
    }
  }

  /// Display label used in generated Vietnamese copy.
  pub fn label_vi(self) -> &'static str {
    match self {
      Level::Beginner => "Người mới bắt đầu",
      Level::Intermediate => "Trung cấp",
      Level::Advanced => "Nâng cao",
      Level::Expert => "Chuyên gia",
    }
  }

  pub fn parse(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
      "beginner" => Some(Level::Beginner),
      "intermediate" => Some(Level::Intermediate),
      "advanced" => Some(Level::Advanced),
      "expert" => Some(Level::Expert),
      _ => None,
    }
  }
}

/// Structured survey data, owned by the student. Written only on survey
/// submission and immutable until resubmitted.
///
/// Pace and timeline stay free-form strings ("4-7", "3-months"); lookup
/// tables fall back to documented defaults on anything unknown.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreferenceProfile {
  pub student_id: String,
  pub learning_goal: String,
  pub objectives: Vec<String>,
  pub interested_skills: Vec<String>, // category ids, first-seen order
  pub current_level: Level,
  pub weekly_study_hours: String,     // "1-3" | "4-7" | "8-15" | "15+"
  pub target_completion_time: String, // "1-month" | "3-months" | "6-months" | "1-year+"
  pub survey_completed: bool,
  pub completed_at: DateTime<Utc>,
}

/// Catalog course as stored. CRUD for these lives elsewhere; this backend
/// only reads them (plus the seed/bank inserts at startup).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub subtitle: String,
  #[serde(default)]
  pub description: String,
  pub level: Level,
  #[serde(default)]
  pub categories: Vec<String>,
  #[serde(default)]
  pub rating: f32, // 0.0 ..= 5.0
  #[serde(default)]
  pub duration: String, // free-form, e.g. "12h 30m"
  #[serde(default)]
  pub will_learn: Vec<String>,
  #[serde(default)]
  pub thumbnail: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default = "default_active")]
  pub active: bool,
}

fn default_active() -> bool {
  true
}

/// Scoring-ready projection of a course. Exists only within one generation
/// run; never persisted.
#[derive(Clone, Debug)]
pub struct CourseCandidate {
  pub course_id: String,
  pub level: Level,
  pub categories: Vec<String>,
  pub rating: f32,
  pub content_hours: f64,
  pub description_len: usize,
  pub has_will_learn: bool,
}

impl CourseCandidate {
  pub fn from_course(c: &Course) -> Self {
    CourseCandidate {
      course_id: c.id.clone(),
      level: c.level,
      categories: c.categories.clone(),
      rating: c.rating,
      content_hours: parse_duration_hours(&c.duration),
      description_len: c.description.chars().count(),
      has_will_learn: c.will_learn.iter().any(|w| !w.trim().is_empty()),
    }
  }
}

/// Candidate plus its computed fit. `match_score` is always within 0..=100.
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
  pub candidate: CourseCandidate,
  pub match_score: u8,
  pub rank: usize, // 1-based, descending score
}

/// One recommended course in the flat ordered list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recommendation {
  pub course_id: String,
  pub reason: String,
  pub priority: u32, // 1-based position
  pub match_score: u8,
  pub estimated_hours: f64,
}

/// A course placed inside a phase. `course_id` is `None` only for ingested
/// custom-plan steps whose id failed format validation; generated paths
/// always carry `Some`. `title` is caller-supplied step text, ingested
/// plans only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseCourse {
  pub course_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  pub reason: String,
  pub order: u32, // 1-based within the phase
  pub match_score: u8,
  pub estimated_hours: f64,
}

/// One progressive stage of the plan.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Phase {
  pub title: String,
  pub description: String,
  pub phase_rationale: String,
  pub order: u32, // 1-based, contiguous across the path
  pub estimated_weeks: u32, // >= 1
  pub estimated_days: u32,
  pub estimated_time: String, // human string, vi
  pub total_hours: f64,
  pub courses: Vec<PhaseCourse>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathSummary {
  pub total_courses: usize,
  pub total_estimated_hours: f64,
  pub total_phases: usize,
  pub skills_covered: Vec<String>,
  pub level_progression: String,
}

/// The stored aggregate, 1:1 per student. Fully overwritten on each
/// regeneration; `regeneration_count` never decreases.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LearningPath {
  pub student_id: String,
  pub path_title: String,
  pub learning_goal: String,
  pub phases: Vec<Phase>,
  pub recommended_courses: Vec<Recommendation>,
  pub path_summary: PathSummary,
  pub last_generated_at: DateTime<Utc>,
  pub regeneration_count: u32,
}
