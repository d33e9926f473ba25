//! Level-adjacency filtering of the catalog against a student profile.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{Course, CourseCandidate, Level, PreferenceProfile};

/// Course levels relevant to a student's self-reported level. Beginners stay
/// on beginner content; experts are pointed at advanced courses (the catalog
/// has no "expert" tier a student could still be below).
pub fn adjacent_levels(level: Level) -> &'static [Level] {
  match level {
    Level::Beginner => &[Level::Beginner],
    Level::Intermediate => &[Level::Beginner, Level::Intermediate],
    Level::Advanced => &[Level::Intermediate, Level::Advanced],
    Level::Expert => &[Level::Advanced],
  }
}

/// Narrow the catalog to scoring candidates:
///   - inactive and already-enrolled courses never pass
///   - course level must be adjacent to the student's level
///   - prefer courses overlapping the student's interested skills; when that
///     combination is empty, retry level-only so any level match still
///     yields a result.
pub fn filter_candidates(
  courses: &[Course],
  profile: &PreferenceProfile,
  enrolled: &HashSet<String>,
) -> Vec<CourseCandidate> {
  let levels = adjacent_levels(profile.current_level);

  let level_pool: Vec<&Course> = courses
    .iter()
    .filter(|c| c.active && !enrolled.contains(&c.id) && levels.contains(&c.level))
    .collect();

  let with_skills: Vec<&Course> = level_pool
    .iter()
    .copied()
    .filter(|c| c.categories.iter().any(|cat| profile.interested_skills.contains(cat)))
    .collect();

  let pool = if with_skills.is_empty() {
    debug!(target: "pathgen", level = ?profile.current_level, "No skill-overlap candidates; retrying level-only");
    level_pool
  } else {
    with_skills
  };

  pool.into_iter().map(CourseCandidate::from_course).collect()
}
