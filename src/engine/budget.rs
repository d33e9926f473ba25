//! Timeline budgeting: how many courses fit a student's stated pace and
//! completion target, and the top-N selection under that bound.

use crate::domain::ScoredCandidate;

/// (targetCompletionTime × weeklyStudyHours) → max course count. Monotone in
/// both axes; unknown bucket strings fall back to 5.
pub fn max_courses(target_completion_time: &str, weekly_study_hours: &str) -> usize {
  match (target_completion_time, weekly_study_hours) {
    ("1-month", "1-3") => 1,
    ("1-month", "4-7") => 2,
    ("1-month", "8-15") => 3,
    ("1-month", "15+") => 4,

    ("3-months", "1-3") => 2,
    ("3-months", "4-7") => 3,
    ("3-months", "8-15") => 5,
    ("3-months", "15+") => 7,

    ("6-months", "1-3") => 3,
    ("6-months", "4-7") => 5,
    ("6-months", "8-15") => 8,
    ("6-months", "15+") => 10,

    ("1-year+", "1-3") => 5,
    ("1-year+", "4-7") => 8,
    ("1-year+", "8-15") => 12,
    ("1-year+", "15+") => 15,

    _ => 5,
  }
}

/// Average study hours per week for a pace bucket; drives week estimates.
pub fn hours_per_week(weekly_study_hours: &str) -> f64 {
  match weekly_study_hours {
    "1-3" => 2.0,
    "4-7" => 5.5,
    "8-15" => 11.5,
    "15+" => 20.0,
    _ => 5.5,
  }
}

/// Keep the N best-scoring candidates; input is already sorted descending.
pub fn select_top(mut scored: Vec<ScoredCandidate>, max: usize) -> Vec<ScoredCandidate> {
  scored.truncate(max);
  scored
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{CourseCandidate, Level};

  fn scored(id: &str, score: u8, rank: usize) -> ScoredCandidate {
    ScoredCandidate {
      candidate: CourseCandidate {
        course_id: id.into(),
        level: Level::Beginner,
        categories: vec![],
        rating: 0.0,
        content_hours: 1.0,
        description_len: 0,
        has_will_learn: false,
      },
      match_score: score,
      rank,
    }
  }

  #[test]
  fn table_corners_and_default() {
    assert_eq!(max_courses("1-month", "1-3"), 1);
    assert_eq!(max_courses("1-year+", "15+"), 15);
    assert_eq!(max_courses("sometime", "whenever"), 5);
  }

  #[test]
  fn table_is_monotone_in_both_axes() {
    let times = ["1-month", "3-months", "6-months", "1-year+"];
    let paces = ["1-3", "4-7", "8-15", "15+"];
    for w in 0..paces.len() {
      for t in 1..times.len() {
        assert!(max_courses(times[t], paces[w]) >= max_courses(times[t - 1], paces[w]));
      }
    }
    for t in 0..times.len() {
      for w in 1..paces.len() {
        assert!(max_courses(times[t], paces[w]) >= max_courses(times[t], paces[w - 1]));
      }
    }
  }

  #[test]
  fn selection_never_exceeds_budget_nor_available() {
    let pool = vec![scored("a", 90, 1), scored("b", 80, 2), scored("c", 70, 3)];
    assert_eq!(select_top(pool.clone(), 2).len(), 2);
    assert_eq!(select_top(pool, 10).len(), 3);
  }

  #[test]
  fn worked_example_from_the_survey_buckets() {
    // beginner, 4-7 h/week, 3 months, 6 matching courses → at most 3 selected.
    let budget = max_courses("3-months", "4-7");
    assert_eq!(budget, 3);
    let pool: Vec<ScoredCandidate> =
      (0..6).map(|i| scored(&format!("c{i}"), 90 - i as u8, i + 1)).collect();
    assert_eq!(select_top(pool, budget).len(), 3);
  }

  #[test]
  fn pace_buckets_map_to_hours() {
    assert_eq!(hours_per_week("1-3"), 2.0);
    assert_eq!(hours_per_week("4-7"), 5.5);
    assert_eq!(hours_per_week("8-15"), 11.5);
    assert_eq!(hours_per_week("15+"), 20.0);
    assert_eq!(hours_per_week("unknown"), 5.5);
  }
}
