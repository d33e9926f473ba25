//! Phase planning: partition the selected courses into ordered, time-boxed
//! phases of progressive difficulty.

use crate::domain::{Phase, PhaseCourse, Recommendation, ScoredCandidate};
use crate::engine::budget::hours_per_week;

/// Target phase count per completion timeline, before the ⌈N/2⌉ bound.
fn phase_count_table(target_completion_time: &str) -> usize {
  match target_completion_time {
    "1-month" => 2,
    "3-months" => 3,
    "6-months" => 4,
    "1-year+" => 5,
    _ => 3,
  }
}

/// Effective phase count: the timeline's target bounded by ⌈N/2⌉ so short
/// selections don't fragment into one-course slivers.
pub fn phase_count(target_completion_time: &str, selected_count: usize) -> usize {
  if selected_count == 0 {
    return 0;
  }
  let ceil_half = selected_count.div_ceil(2);
  phase_count_table(target_completion_time).min(ceil_half).max(1)
}

/// Weeks/days/human-string from content hours at the student's pace.
/// Weeks is clamped to at least 1; workloads under a week display as days.
pub fn schedule_from_hours(total_hours: f64, hpw: f64) -> (u32, u32, String) {
  let raw = if hpw > 0.0 { total_hours / hpw } else { 0.0 };
  if raw > 0.0 && raw < 1.0 {
    let days = (raw * 7.0).ceil() as u32;
    let days = days.max(1);
    (1, days, format!("{} ngày", days))
  } else {
    let weeks = raw.ceil().max(1.0) as u32;
    (weeks, weeks * 7, human_time_for_weeks(weeks))
  }
}

/// Re-derivation used after a narrator override: days and the display string
/// always follow the final weeks value.
pub fn human_time_for_weeks(weeks: u32) -> String {
  if weeks < 4 {
    format!("{} tuần", weeks)
  } else {
    let months = ((f64::from(weeks)) / 4.0).round().max(1.0) as u32;
    format!("{} tháng", months)
  }
}

/// Partition the annotated selection into phases.
///
/// Courses are ordered by level rank (match score descending as tiebreak)
/// and chunked contiguously at ⌈N/phaseCount⌉, so phase 1 leans beginner and
/// the last phase carries the most advanced material. Difficulty is
/// monotonic across phases by construction.
///
/// `selected` and `recs` are aligned by index (rationale preserves order).
pub fn plan_phases(
  selected: &[ScoredCandidate],
  recs: &[Recommendation],
  weekly_study_hours: &str,
  target_completion_time: &str,
) -> Vec<Phase> {
  let count = phase_count(target_completion_time, selected.len());
  if count == 0 {
    return vec![];
  }

  let mut entries: Vec<(&ScoredCandidate, &Recommendation)> =
    selected.iter().zip(recs).collect();
  entries.sort_by(|(a, _), (b, _)| {
    a.candidate
      .level
      .rank()
      .cmp(&b.candidate.level.rank())
      .then(b.match_score.cmp(&a.match_score))
  });

  let chunk_size = entries.len().div_ceil(count);
  let hpw = hours_per_week(weekly_study_hours);

  entries
    .chunks(chunk_size)
    .enumerate()
    .map(|(i, chunk)| {
      let courses: Vec<PhaseCourse> = chunk
        .iter()
        .enumerate()
        .map(|(j, (s, r))| PhaseCourse {
          course_id: Some(s.candidate.course_id.clone()),
          title: None,
          reason: r.reason.clone(),
          order: (j + 1) as u32,
          match_score: s.match_score,
          estimated_hours: s.candidate.content_hours,
        })
        .collect();

      let total_hours: f64 = courses.iter().map(|c| c.estimated_hours).sum();
      let (weeks, days, human) = schedule_from_hours(total_hours, hpw);

      Phase {
        // Narration (AI or fallback) fills title and rationale afterwards.
        title: String::new(),
        description: format!("{} khóa học · {:.1} giờ nội dung", courses.len(), total_hours),
        phase_rationale: String::new(),
        order: (i + 1) as u32,
        estimated_weeks: weeks,
        estimated_days: days,
        estimated_time: human,
        total_hours,
        courses,
      }
    })
    .collect()
}
