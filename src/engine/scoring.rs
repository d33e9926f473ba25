//! Match scoring: a pure weighted sum in 0..=100.
//!
//! Weights: level fit 30 (with two partial-credit adjacencies), category
//! overlap 40, rating 20, description quality 10.

use crate::domain::{CourseCandidate, Level, PreferenceProfile, ScoredCandidate};

fn level_points(user: Level, course: Level) -> i32 {
  if user == course {
    return 30;
  }
  match (user, course) {
    (Level::Intermediate, Level::Beginner) => 20,
    (Level::Advanced, Level::Intermediate) => 25,
    _ => 0,
  }
}

/// Deterministic fit score for one candidate against one profile.
/// No side effects; same inputs always yield the same score.
pub fn match_score(c: &CourseCandidate, p: &PreferenceProfile) -> u8 {
  let mut score = level_points(p.current_level, c.level);

  if !p.interested_skills.is_empty() {
    let matching = c
      .categories
      .iter()
      .filter(|cat| p.interested_skills.contains(cat))
      .count();
    score += ((matching as f64 / p.interested_skills.len() as f64) * 40.0).round() as i32;
  }

  score += ((f64::from(c.rating) / 5.0) * 20.0).round() as i32;

  if c.description_len > 100 {
    score += 5;
  }
  if c.has_will_learn {
    score += 5;
  }

  score.clamp(0, 100) as u8
}

/// Score every candidate and order by descending score (stable on input
/// order for ties), assigning 1-based ranks.
pub fn score_all(candidates: Vec<CourseCandidate>, p: &PreferenceProfile) -> Vec<ScoredCandidate> {
  let mut scored: Vec<ScoredCandidate> = candidates
    .into_iter()
    .map(|candidate| {
      let match_score = match_score(&candidate, p);
      ScoredCandidate { candidate, match_score, rank: 0 }
    })
    .collect();
  scored.sort_by(|a, b| b.match_score.cmp(&a.match_score));
  for (i, s) in scored.iter_mut().enumerate() {
    s.rank = i + 1;
  }
  scored
}
