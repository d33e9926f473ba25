//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! engine; each handler is instrumented and logs basic result info.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::{Level, PreferenceProfile};
use crate::engine;
use crate::error::AppError;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body), fields(student_id = %body.student_id))]
pub async fn http_post_survey(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SurveyIn>,
) -> Result<impl IntoResponse, AppError> {
    let profile = profile_from_survey(body)?;
    info!(target: "pathgen", student_id = %profile.student_id, level = ?profile.current_level, completed_at = %profile.completed_at, "Survey accepted");
    state.upsert_profile(profile).await?;
    Ok(Json(SurveyOut { ok: true }))
}

#[instrument(level = "info", skip(state, body), fields(student_id = %body.student_id, custom = body.plan.is_some()))]
pub async fn http_post_generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateIn>,
) -> Result<Json<PathOut>, AppError> {
    if body.student_id.trim().is_empty() {
        return Err(AppError::validation("studentId", "student id is required"));
    }
    let out = match &body.plan {
        Some(plan) => engine::ingest_custom_path(&state, &body.student_id, plan).await?,
        None => engine::generate_path(&state, &body.student_id).await?,
    };
    info!(target: "pathgen", student_id = %body.student_id, phases = out.phases.len(), courses = out.recommended_courses.len(), "Path request served");
    Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(student_id = %q.student_id))]
pub async fn http_get_path(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PathQuery>,
) -> Result<Json<PathOut>, AppError> {
    Ok(Json(engine::read_path(&state, &q.student_id).await?))
}

/// Field-level survey validation; nothing is persisted on rejection.
fn profile_from_survey(body: SurveyIn) -> Result<PreferenceProfile, AppError> {
    if body.student_id.trim().is_empty() {
        return Err(AppError::validation("studentId", "student id is required"));
    }
    if body.learning_goal.trim().is_empty() {
        return Err(AppError::validation("learningGoal", "learning goal is required"));
    }
    let current_level = Level::parse(&body.current_level).ok_or_else(|| {
        AppError::validation(
            "currentLevel",
            "must be one of beginner | intermediate | advanced | expert",
        )
    })?;
    if body.weekly_study_hours.trim().is_empty() {
        return Err(AppError::validation("weeklyStudyHours", "weekly study hours is required"));
    }
    if body.target_completion_time.trim().is_empty() {
        return Err(AppError::validation(
            "targetCompletionTime",
            "target completion time is required",
        ));
    }

    let mut interested_skills: Vec<String> = Vec::new();
    for s in body.interested_skills {
        let s = s.trim().to_string();
        if !s.is_empty() && !interested_skills.contains(&s) {
            interested_skills.push(s);
        }
    }

    Ok(PreferenceProfile {
        student_id: body.student_id.trim().to_string(),
        learning_goal: body.learning_goal.trim().to_string(),
        objectives: body.objectives,
        interested_skills,
        current_level,
        weekly_study_hours: body.weekly_study_hours.trim().to_string(),
        target_completion_time: body.target_completion_time.trim().to_string(),
        survey_completed: true,
        completed_at: Utc::now(),
    })
}
