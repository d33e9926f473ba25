//! Application state: in-memory stores, prompts, and the generative-text port.
//!
//! This module owns:
//!   - the course catalog (TOML bank + built-in seeds)
//!   - enrollment sets per student
//!   - preference profiles (written only by survey submission)
//!   - stored learning paths (one aggregate per student, overwritten whole)
//!
//! The stores satisfy the read/write contract the engine needs; swapping in a
//! durable backend only has to preserve these method signatures.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::{load_planner_config_from_env, Prompts};
use crate::domain::{Course, LearningPath, Level, PreferenceProfile};
use crate::error::AppError;
use crate::genai::{OpenAi, TextGenerationPort};
use crate::seeds::seed_courses;

#[derive(Clone)]
pub struct AppState {
    pub courses: Arc<RwLock<HashMap<String, Course>>>,
    pub enrollments: Arc<RwLock<HashMap<String, HashSet<String>>>>,
    pub profiles: Arc<RwLock<HashMap<String, PreferenceProfile>>>,
    pub paths: Arc<RwLock<HashMap<String, LearningPath>>>,
    pub genai: Option<Arc<dyn TextGenerationPort>>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, seed the catalog, init the
    /// generative client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg_opt = load_planner_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();

        let mut course_map = HashMap::<String, Course>::new();

        // Insert config-bank courses (if any).
        if let Some(cfg) = &cfg_opt {
            for cc in &cfg.courses {
                let id = cc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                let level = match Level::parse(&cc.level) {
                    Some(l) => l,
                    None => {
                        error!(target: "catalog", %id, level = %cc.level, "Skipping bank course: unknown level.");
                        continue;
                    }
                };
                let course = Course {
                    id: id.clone(),
                    title: cc.title.clone(),
                    subtitle: cc.subtitle.clone().unwrap_or_default(),
                    description: cc.description.clone().unwrap_or_default(),
                    level,
                    categories: cc.categories.clone(),
                    rating: cc.rating.unwrap_or(0.0).clamp(0.0, 5.0),
                    duration: cc.duration.clone().unwrap_or_default(),
                    will_learn: cc.will_learn.clone(),
                    thumbnail: cc.thumbnail.clone().unwrap_or_default(),
                    price: cc.price.unwrap_or(0.0),
                    active: true,
                };
                course_map.insert(id, course);
            }
        }

        // Always insert built-in seeds, but don't overwrite bank entries.
        for c in seed_courses() {
            course_map.entry(c.id.clone()).or_insert(c);
        }

        // Inventory summary by level.
        let mut count_by_level: HashMap<Level, usize> = HashMap::new();
        for c in course_map.values() {
            *count_by_level.entry(c.level).or_insert(0) += 1;
        }
        for (level, n) in count_by_level {
            info!(target: "catalog", ?level, courses = n, "Startup catalog inventory");
        }

        // Build optional generative client (if API key present).
        let openai = OpenAi::from_env();
        if let Some(oa) = &openai {
            info!(target: "lotrinh_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            info!(target: "lotrinh_backend", "OpenAI disabled (no OPENAI_API_KEY). Using template fallbacks.");
        }
        let genai: Option<Arc<dyn TextGenerationPort>> =
            openai.map(|oa| Arc::new(oa) as Arc<dyn TextGenerationPort>);

        Self {
            courses: Arc::new(RwLock::new(course_map)),
            enrollments: Arc::new(RwLock::new(HashMap::new())),
            profiles: Arc::new(RwLock::new(HashMap::new())),
            paths: Arc::new(RwLock::new(HashMap::new())),
            genai,
            prompts,
        }
    }

    /// Empty state with a caller-supplied port; the test constructor.
    #[cfg(test)]
    pub fn bare(genai: Option<Arc<dyn TextGenerationPort>>) -> Self {
        Self {
            courses: Arc::new(RwLock::new(HashMap::new())),
            enrollments: Arc::new(RwLock::new(HashMap::new())),
            profiles: Arc::new(RwLock::new(HashMap::new())),
            paths: Arc::new(RwLock::new(HashMap::new())),
            genai,
            prompts: Prompts::default(),
        }
    }

    /// All active catalog courses, the generation run's read view.
    pub async fn active_courses(&self) -> Vec<Course> {
        let courses = self.courses.read().await;
        courses.values().filter(|c| c.active).cloned().collect()
    }

    /// Course ids the student is already enrolled in.
    pub async fn enrolled_ids(&self, student_id: &str) -> HashSet<String> {
        let enrollments = self.enrollments.read().await;
        enrollments.get(student_id).cloned().unwrap_or_default()
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn insert_course(&self, c: Course) {
        let mut courses = self.courses.write().await;
        courses.insert(c.id.clone(), c);
    }

    pub async fn get_profile(&self, student_id: &str) -> Option<PreferenceProfile> {
        let profiles = self.profiles.read().await;
        profiles.get(student_id).cloned()
    }

    /// Survey submission is the only writer of profiles; a resubmission
    /// replaces the previous one whole.
    #[instrument(level = "info", skip(self, p), fields(student_id = %p.student_id))]
    pub async fn upsert_profile(&self, p: PreferenceProfile) -> Result<(), AppError> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(p.student_id.clone(), p);
        Ok(())
    }

    pub async fn get_path(&self, student_id: &str) -> Option<LearningPath> {
        let paths = self.paths.read().await;
        paths.get(student_id).cloned()
    }

    /// Single-aggregate overwrite: stamps `last_generated_at`, bumps
    /// `regeneration_count` past the stored value, and replaces the plan in
    /// one write. No partial plan is ever visible.
    #[instrument(level = "info", skip(self, path), fields(student_id = %path.student_id))]
    pub async fn store_path(&self, mut path: LearningPath) -> Result<LearningPath, AppError> {
        let mut paths = self.paths.write().await;
        let prev_count = paths
            .get(&path.student_id)
            .map(|p| p.regeneration_count)
            .unwrap_or(0);
        path.regeneration_count = prev_count + 1;
        path.last_generated_at = Utc::now();
        paths.insert(path.student_id.clone(), path.clone());
        info!(target: "pathgen", student_id = %path.student_id, regeneration_count = path.regeneration_count, phases = path.phases.len(), "Learning path stored");
        Ok(path)
    }
}
