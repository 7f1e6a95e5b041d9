use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::Database;
use crate::energy::{self, ActivityLevel, BmrOffset, BodyMetrics, EnergyEstimate};
use crate::error::EngineError;
use crate::models::{
    DailySummary, ExerciseRecord, ExerciseSearchMode, FoodRecord, Macros, MealEntry, MealSlot,
    NewProfile, NewProgressEntry, NutritionLog, Profile, ProgressEntry, Sex,
    WorkoutBuilder, WorkoutSession,
};
use crate::planner::{self, PlannerOptions};
use crate::serving;
use crate::trend::{self, TrendPolicy, WeightChange};

/// Food lookup collaborator.
///
/// Implementations are fail-soft: network or parse failures are logged and
/// reported as an empty list, never as an error.
pub trait FoodLookupProvider: Send + Sync {
    fn search_foods(&self, query: &str) -> Vec<FoodRecord>;

    /// Full record for one food by its source id.
    fn food_details(&self, _source_id: &str) -> Option<FoodRecord> {
        None
    }
}

/// Exercise directory collaborator, fail-soft like [`FoodLookupProvider`].
pub trait ExerciseLookupProvider: Send + Sync {
    fn search_exercises(&self, query: &str, mode: ExerciseSearchMode) -> Vec<ExerciseRecord>;
}

/// Tunables for the formulas, usually loaded from the CLI config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineSettings {
    pub planner: PlannerOptions,
    pub bmr_offset: BmrOffset,
    pub trend: TrendPolicy,
}

/// Raw profile input, already in metric units.
#[derive(Debug, Clone)]
pub struct ProfileSetup {
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    pub activity_level: ActivityLevel,
}

impl ProfileSetup {
    fn metrics(&self) -> BodyMetrics {
        BodyMetrics {
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            age: self.age,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TargetPlan {
    pub estimate: EnergyEstimate,
    pub targets: Macros,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub profile: Profile,
    pub today: DailySummary,
    pub latest_progress: Option<ProgressEntry>,
    pub weight_change: Option<WeightChange>,
    pub recent_workouts: Vec<WorkoutSession>,
}

pub struct RecompService {
    db: Database,
    settings: EngineSettings,
}

impl RecompService {
    pub fn new(db_path: &Path, settings: EngineSettings) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db, settings })
    }

    pub fn new_in_memory(settings: EngineSettings) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db, settings })
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // --- Profile & targets ---

    /// Compute targets for the given body and goal without saving anything.
    pub fn plan_targets(
        &self,
        metrics: &BodyMetrics,
        activity_level: ActivityLevel,
        target_weight_kg: f64,
    ) -> Result<TargetPlan, EngineError> {
        let estimate = energy::estimate(metrics, activity_level, self.settings.bmr_offset)?;
        let targets = planner::plan(estimate.tdee, target_weight_kg, &self.settings.planner)?;
        Ok(TargetPlan { estimate, targets })
    }

    pub fn setup_profile(&self, setup: &ProfileSetup) -> Result<(Profile, TargetPlan)> {
        let plan = self.plan_targets(
            &setup.metrics(),
            setup.activity_level,
            setup.target_weight_kg,
        )?;
        let profile = self.db.create_profile(&NewProfile {
            name: setup.name.clone(),
            age: setup.age,
            sex: setup.sex,
            height_cm: setup.height_cm,
            current_weight_kg: setup.weight_kg,
            target_weight_kg: setup.target_weight_kg,
            activity_level: setup.activity_level,
            targets: plan.targets,
        })?;
        Ok((profile, plan))
    }

    /// The single profile; errors if setup has not been run.
    pub fn profile(&self) -> Result<Profile> {
        self.db.require_profile()
    }

    /// Recompute and store targets from the profile's current metrics.
    pub fn recalculate_targets(
        &self,
        profile: &Profile,
        activity_level: Option<ActivityLevel>,
    ) -> Result<(Profile, TargetPlan)> {
        let activity_level = activity_level.unwrap_or(profile.activity_level);
        let metrics = BodyMetrics {
            weight_kg: profile.current_weight_kg,
            height_cm: profile.height_cm,
            age: profile.age,
        };
        let plan = self.plan_targets(&metrics, activity_level, profile.target_weight_kg)?;
        let updated = self
            .db
            .update_profile_targets(&plan.targets, activity_level)?;
        Ok((updated, plan))
    }

    pub fn set_manual_targets(
        &self,
        profile: &Profile,
        protein_g: f64,
        carbs_g: f64,
        fats_g: f64,
    ) -> Result<Profile> {
        let targets = planner::from_grams(protein_g, carbs_g, fats_g)?;
        self.db
            .update_profile_targets(&targets, profile.activity_level)
    }

    pub fn set_target_weight(&self, target_weight_kg: f64) -> Result<Profile> {
        self.db.update_target_weight(target_weight_kg)
    }

    // --- Lookups ---

    pub fn search_foods(
        &self,
        provider: &dyn FoodLookupProvider,
        query: &str,
    ) -> Result<Vec<FoodRecord>, EngineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EngineError::invalid("query", "must not be empty"));
        }
        let results = provider.search_foods(query);
        if results.is_empty() {
            warn!(query, "food lookup returned no results");
            return Err(EngineError::LookupUnavailable {
                query: query.to_string(),
            });
        }
        Ok(results)
    }

    pub fn food_details(
        &self,
        provider: &dyn FoodLookupProvider,
        source_id: &str,
    ) -> Result<FoodRecord, EngineError> {
        provider
            .food_details(source_id.trim())
            .ok_or_else(|| EngineError::LookupUnavailable {
                query: source_id.trim().to_string(),
            })
    }

    pub fn search_exercises(
        &self,
        provider: &dyn ExerciseLookupProvider,
        query: &str,
        mode: ExerciseSearchMode,
    ) -> Result<Vec<ExerciseRecord>, EngineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EngineError::invalid("query", "must not be empty"));
        }
        let results = provider.search_exercises(query, mode);
        if results.is_empty() {
            warn!(query, ?mode, "exercise lookup returned no results");
            return Err(EngineError::LookupUnavailable {
                query: query.to_string(),
            });
        }
        Ok(results)
    }

    // --- Nutrition ---

    /// Scale `food` to `serving` (in the record's own unit) and add it to the
    /// day's log.
    pub fn log_food(
        &self,
        profile: &Profile,
        date: NaiveDate,
        slot: MealSlot,
        food: &FoodRecord,
        serving: f64,
    ) -> Result<MealEntry> {
        let macros = serving::scale(food, serving)?;
        self.db.add_meal_for_day(
            profile.id,
            date,
            slot,
            &food.description,
            &format!("{serving} {}", food.serving_unit),
            &macros,
        )
    }

    /// Log an entry whose macros were entered by hand.
    pub fn log_custom(
        &self,
        profile: &Profile,
        date: NaiveDate,
        slot: MealSlot,
        food_name: &str,
        serving: &str,
        macros: Macros,
    ) -> Result<MealEntry> {
        self.db
            .add_meal_for_day(profile.id, date, slot, food_name, serving, &macros)
    }

    /// Remove a logged entry by id, returning what was removed.
    pub fn remove_meal(&self, entry_id: i64) -> Result<MealEntry> {
        let entry = self.db.get_meal_entry(entry_id)?;
        let log = self.db.get_log_by_id(entry.log_id)?;
        self.db.remove_meal(&log, &entry)?;
        info!(entry_id, "meal entry removed");
        Ok(entry)
    }

    pub fn daily_summary(&self, profile: &Profile, date: NaiveDate) -> Result<DailySummary> {
        self.db.daily_summary(profile, date)
    }

    pub fn set_day_notes(
        &self,
        profile: &Profile,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<NutritionLog> {
        let log = self.db.get_or_create_log(profile.id, date)?;
        self.db.set_log_notes(log.id, notes)
    }

    // --- Workouts ---

    pub fn save_workout(&self, profile: &Profile, builder: WorkoutBuilder) -> Result<WorkoutSession> {
        let workout = builder.build()?;
        self.db.save_workout(profile.id, &workout)
    }

    pub fn list_workouts(&self, limit: Option<u32>) -> Result<Vec<WorkoutSession>> {
        self.db.list_workouts(limit)
    }

    pub fn get_workout(&self, id: i64) -> Result<WorkoutSession> {
        self.db.get_workout(id)
    }

    pub fn delete_workout(&self, id: i64) -> Result<bool> {
        self.db.delete_workout(id)
    }

    // --- Progress ---

    pub fn log_progress(&self, profile: &Profile, entry: &NewProgressEntry) -> Result<ProgressEntry> {
        self.db.log_progress(profile.id, entry)
    }

    /// Every entry, most recent first.
    pub fn progress_history(&self) -> Result<Vec<ProgressEntry>> {
        self.db.get_progress_entries(None)
    }

    pub fn weight_change(&self) -> Result<WeightChange> {
        let entries = self.db.get_progress_entries(None)?;
        Ok(trend::change(&entries, &self.settings.trend)?)
    }

    pub fn delete_progress(&self, id: i64) -> Result<bool> {
        self.db.delete_progress_entry(id)
    }

    // --- Dashboard ---

    pub fn dashboard(&self, date: NaiveDate, recent_workouts: u32) -> Result<Dashboard> {
        let profile = self.profile()?;
        let today = self.db.daily_summary(&profile, date)?;
        let entries = self.db.get_progress_entries(None)?;
        let latest_progress = trend::latest(&entries).ok().cloned();
        let weight_change = trend::change(&entries, &self.settings.trend).ok();
        let recent_workouts = self.db.list_workouts(Some(recent_workouts))?;
        Ok(Dashboard {
            profile,
            today,
            latest_progress,
            weight_change,
            recent_workouts,
        })
    }
}
