use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::energy::ActivityLevel;
use crate::error::{EngineError, require_positive};

/// Protein/carb/fat grams plus energy. Used for targets, food records and
/// scaled servings alike.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub calories: f64,
}

impl Macros {
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fats_g: self.fats_g * factor,
            calories: self.calories * factor,
        }
    }
}

impl Add for Macros {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fats_g: self.fats_g + rhs.fats_g,
            calories: self.calories + rhs.calories,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Macros {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            protein_g: self.protein_g - rhs.protein_g,
            carbs_g: self.carbs_g - rhs.carbs_g,
            fats_g: self.fats_g - rhs.fats_g,
            calories: self.calories - rhs.calories,
        }
    }
}

// --- Profile ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }
}

impl FromStr for Sex {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" => Ok(Self::Female),
            "male" | "m" => Ok(Self::Male),
            _ => Err(EngineError::invalid("sex", format!("'{s}' must be female or male"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub current_weight_kg: f64,
    pub target_weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub targets: Macros,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub current_weight_kg: f64,
    pub target_weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub targets: Macros,
}

impl NewProfile {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::invalid("name", "must not be empty"));
        }
        if self.age == 0 {
            return Err(EngineError::invalid("age", "must be greater than 0"));
        }
        require_positive("height_cm", self.height_cm)?;
        require_positive("current_weight_kg", self.current_weight_kg)?;
        require_positive("target_weight", self.target_weight_kg)?;
        Ok(())
    }
}

// --- Nutrition ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

pub const MEAL_SLOTS: &[MealSlot] = &[
    MealSlot::Breakfast,
    MealSlot::Lunch,
    MealSlot::Dinner,
    MealSlot::Snack,
];

impl MealSlot {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        MEAL_SLOTS
            .iter()
            .copied()
            .find(|slot| slot.as_str() == lower)
            .ok_or_else(|| {
                EngineError::invalid(
                    "meal",
                    format!("'{s}' must be one of: breakfast, lunch, dinner, snack"),
                )
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionLog {
    pub id: i64,
    pub profile_id: i64,
    pub date: NaiveDate,
    pub totals: Macros,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealEntry {
    pub id: i64,
    pub log_id: i64,
    pub slot: MealSlot,
    pub food_name: String,
    pub serving: String,
    pub macros: Macros,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMealEntry {
    pub log_id: i64,
    pub slot: MealSlot,
    pub food_name: String,
    pub serving: String,
    pub macros: Macros,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealGroup {
    pub slot: MealSlot,
    pub entries: Vec<MealEntry>,
    pub subtotal: Macros,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub log_id: Option<i64>,
    pub meals: Vec<MealGroup>,
    pub totals: Macros,
    pub targets: Macros,
    pub remaining: Macros,
}

// --- Food lookup records ---

pub const DEFAULT_SERVING_SIZE: f64 = 100.0;

/// A food as returned by a lookup service, already normalized.
///
/// `macros` are per `serving_size` of `serving_unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub source_id: Option<String>,
    pub description: String,
    pub brand: String,
    pub serving_size: f64,
    pub serving_unit: String,
    pub macros: Macros,
}

impl FoodRecord {
    /// Reference serving with absent/zero/negative sizes replaced by 100.
    #[must_use]
    pub fn normalized_serving_size(&self) -> f64 {
        normalize_serving_size(Some(self.serving_size))
    }
}

#[must_use]
pub fn normalize_serving_size(size: Option<f64>) -> f64 {
    match size {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => DEFAULT_SERVING_SIZE,
    }
}

// --- Workouts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkoutCategory {
    Strength,
    Cardio,
    Sculpt,
    #[serde(rename = "HIIT")]
    Hiit,
    Yoga,
    Other,
}

pub const WORKOUT_CATEGORIES: &[WorkoutCategory] = &[
    WorkoutCategory::Strength,
    WorkoutCategory::Cardio,
    WorkoutCategory::Sculpt,
    WorkoutCategory::Hiit,
    WorkoutCategory::Yoga,
    WorkoutCategory::Other,
];

impl WorkoutCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strength => "Strength",
            Self::Cardio => "Cardio",
            Self::Sculpt => "Sculpt",
            Self::Hiit => "HIIT",
            Self::Yoga => "Yoga",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for WorkoutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutCategory {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        WORKOUT_CATEGORIES
            .iter()
            .copied()
            .find(|c| c.as_str().to_lowercase() == lower)
            .ok_or_else(|| {
                EngineError::invalid(
                    "category",
                    format!("'{s}' must be one of: Strength, Cardio, Sculpt, HIIT, Yoga, Other"),
                )
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseEntry {
    pub id: i64,
    pub workout_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_part: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_muscle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight_kg: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub source_id: Option<String>,
    pub body_part: Option<String>,
    pub target_muscle: Option<String>,
    pub equipment: Option<String>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight_kg: f64,
}

impl NewExercise {
    /// Fill the directory fields from a lookup result, keeping user-entered
    /// sets/reps/weight.
    #[must_use]
    pub fn with_record(mut self, record: &ExerciseRecord) -> Self {
        self.source_id = Some(record.source_id.clone());
        self.body_part = Some(record.body_part.clone());
        self.target_muscle = Some(record.target.clone());
        self.equipment = Some(record.equipment.clone());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutSession {
    pub id: i64,
    pub profile_id: i64,
    pub date: NaiveDate,
    pub category: WorkoutCategory,
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub exercises: Vec<ExerciseEntry>,
    pub created_at: String,
}

/// A validated workout ready to persist. Build with [`WorkoutBuilder`].
#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub date: NaiveDate,
    pub category: WorkoutCategory,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub exercises: Vec<NewExercise>,
}

/// Accumulates exercises for a session before it is saved.
#[derive(Debug, Clone)]
pub struct WorkoutBuilder {
    date: NaiveDate,
    category: WorkoutCategory,
    duration_minutes: Option<u32>,
    notes: Option<String>,
    exercises: Vec<NewExercise>,
}

impl WorkoutBuilder {
    #[must_use]
    pub fn new(date: NaiveDate, category: WorkoutCategory) -> Self {
        Self {
            date,
            category,
            duration_minutes: None,
            notes: None,
            exercises: Vec::new(),
        }
    }

    #[must_use]
    pub fn duration_minutes(mut self, minutes: Option<u32>) -> Self {
        self.duration_minutes = minutes;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn add_exercise(&mut self, exercise: NewExercise) -> &mut Self {
        self.exercises.push(exercise);
        self
    }

    pub fn remove_exercise(&mut self, index: usize) -> Option<NewExercise> {
        (index < self.exercises.len()).then(|| self.exercises.remove(index))
    }

    #[must_use]
    pub fn exercises(&self) -> &[NewExercise] {
        &self.exercises
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn build(self) -> Result<NewWorkout, EngineError> {
        if self.exercises.is_empty() {
            return Err(EngineError::invalid(
                "exercises",
                "add at least one exercise before saving",
            ));
        }
        for ex in &self.exercises {
            if ex.name.trim().is_empty() {
                return Err(EngineError::invalid("exercise name", "must not be empty"));
            }
            if !ex.weight_kg.is_finite() || ex.weight_kg < 0.0 {
                return Err(EngineError::invalid(
                    "exercise weight",
                    format!("must be 0 or more (got {})", ex.weight_kg),
                ));
            }
        }
        Ok(NewWorkout {
            date: self.date,
            category: self.category,
            duration_minutes: self.duration_minutes,
            notes: self.notes,
            exercises: self.exercises,
        })
    }
}

// --- Exercise lookup records ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseSearchMode {
    Name,
    BodyPart,
    Target,
    Equipment,
}

impl FromStr for ExerciseSearchMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "name" => Ok(Self::Name),
            "body-part" | "bodypart" => Ok(Self::BodyPart),
            "target" | "muscle" => Ok(Self::Target),
            "equipment" => Ok(Self::Equipment),
            _ => Err(EngineError::invalid(
                "search mode",
                format!("'{s}' must be one of: name, body-part, target, equipment"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub source_id: String,
    pub name: String,
    pub body_part: String,
    pub target: String,
    pub equipment: String,
}

// --- Progress ---

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEntry {
    pub id: i64,
    pub profile_id: i64,
    pub date: NaiveDate,
    pub weight_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waist_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chest_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arms_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thighs_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewProgressEntry {
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub body_fat_pct: Option<f64>,
    pub waist_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub arms_cm: Option<f64>,
    pub thighs_cm: Option<f64>,
    pub photo_path: Option<String>,
    pub notes: Option<String>,
}

impl NewProgressEntry {
    pub fn validate(&self) -> Result<(), EngineError> {
        require_positive("weight", self.weight_kg)?;
        if let Some(bf) = self.body_fat_pct {
            if !bf.is_finite() || !(0.0..=100.0).contains(&bf) {
                return Err(EngineError::invalid(
                    "body_fat_pct",
                    format!("must be between 0 and 100 (got {bf})"),
                ));
            }
        }
        for (field, value) in [
            ("waist", self.waist_cm),
            ("chest", self.chest_cm),
            ("arms", self.arms_cm),
            ("thighs", self.thighs_cm),
        ] {
            if let Some(v) = value {
                require_positive(field, v)?;
            }
        }
        Ok(())
    }
}
