use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::energy::ActivityLevel;
use crate::models::{
    ExerciseEntry, Macros, NewProfile, NewProgressEntry, NewWorkout, Profile, ProgressEntry,
    WorkoutSession,
};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    #[allow(clippy::too_many_lines)]
    fn migrate(&self) -> Result<()> {
        // Cascades from workouts/logs to their children depend on this.
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            debug!(from = version, to = 1, "migrating schema");
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS profile (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    name TEXT NOT NULL,
                    age INTEGER NOT NULL CHECK (age > 0),
                    sex TEXT NOT NULL,
                    height_cm REAL NOT NULL,
                    current_weight_kg REAL NOT NULL,
                    target_weight_kg REAL NOT NULL,
                    activity_level TEXT NOT NULL,
                    target_protein_g REAL NOT NULL,
                    target_carbs_g REAL NOT NULL,
                    target_fats_g REAL NOT NULL,
                    target_calories REAL NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS workouts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    profile_id INTEGER NOT NULL REFERENCES profile(id),
                    date TEXT NOT NULL,
                    category TEXT NOT NULL,
                    duration_minutes INTEGER,
                    notes TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS exercises (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                    position INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    source_id TEXT,
                    body_part TEXT,
                    target_muscle TEXT,
                    equipment TEXT,
                    sets INTEGER,
                    reps INTEGER,
                    weight_kg REAL NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS nutrition_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    profile_id INTEGER NOT NULL REFERENCES profile(id),
                    date TEXT NOT NULL,
                    total_protein INTEGER NOT NULL DEFAULT 0,
                    total_carbs INTEGER NOT NULL DEFAULT 0,
                    total_fats INTEGER NOT NULL DEFAULT 0,
                    total_calories INTEGER NOT NULL DEFAULT 0,
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    UNIQUE (profile_id, date)
                );

                CREATE TABLE IF NOT EXISTS meal_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    log_id INTEGER NOT NULL REFERENCES nutrition_logs(id) ON DELETE CASCADE,
                    meal_slot TEXT NOT NULL,
                    food_name TEXT NOT NULL,
                    serving TEXT NOT NULL,
                    protein INTEGER NOT NULL,
                    carbs INTEGER NOT NULL,
                    fats INTEGER NOT NULL,
                    calories INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS progress_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    profile_id INTEGER NOT NULL REFERENCES profile(id),
                    date TEXT NOT NULL,
                    weight_kg REAL NOT NULL,
                    body_fat_pct REAL,
                    waist_cm REAL,
                    chest_cm REAL,
                    arms_cm REAL,
                    thighs_cm REAL,
                    photo_path TEXT,
                    notes TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts(date);
                CREATE INDEX IF NOT EXISTS idx_exercises_workout ON exercises(workout_id);
                CREATE INDEX IF NOT EXISTS idx_meal_entries_log ON meal_entries(log_id);
                CREATE INDEX IF NOT EXISTS idx_progress_date ON progress_entries(date);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    pub(crate) fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let raw: String = row.get(idx)?;
        raw.parse::<T>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    pub(crate) fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
        let raw: String = row.get(idx)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            sex: Self::parse_column(row, 3)?,
            height_cm: row.get(4)?,
            current_weight_kg: row.get(5)?,
            target_weight_kg: row.get(6)?,
            activity_level: Self::parse_column(row, 7)?,
            targets: Macros {
                protein_g: row.get(8)?,
                carbs_g: row.get(9)?,
                fats_g: row.get(10)?,
                calories: row.get(11)?,
            },
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    // Expects columns:
    // 0: id, 1: workout_id, 2: name, 3: source_id, 4: body_part, 5: target_muscle,
    // 6: equipment, 7: sets, 8: reps, 9: weight_kg
    fn exercise_from_row(row: &rusqlite::Row) -> rusqlite::Result<ExerciseEntry> {
        Ok(ExerciseEntry {
            id: row.get(0)?,
            workout_id: row.get(1)?,
            name: row.get(2)?,
            source_id: row.get(3)?,
            body_part: row.get(4)?,
            target_muscle: row.get(5)?,
            equipment: row.get(6)?,
            sets: row.get(7)?,
            reps: row.get(8)?,
            weight_kg: row.get(9)?,
        })
    }

    fn workout_from_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutSession> {
        Ok(WorkoutSession {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            date: Self::date_column(row, 2)?,
            category: Self::parse_column(row, 3)?,
            duration_minutes: row.get(4)?,
            notes: row.get(5)?,
            exercises: Vec::new(),
            created_at: row.get(6)?,
        })
    }

    fn progress_from_row(row: &rusqlite::Row) -> rusqlite::Result<ProgressEntry> {
        Ok(ProgressEntry {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            date: Self::date_column(row, 2)?,
            weight_kg: row.get(3)?,
            body_fat_pct: row.get(4)?,
            waist_cm: row.get(5)?,
            chest_cm: row.get(6)?,
            arms_cm: row.get(7)?,
            thighs_cm: row.get(8)?,
            photo_path: row.get(9)?,
            notes: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    // --- Profile ---

    pub fn create_profile(&self, profile: &NewProfile) -> Result<Profile> {
        profile.validate()?;
        if self.get_profile()?.is_some() {
            bail!("A profile already exists; only one profile is supported");
        }
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO profile (id, name, age, sex, height_cm, current_weight_kg, target_weight_kg,
                                  activity_level, target_protein_g, target_carbs_g, target_fats_g,
                                  target_calories, created_at, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                profile.name.trim(),
                profile.age,
                profile.sex.as_str(),
                profile.height_cm,
                profile.current_weight_kg,
                profile.target_weight_kg,
                profile.activity_level.as_str(),
                profile.targets.protein_g,
                profile.targets.carbs_g,
                profile.targets.fats_g,
                profile.targets.calories,
                now,
                now,
            ],
        )?;
        info!(name = %profile.name.trim(), "profile created");
        self.require_profile()
    }

    pub fn get_profile(&self) -> Result<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT id, name, age, sex, height_cm, current_weight_kg, target_weight_kg,
                        activity_level, target_protein_g, target_carbs_g, target_fats_g,
                        target_calories, created_at, updated_at
                 FROM profile WHERE id = 1",
                [],
                Self::profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    pub fn require_profile(&self) -> Result<Profile> {
        self.get_profile()?
            .context("No profile found. Run `recomp setup` first")
    }

    /// Replace the four target fields (and the activity level they were
    /// derived from) as one unit.
    pub fn update_profile_targets(
        &self,
        targets: &Macros,
        activity_level: ActivityLevel,
    ) -> Result<Profile> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Local::now().to_rfc3339();
        let rows = tx.execute(
            "UPDATE profile
             SET target_protein_g = ?1, target_carbs_g = ?2, target_fats_g = ?3,
                 target_calories = ?4, activity_level = ?5, updated_at = ?6
             WHERE id = 1",
            params![
                targets.protein_g,
                targets.carbs_g,
                targets.fats_g,
                targets.calories,
                activity_level.as_str(),
                now,
            ],
        )?;
        if rows == 0 {
            bail!("No profile found. Run `recomp setup` first");
        }
        tx.commit()?;
        info!(calories = targets.calories, "profile targets updated");
        self.require_profile()
    }

    pub fn update_target_weight(&self, target_weight_kg: f64) -> Result<Profile> {
        crate::error::require_positive("target_weight", target_weight_kg)?;
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE profile SET target_weight_kg = ?1, updated_at = ?2 WHERE id = 1",
            params![target_weight_kg, now],
        )?;
        if rows == 0 {
            bail!("No profile found. Run `recomp setup` first");
        }
        self.require_profile()
    }

    // --- Workouts ---

    pub fn save_workout(&self, profile_id: i64, workout: &NewWorkout) -> Result<WorkoutSession> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Local::now().to_rfc3339();
        tx.execute(
            "INSERT INTO workouts (profile_id, date, category, duration_minutes, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                profile_id,
                workout.date.format(DATE_FORMAT).to_string(),
                workout.category.as_str(),
                workout.duration_minutes,
                workout.notes,
                now,
            ],
        )?;
        let workout_id = tx.last_insert_rowid();

        for (position, ex) in workout.exercises.iter().enumerate() {
            tx.execute(
                "INSERT INTO exercises (workout_id, position, name, source_id, body_part,
                                        target_muscle, equipment, sets, reps, weight_kg)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    workout_id,
                    i64::try_from(position)?,
                    ex.name.trim(),
                    ex.source_id,
                    ex.body_part,
                    ex.target_muscle,
                    ex.equipment,
                    ex.sets,
                    ex.reps,
                    ex.weight_kg,
                ],
            )?;
        }
        tx.commit()?;
        debug!(
            workout_id,
            exercises = workout.exercises.len(),
            "workout saved"
        );
        self.get_workout(workout_id)
    }

    pub fn get_workout(&self, id: i64) -> Result<WorkoutSession> {
        let mut workout = self
            .conn
            .query_row(
                "SELECT id, profile_id, date, category, duration_minutes, notes, created_at
                 FROM workouts WHERE id = ?1",
                params![id],
                Self::workout_from_row,
            )
            .context("Workout not found")?;
        workout.exercises = self.get_exercises(id)?;
        Ok(workout)
    }

    fn get_exercises(&self, workout_id: i64) -> Result<Vec<ExerciseEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, workout_id, name, source_id, body_part, target_muscle, equipment,
                    sets, reps, weight_kg
             FROM exercises WHERE workout_id = ?1 ORDER BY position",
        )?;
        let exercises = stmt
            .query_map(params![workout_id], Self::exercise_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exercises)
    }

    /// Most recent sessions first; `None` returns all of them.
    pub fn list_workouts(&self, limit: Option<u32>) -> Result<Vec<WorkoutSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, date, category, duration_minutes, notes, created_at
             FROM workouts ORDER BY date DESC, id DESC LIMIT ?1",
        )?;
        let mut workouts = stmt
            .query_map(params![limit.map_or(-1, i64::from)], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for w in &mut workouts {
            w.exercises = self.get_exercises(w.id)?;
        }
        Ok(workouts)
    }

    pub fn delete_workout(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Progress ---

    /// Insert a measurement and mirror the latest weight onto the profile.
    pub fn log_progress(&self, profile_id: i64, entry: &NewProgressEntry) -> Result<ProgressEntry> {
        entry.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let now = Local::now().to_rfc3339();
        tx.execute(
            "INSERT INTO progress_entries (profile_id, date, weight_kg, body_fat_pct, waist_cm,
                                           chest_cm, arms_cm, thighs_cm, photo_path, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                profile_id,
                entry.date.format(DATE_FORMAT).to_string(),
                entry.weight_kg,
                entry.body_fat_pct,
                entry.waist_cm,
                entry.chest_cm,
                entry.arms_cm,
                entry.thighs_cm,
                entry.photo_path,
                entry.notes,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        Self::mirror_latest_weight(&tx, profile_id)?;
        tx.commit()?;
        self.get_progress_entry(id)
    }

    fn mirror_latest_weight(conn: &Connection, profile_id: i64) -> Result<()> {
        let latest: Option<f64> = conn
            .query_row(
                "SELECT weight_kg FROM progress_entries WHERE profile_id = ?1
                 ORDER BY date DESC, id DESC LIMIT 1",
                params![profile_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(weight_kg) = latest {
            conn.execute(
                "UPDATE profile SET current_weight_kg = ?1, updated_at = ?2 WHERE id = ?3",
                params![weight_kg, Local::now().to_rfc3339(), profile_id],
            )?;
        }
        Ok(())
    }

    pub fn get_progress_entry(&self, id: i64) -> Result<ProgressEntry> {
        self.conn
            .query_row(
                "SELECT id, profile_id, date, weight_kg, body_fat_pct, waist_cm, chest_cm,
                        arms_cm, thighs_cm, photo_path, notes, created_at
                 FROM progress_entries WHERE id = ?1",
                params![id],
                Self::progress_from_row,
            )
            .context("Progress entry not found")
    }

    /// Entries ordered most recent first.
    pub fn get_progress_entries(&self, limit: Option<i64>) -> Result<Vec<ProgressEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, date, weight_kg, body_fat_pct, waist_cm, chest_cm,
                    arms_cm, thighs_cm, photo_path, notes, created_at
             FROM progress_entries ORDER BY date DESC, id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit.unwrap_or(-1)], Self::progress_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn delete_progress_entry(&self, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let profile_id: Option<i64> = tx
            .query_row(
                "SELECT profile_id FROM progress_entries WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(profile_id) = profile_id else {
            return Ok(false);
        };
        tx.execute("DELETE FROM progress_entries WHERE id = ?1", params![id])?;
        Self::mirror_latest_weight(&tx, profile_id)?;
        tx.commit()?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{NewExercise, Sex, WorkoutBuilder, WorkoutCategory};

    pub(crate) fn sample_profile() -> NewProfile {
        NewProfile {
            name: "Sam".to_string(),
            age: 21,
            sex: Sex::Female,
            height_cm: 165.0,
            current_weight_kg: 60.0,
            target_weight_kg: 55.0,
            activity_level: ActivityLevel::Moderate,
            targets: Macros {
                protein_g: 120.0,
                carbs_g: 150.0,
                fats_g: 50.0,
                calories: 1800.0,
            },
        }
    }

    pub(crate) fn db_with_profile() -> (Database, Profile) {
        let db = Database::open_in_memory().unwrap();
        let profile = db.create_profile(&sample_profile()).unwrap();
        (db, profile)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_create_and_get_profile() {
        let (db, profile) = db_with_profile();
        assert_eq!(profile.id, 1);
        assert_eq!(profile.name, "Sam");
        assert_eq!(profile.sex, Sex::Female);
        assert_eq!(profile.activity_level, ActivityLevel::Moderate);
        assert!((profile.targets.calories - 1800.0).abs() < f64::EPSILON);

        let fetched = db.get_profile().unwrap().unwrap();
        assert_eq!(fetched.name, profile.name);
    }

    #[test]
    fn test_only_one_profile() {
        let (db, _) = db_with_profile();
        assert!(db.create_profile(&sample_profile()).is_err());
    }

    #[test]
    fn test_profile_validation() {
        let db = Database::open_in_memory().unwrap();
        let mut p = sample_profile();
        p.target_weight_kg = 0.0;
        assert!(db.create_profile(&p).is_err());
        assert!(db.get_profile().unwrap().is_none());
    }

    #[test]
    fn test_update_profile_targets() {
        let (db, _) = db_with_profile();
        let targets = Macros {
            protein_g: 121.3,
            carbs_g: 216.2,
            fats_g: 50.0,
            calories: 1800.0,
        };
        let updated = db
            .update_profile_targets(&targets, ActivityLevel::Light)
            .unwrap();
        assert_eq!(updated.targets, targets);
        assert_eq!(updated.activity_level, ActivityLevel::Light);
    }

    #[test]
    fn test_update_targets_without_profile() {
        let db = Database::open_in_memory().unwrap();
        assert!(
            db.update_profile_targets(&Macros::default(), ActivityLevel::Light)
                .is_err()
        );
    }

    #[test]
    fn test_save_and_get_workout() {
        let (db, profile) = db_with_profile();
        let mut builder =
            WorkoutBuilder::new(date(15), WorkoutCategory::Strength).duration_minutes(Some(50));
        builder
            .add_exercise(NewExercise {
                name: "Squat".to_string(),
                body_part: Some("upper legs".to_string()),
                sets: Some(3),
                reps: Some(8),
                weight_kg: 40.0,
                ..NewExercise::default()
            })
            .add_exercise(NewExercise {
                name: "Hip Thrust".to_string(),
                sets: Some(4),
                reps: Some(10),
                weight_kg: 60.0,
                ..NewExercise::default()
            });
        let saved = db.save_workout(profile.id, &builder.build().unwrap()).unwrap();

        assert_eq!(saved.category, WorkoutCategory::Strength);
        assert_eq!(saved.duration_minutes, Some(50));
        assert_eq!(saved.exercises.len(), 2);
        assert_eq!(saved.exercises[0].name, "Squat");
        assert_eq!(saved.exercises[1].name, "Hip Thrust");
        assert_eq!(saved.exercises[1].reps, Some(10));
    }

    #[test]
    fn test_delete_workout_cascades() {
        let (db, profile) = db_with_profile();
        let mut builder = WorkoutBuilder::new(date(15), WorkoutCategory::Yoga);
        builder.add_exercise(NewExercise {
            name: "Sun Salutation".to_string(),
            ..NewExercise::default()
        });
        let saved = db.save_workout(profile.id, &builder.build().unwrap()).unwrap();
        assert_eq!(count(&db, "exercises"), 1);

        assert!(db.delete_workout(saved.id).unwrap());
        assert_eq!(count(&db, "exercises"), 0);
        assert!(db.get_workout(saved.id).is_err());
        assert!(!db.delete_workout(saved.id).unwrap());
    }

    #[test]
    fn test_save_workout_rolls_back_on_failure() {
        let db = Database::open_in_memory().unwrap();
        let mut builder = WorkoutBuilder::new(date(15), WorkoutCategory::Cardio);
        builder.add_exercise(NewExercise {
            name: "Run".to_string(),
            ..NewExercise::default()
        });
        // No profile row: the foreign key rejects the insert.
        assert!(db.save_workout(1, &builder.build().unwrap()).is_err());
        assert_eq!(count(&db, "workouts"), 0);
        assert_eq!(count(&db, "exercises"), 0);
    }

    #[test]
    fn test_list_workouts_most_recent_first() {
        let (db, profile) = db_with_profile();
        for d in [10, 14, 12] {
            let mut builder = WorkoutBuilder::new(date(d), WorkoutCategory::Hiit);
            builder.add_exercise(NewExercise {
                name: "Burpees".to_string(),
                ..NewExercise::default()
            });
            db.save_workout(profile.id, &builder.build().unwrap()).unwrap();
        }
        let all = db.list_workouts(None).unwrap();
        let dates: Vec<u32> = all.iter().map(|w| chrono::Datelike::day(&w.date)).collect();
        assert_eq!(dates, vec![14, 12, 10]);
        assert_eq!(db.list_workouts(Some(2)).unwrap().len(), 2);
        assert!(db.list_workouts(Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_log_progress_mirrors_weight() {
        let (db, profile) = db_with_profile();
        let entry = db
            .log_progress(
                profile.id,
                &NewProgressEntry {
                    date: date(15),
                    weight_kg: 59.2,
                    body_fat_pct: Some(25.0),
                    waist_cm: Some(71.0),
                    ..NewProgressEntry::default()
                },
            )
            .unwrap();
        assert!((entry.weight_kg - 59.2).abs() < f64::EPSILON);
        assert_eq!(entry.waist_cm, Some(71.0));

        let profile = db.require_profile().unwrap();
        assert!((profile.current_weight_kg - 59.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_backdated_progress_does_not_override_latest() {
        let (db, profile) = db_with_profile();
        let new = |d, w| NewProgressEntry {
            date: date(d),
            weight_kg: w,
            ..NewProgressEntry::default()
        };
        db.log_progress(profile.id, &new(15, 58.0)).unwrap();
        db.log_progress(profile.id, &new(10, 59.0)).unwrap();

        let profile = db.require_profile().unwrap();
        assert!((profile.current_weight_kg - 58.0).abs() < f64::EPSILON);

        let entries = db.get_progress_entries(None).unwrap();
        assert_eq!(entries[0].date, date(15));
        assert_eq!(entries[1].date, date(10));
    }

    #[test]
    fn test_delete_progress_remirrors_weight() {
        let (db, profile) = db_with_profile();
        let first = db
            .log_progress(
                profile.id,
                &NewProgressEntry {
                    date: date(10),
                    weight_kg: 59.0,
                    ..NewProgressEntry::default()
                },
            )
            .unwrap();
        let second = db
            .log_progress(
                profile.id,
                &NewProgressEntry {
                    date: date(15),
                    weight_kg: 58.0,
                    ..NewProgressEntry::default()
                },
            )
            .unwrap();

        assert!(db.delete_progress_entry(second.id).unwrap());
        let profile = db.require_profile().unwrap();
        assert!((profile.current_weight_kg - 59.0).abs() < f64::EPSILON);

        assert!(db.delete_progress_entry(first.id).unwrap());
        // Nothing left to mirror: the last known weight stays.
        let profile = db.require_profile().unwrap();
        assert!((profile.current_weight_kg - 59.0).abs() < f64::EPSILON);
        assert!(!db.delete_progress_entry(first.id).unwrap());
    }

    #[test]
    fn test_invalid_progress_is_not_stored() {
        let (db, profile) = db_with_profile();
        let result = db.log_progress(
            profile.id,
            &NewProgressEntry {
                date: date(15),
                weight_kg: -1.0,
                ..NewProgressEntry::default()
            },
        );
        assert!(result.is_err());
        assert!(db.get_progress_entries(None).unwrap().is_empty());
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recomp.db");
        {
            let db = Database::open(&path).unwrap();
            db.create_profile(&sample_profile()).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.require_profile().unwrap().name, "Sam");
    }
}
