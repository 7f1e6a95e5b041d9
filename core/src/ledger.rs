use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use tracing::debug;

use crate::db::{DATE_FORMAT, Database};
use crate::error::{EngineError, require_finite};
use crate::models::{
    DailySummary, MEAL_SLOTS, Macros, MealEntry, MealGroup, MealSlot, NewMealEntry, NutritionLog,
    Profile,
};

/// Fixed-point units per gram (or per kcal).
pub const FIXED_SCALE: f64 = 1000.0;

/// Largest value a single entry may carry in any field (grams or kcal).
pub const MAX_ENTRY_VALUE: f64 = 1e9;

/// Macro values in thousandths, as the ledger stores them.
///
/// Totals and entries are kept as integers so every increment and decrement
/// is exact; the running totals of a log always compare `==` to the sum of
/// its entries. Arithmetic is checked and reports overflow as
/// [`EngineError::Consistency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FixedMacros {
    pub protein: i64,
    pub carbs: i64,
    pub fats: i64,
    pub calories: i64,
}

impl FixedMacros {
    /// Quantize to thousandths. Rejects negative, non-finite and
    /// out-of-range values.
    pub fn from_macros(m: &Macros) -> Result<Self, EngineError> {
        fn quantize(field: &'static str, value: f64) -> Result<i64, EngineError> {
            let value = require_finite(field, value)?;
            if value < 0.0 {
                return Err(EngineError::invalid(
                    field,
                    format!("must not be negative (got {value})"),
                ));
            }
            if value > MAX_ENTRY_VALUE {
                return Err(EngineError::invalid(
                    field,
                    format!("must be at most {MAX_ENTRY_VALUE} (got {value})"),
                ));
            }
            Ok((value * FIXED_SCALE).round() as i64)
        }

        Ok(Self {
            protein: quantize("protein_g", m.protein_g)?,
            carbs: quantize("carbs_g", m.carbs_g)?,
            fats: quantize("fats_g", m.fats_g)?,
            calories: quantize("calories", m.calories)?,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn to_macros(self) -> Macros {
        Macros {
            protein_g: self.protein as f64 / FIXED_SCALE,
            carbs_g: self.carbs as f64 / FIXED_SCALE,
            fats_g: self.fats as f64 / FIXED_SCALE,
            calories: self.calories as f64 / FIXED_SCALE,
        }
    }

    fn combine(
        self,
        rhs: Self,
        op: fn(i64, i64) -> Option<i64>,
        what: &str,
    ) -> Result<Self, EngineError> {
        let overflow = || EngineError::Consistency(format!("macro total overflow on {what}"));
        Ok(Self {
            protein: op(self.protein, rhs.protein).ok_or_else(overflow)?,
            carbs: op(self.carbs, rhs.carbs).ok_or_else(overflow)?,
            fats: op(self.fats, rhs.fats).ok_or_else(overflow)?,
            calories: op(self.calories, rhs.calories).ok_or_else(overflow)?,
        })
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, EngineError> {
        self.combine(rhs, i64::checked_add, "add")
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, EngineError> {
        self.combine(rhs, i64::checked_sub, "subtract")
    }

    /// Checked sum of `items`, starting from zero.
    pub fn checked_sum(items: impl IntoIterator<Item = Self>) -> Result<Self, EngineError> {
        items
            .into_iter()
            .try_fold(Self::default(), FixedMacros::checked_add)
    }
}

fn fixed_from_row(row: &rusqlite::Row, start: usize) -> rusqlite::Result<FixedMacros> {
    Ok(FixedMacros {
        protein: row.get(start)?,
        carbs: row.get(start + 1)?,
        fats: row.get(start + 2)?,
        calories: row.get(start + 3)?,
    })
}

impl Database {
    // 0: id, 1: profile_id, 2: date, 3..=6: totals, 7: notes, 8: created_at
    fn log_from_row(row: &rusqlite::Row) -> rusqlite::Result<NutritionLog> {
        Ok(NutritionLog {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            date: Self::date_column(row, 2)?,
            totals: fixed_from_row(row, 3)?.to_macros(),
            notes: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    // 0: id, 1: log_id, 2: meal_slot, 3: food_name, 4: serving, 5..=8: macros, 9: created_at
    fn meal_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealEntry> {
        Ok(MealEntry {
            id: row.get(0)?,
            log_id: row.get(1)?,
            slot: Self::parse_column(row, 2)?,
            food_name: row.get(3)?,
            serving: row.get(4)?,
            macros: fixed_from_row(row, 5)?.to_macros(),
            created_at: row.get(9)?,
        })
    }

    // --- Logs ---

    pub fn get_log(&self, profile_id: i64, date: NaiveDate) -> Result<Option<NutritionLog>> {
        let log = self
            .conn
            .query_row(
                "SELECT id, profile_id, date, total_protein, total_carbs, total_fats,
                        total_calories, notes, created_at
                 FROM nutrition_logs WHERE profile_id = ?1 AND date = ?2",
                params![profile_id, date.format(DATE_FORMAT).to_string()],
                Self::log_from_row,
            )
            .optional()?;
        Ok(log)
    }

    pub fn get_log_by_id(&self, id: i64) -> Result<NutritionLog> {
        self.conn
            .query_row(
                "SELECT id, profile_id, date, total_protein, total_carbs, total_fats,
                        total_calories, notes, created_at
                 FROM nutrition_logs WHERE id = ?1",
                params![id],
                Self::log_from_row,
            )
            .context("Nutrition log not found")
    }

    pub fn get_or_create_log(&self, profile_id: i64, date: NaiveDate) -> Result<NutritionLog> {
        if let Some(log) = self.get_log(profile_id, date)? {
            return Ok(log);
        }
        self.conn.execute(
            "INSERT INTO nutrition_logs (profile_id, date, created_at) VALUES (?1, ?2, ?3)",
            params![
                profile_id,
                date.format(DATE_FORMAT).to_string(),
                Local::now().to_rfc3339()
            ],
        )?;
        debug!(profile_id, %date, "nutrition log created");
        self.get_log_by_id(self.conn.last_insert_rowid())
    }

    pub fn set_log_notes(&self, log_id: i64, notes: Option<&str>) -> Result<NutritionLog> {
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        self.conn.execute(
            "UPDATE nutrition_logs SET notes = ?1 WHERE id = ?2",
            params![notes, log_id],
        )?;
        self.get_log_by_id(log_id)
    }

    /// Deletes the log and, through the cascade, all of its entries.
    pub fn delete_log(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM nutrition_logs WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Ledger ---

    /// Persist `meal` under `log` and raise the log's totals by exactly the
    /// stored values, in one transaction.
    pub fn add_meal(&self, log: &NutritionLog, meal: &NewMealEntry) -> Result<MealEntry, EngineError> {
        let tx = self.conn.unchecked_transaction()?;
        let entry = self.insert_meal(log.id, meal)?;
        tx.commit()?;
        Ok(entry)
    }

    /// Find or create the day's log and add one entry to it, all in one
    /// transaction. A rejected entry leaves no log row behind.
    pub fn add_meal_for_day(
        &self,
        profile_id: i64,
        date: NaiveDate,
        slot: MealSlot,
        food_name: &str,
        serving: &str,
        macros: &Macros,
    ) -> Result<MealEntry> {
        let tx = self.conn.unchecked_transaction()?;
        let log = self.get_or_create_log(profile_id, date)?;
        let entry = self.insert_meal(
            log.id,
            &NewMealEntry {
                log_id: log.id,
                slot,
                food_name: food_name.to_string(),
                serving: serving.to_string(),
                macros: *macros,
            },
        )?;
        tx.commit()?;
        Ok(entry)
    }

    // Runs inside the caller's transaction.
    fn insert_meal(&self, log_id: i64, meal: &NewMealEntry) -> Result<MealEntry, EngineError> {
        if meal.log_id != log_id {
            return Err(EngineError::Consistency(format!(
                "meal belongs to log {} but was added to log {log_id}",
                meal.log_id
            )));
        }
        if meal.food_name.trim().is_empty() {
            return Err(EngineError::invalid("food name", "must not be empty"));
        }
        let fixed = FixedMacros::from_macros(&meal.macros)?;
        self.totals(log_id)?.checked_add(fixed)?;

        self.conn.execute(
            "INSERT INTO meal_entries (log_id, meal_slot, food_name, serving, protein, carbs,
                                       fats, calories, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                log_id,
                meal.slot.as_str(),
                meal.food_name.trim(),
                meal.serving,
                fixed.protein,
                fixed.carbs,
                fixed.fats,
                fixed.calories,
                Local::now().to_rfc3339(),
            ],
        )?;
        let entry_id = self.conn.last_insert_rowid();
        self.conn.execute(
            "UPDATE nutrition_logs
             SET total_protein = total_protein + ?1, total_carbs = total_carbs + ?2,
                 total_fats = total_fats + ?3, total_calories = total_calories + ?4
             WHERE id = ?5",
            params![fixed.protein, fixed.carbs, fixed.fats, fixed.calories, log_id],
        )?;
        let entry = self.conn.query_row(
            "SELECT id, log_id, meal_slot, food_name, serving, protein, carbs, fats, calories,
                    created_at
             FROM meal_entries WHERE id = ?1",
            params![entry_id],
            Self::meal_entry_from_row,
        )?;
        debug!(log_id, entry_id, calories = fixed.calories, "meal added");
        Ok(entry)
    }

    /// Delete `meal` and lower the totals by the values stored for it.
    pub fn remove_meal(&self, log: &NutritionLog, meal: &MealEntry) -> Result<(), EngineError> {
        if meal.log_id != log.id {
            return Err(EngineError::Consistency(format!(
                "meal {} belongs to log {}, not log {}",
                meal.id, meal.log_id, log.id
            )));
        }

        let tx = self.conn.unchecked_transaction()?;
        let stored = tx
            .query_row(
                "SELECT log_id, protein, carbs, fats, calories FROM meal_entries WHERE id = ?1",
                params![meal.id],
                |row| Ok((row.get::<_, i64>(0)?, fixed_from_row(row, 1)?)),
            )
            .optional()?;
        let Some((stored_log_id, fixed)) = stored else {
            return Err(EngineError::Consistency(format!(
                "meal {} no longer exists",
                meal.id
            )));
        };
        if stored_log_id != log.id {
            return Err(EngineError::Consistency(format!(
                "stored meal {} belongs to log {stored_log_id}, not log {}",
                meal.id, log.id
            )));
        }
        self.totals(log.id)?.checked_sub(fixed)?;

        tx.execute(
            "UPDATE nutrition_logs
             SET total_protein = total_protein - ?1, total_carbs = total_carbs - ?2,
                 total_fats = total_fats - ?3, total_calories = total_calories - ?4
             WHERE id = ?5",
            params![fixed.protein, fixed.carbs, fixed.fats, fixed.calories, log.id],
        )?;
        tx.execute("DELETE FROM meal_entries WHERE id = ?1", params![meal.id])?;
        tx.commit()?;
        debug!(log_id = log.id, entry_id = meal.id, "meal removed");
        Ok(())
    }

    /// The log's running totals as stored.
    pub fn totals(&self, log_id: i64) -> Result<FixedMacros, EngineError> {
        self.conn
            .query_row(
                "SELECT total_protein, total_carbs, total_fats, total_calories
                 FROM nutrition_logs WHERE id = ?1",
                params![log_id],
                |row| fixed_from_row(row, 0),
            )
            .optional()?
            .ok_or_else(|| EngineError::Consistency(format!("nutrition log {log_id} does not exist")))
    }

    /// Sum of the log's entries, computed independently of the running totals.
    pub fn entries_sum(&self, log_id: i64) -> Result<FixedMacros, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT protein, carbs, fats, calories FROM meal_entries WHERE log_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![log_id], |row| fixed_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        FixedMacros::checked_sum(rows)
    }

    pub fn get_meal_entries(&self, log_id: i64) -> Result<Vec<MealEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, log_id, meal_slot, food_name, serving, protein, carbs, fats, calories,
                    created_at
             FROM meal_entries WHERE log_id = ?1 ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![log_id], Self::meal_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn get_meal_entry(&self, id: i64) -> Result<MealEntry> {
        self.conn
            .query_row(
                "SELECT id, log_id, meal_slot, food_name, serving, protein, carbs, fats, calories,
                        created_at
                 FROM meal_entries WHERE id = ?1",
                params![id],
                Self::meal_entry_from_row,
            )
            .context("Meal entry not found")
    }

    /// Entries grouped by slot with the day's totals against the profile's
    /// targets. A day with nothing logged has no log row and reads as zeros.
    pub fn daily_summary(&self, profile: &Profile, date: NaiveDate) -> Result<DailySummary> {
        let log = self.get_log(profile.id, date)?;
        let entries = match &log {
            Some(log) => self.get_meal_entries(log.id)?,
            None => Vec::new(),
        };

        let meals = MEAL_SLOTS
            .iter()
            .filter_map(|&slot| {
                let group: Vec<MealEntry> =
                    entries.iter().filter(|e| e.slot == slot).cloned().collect();
                if group.is_empty() {
                    return None;
                }
                let subtotal = group.iter().fold(Macros::default(), |acc, e| acc + e.macros);
                Some(MealGroup {
                    slot,
                    entries: group,
                    subtotal,
                })
            })
            .collect();

        let totals = log.as_ref().map(|l| l.totals).unwrap_or_default();
        Ok(DailySummary {
            date,
            log_id: log.as_ref().map(|l| l.id),
            meals,
            totals,
            targets: profile.targets,
            remaining: profile.targets - totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::db_with_profile;
    use crate::models::MealSlot;
    use proptest::prelude::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn new_meal(log: &NutritionLog, slot: MealSlot, name: &str, m: Macros) -> NewMealEntry {
        NewMealEntry {
            log_id: log.id,
            slot,
            food_name: name.to_string(),
            serving: "100 g".to_string(),
            macros: m,
        }
    }

    fn macros(p: f64, c: f64, f: f64, kcal: f64) -> Macros {
        Macros {
            protein_g: p,
            carbs_g: c,
            fats_g: f,
            calories: kcal,
        }
    }

    fn assert_balanced(db: &Database, log_id: i64) {
        assert_eq!(db.totals(log_id).unwrap(), db.entries_sum(log_id).unwrap());
    }

    #[test]
    fn test_fixed_quantization() {
        let f = FixedMacros::from_macros(&macros(0.1, 0.2, 0.3, 33.3333)).unwrap();
        assert_eq!(f.protein, 100);
        assert_eq!(f.carbs, 200);
        assert_eq!(f.fats, 300);
        assert_eq!(f.calories, 33_333);
        assert!((f.to_macros().protein_g - 0.1).abs() < 1e-12);
        assert!(FixedMacros::from_macros(&macros(-1.0, 0.0, 0.0, 0.0)).is_err());
        assert!(FixedMacros::from_macros(&macros(f64::NAN, 0.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_get_or_create_log_is_unique_per_day() {
        let (db, profile) = db_with_profile();
        let a = db.get_or_create_log(profile.id, date()).unwrap();
        let b = db.get_or_create_log(profile.id, date()).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.totals, Macros::default());
    }

    #[test]
    fn test_add_meal_updates_totals() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        let entry = db
            .add_meal(
                &log,
                &new_meal(&log, MealSlot::Lunch, "Chicken", macros(46.5, 0.0, 5.4, 247.5)),
            )
            .unwrap();
        assert_eq!(entry.slot, MealSlot::Lunch);
        assert!((entry.macros.calories - 247.5).abs() < 1e-12);

        let totals = db.totals(log.id).unwrap();
        assert_eq!(totals.calories, 247_500);
        assert_balanced(&db, log.id);

        let reread = db.get_log_by_id(log.id).unwrap();
        assert!((reread.totals.protein_g - 46.5).abs() < 1e-12);
    }

    #[test]
    fn test_interleaved_add_remove_keeps_totals_exact() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();

        let values = [
            macros(0.1, 0.2, 0.3, 1.1),
            macros(10.0 / 3.0, 2.0 / 3.0, 1.0 / 7.0, 123.456_789),
            macros(0.7, 0.1, 0.2, 3.3),
            macros(31.0 * 1.37, 0.0, 3.6 * 1.37, 165.0 * 1.37),
        ];
        let mut entries = Vec::new();
        for (i, m) in values.iter().enumerate() {
            let e = db
                .add_meal(&log, &new_meal(&log, MealSlot::Snack, &format!("food {i}"), *m))
                .unwrap();
            entries.push(e);
            assert_balanced(&db, log.id);
        }

        // Remove non-final entries first.
        db.remove_meal(&log, &entries[1]).unwrap();
        assert_balanced(&db, log.id);
        db.remove_meal(&log, &entries[0]).unwrap();
        assert_balanced(&db, log.id);

        let e = db
            .add_meal(&log, &new_meal(&log, MealSlot::Dinner, "rice", macros(0.3, 28.0, 0.3, 130.0)))
            .unwrap();
        assert_balanced(&db, log.id);

        db.remove_meal(&log, &entries[3]).unwrap();
        db.remove_meal(&log, &e).unwrap();
        db.remove_meal(&log, &entries[2]).unwrap();
        assert_balanced(&db, log.id);
        assert_eq!(db.totals(log.id).unwrap(), FixedMacros::default());
    }

    #[test]
    fn test_add_to_wrong_log_is_refused() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        let other = db
            .get_or_create_log(profile.id, date().succ_opt().unwrap())
            .unwrap();

        let meal = new_meal(&other, MealSlot::Lunch, "Apple", macros(0.3, 14.0, 0.2, 52.0));
        assert!(matches!(
            db.add_meal(&log, &meal),
            Err(EngineError::Consistency(_))
        ));
        assert!(db.get_meal_entries(log.id).unwrap().is_empty());
        assert_eq!(db.totals(log.id).unwrap(), FixedMacros::default());
    }

    #[test]
    fn test_remove_from_wrong_log_is_refused() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        let other = db
            .get_or_create_log(profile.id, date().succ_opt().unwrap())
            .unwrap();
        let entry = db
            .add_meal(&log, &new_meal(&log, MealSlot::Lunch, "Apple", macros(0.3, 14.0, 0.2, 52.0)))
            .unwrap();

        assert!(matches!(
            db.remove_meal(&other, &entry),
            Err(EngineError::Consistency(_))
        ));

        // A forged entry claiming the other log is caught by the stored parent.
        let mut forged = entry.clone();
        forged.log_id = other.id;
        assert!(matches!(
            db.remove_meal(&other, &forged),
            Err(EngineError::Consistency(_))
        ));

        assert_eq!(db.get_meal_entries(log.id).unwrap().len(), 1);
        assert_eq!(db.totals(log.id).unwrap().calories, 52_000);
        assert_eq!(db.totals(other.id).unwrap(), FixedMacros::default());
    }

    #[test]
    fn test_remove_twice_is_refused() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        let entry = db
            .add_meal(&log, &new_meal(&log, MealSlot::Breakfast, "Oats", macros(5.0, 27.0, 2.5, 150.0)))
            .unwrap();
        db.remove_meal(&log, &entry).unwrap();
        assert!(matches!(
            db.remove_meal(&log, &entry),
            Err(EngineError::Consistency(_))
        ));
        assert_eq!(db.totals(log.id).unwrap(), FixedMacros::default());
    }

    #[test]
    fn test_failed_insert_leaves_nothing_behind() {
        let (db, _) = db_with_profile();
        let ghost = NutritionLog {
            id: 999,
            profile_id: 1,
            date: date(),
            totals: Macros::default(),
            notes: None,
            created_at: String::new(),
        };
        let meal = new_meal(&ghost, MealSlot::Lunch, "Apple", macros(0.3, 14.0, 0.2, 52.0));
        assert!(matches!(db.add_meal(&ghost, &meal), Err(EngineError::Consistency(_))));
        assert!(db.get_meal_entries(999).unwrap().is_empty());
        assert!(db.totals(999).is_err());
    }

    #[test]
    fn test_invalid_meal_values_rejected() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        let meal = new_meal(&log, MealSlot::Lunch, "Bad", macros(-1.0, 0.0, 0.0, 10.0));
        assert!(matches!(
            db.add_meal(&log, &meal),
            Err(EngineError::InvalidInput { field: "protein_g", .. })
        ));
        let meal = new_meal(&log, MealSlot::Lunch, "  ", macros(1.0, 0.0, 0.0, 10.0));
        assert!(db.add_meal(&log, &meal).is_err());
        assert!(db.get_meal_entries(log.id).unwrap().is_empty());
    }

    #[test]
    fn test_value_above_ceiling_rejected() {
        assert!(FixedMacros::from_macros(&macros(0.0, 0.0, 0.0, MAX_ENTRY_VALUE)).is_ok());
        assert!(matches!(
            FixedMacros::from_macros(&macros(0.0, 0.0, 0.0, 5e15)),
            Err(EngineError::InvalidInput { field: "calories", .. })
        ));
        assert!(matches!(
            FixedMacros::from_macros(&macros(f64::MAX, 0.0, 0.0, 0.0)),
            Err(EngineError::InvalidInput { field: "protein_g", .. })
        ));
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let big = FixedMacros {
            calories: i64::MAX - 1,
            ..FixedMacros::default()
        };
        let one = FixedMacros {
            calories: 2,
            ..FixedMacros::default()
        };
        assert!(matches!(big.checked_add(one), Err(EngineError::Consistency(_))));
        assert!(matches!(
            FixedMacros::checked_sum([big, one]),
            Err(EngineError::Consistency(_))
        ));
        let low = FixedMacros {
            protein: i64::MIN + 1,
            ..FixedMacros::default()
        };
        assert!(low.checked_sub(one).is_ok());
        assert!(matches!(
            low.checked_sub(FixedMacros { protein: 2, ..FixedMacros::default() }),
            Err(EngineError::Consistency(_))
        ));
    }

    #[test]
    fn test_huge_entries_refused_and_log_unchanged() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        db.add_meal(&log, &new_meal(&log, MealSlot::Lunch, "Apple", macros(0.3, 14.0, 0.2, 52.0)))
            .unwrap();
        for _ in 0..2 {
            let meal = new_meal(&log, MealSlot::Dinner, "Feast", macros(0.0, 0.0, 0.0, 5e15));
            assert!(matches!(
                db.add_meal(&log, &meal),
                Err(EngineError::InvalidInput { field: "calories", .. })
            ));
        }
        assert_eq!(db.get_meal_entries(log.id).unwrap().len(), 1);
        assert_eq!(db.totals(log.id).unwrap().calories, 52_000);
        assert_balanced(&db, log.id);
    }

    #[test]
    fn test_large_entries_at_ceiling_stay_balanced() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        let m = macros(MAX_ENTRY_VALUE, 0.5, 0.0, MAX_ENTRY_VALUE);
        let a = db.add_meal(&log, &new_meal(&log, MealSlot::Lunch, "Bulk", m)).unwrap();
        db.add_meal(&log, &new_meal(&log, MealSlot::Dinner, "Bulk", m)).unwrap();
        assert_balanced(&db, log.id);
        let totals = db.get_log_by_id(log.id).unwrap().totals;
        assert!((totals.calories - 2.0 * MAX_ENTRY_VALUE).abs() < 1e-3);
        db.remove_meal(&log, &a).unwrap();
        assert_balanced(&db, log.id);
        assert!((db.get_log_by_id(log.id).unwrap().totals.carbs_g - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_add_meal_for_day_creates_log_with_entry() {
        let (db, profile) = db_with_profile();
        let entry = db
            .add_meal_for_day(
                profile.id,
                date(),
                MealSlot::Snack,
                "Almonds",
                "28 g",
                &macros(6.0, 6.1, 14.0, 164.0),
            )
            .unwrap();
        let log = db.get_log(profile.id, date()).unwrap().unwrap();
        assert_eq!(entry.log_id, log.id);
        assert_eq!(entry.serving, "28 g");
        assert!((log.totals.calories - 164.0).abs() < 1e-9);
        assert_balanced(&db, log.id);
    }

    #[test]
    fn test_rejected_add_meal_for_day_leaves_no_log() {
        let (db, profile) = db_with_profile();
        let err = db
            .add_meal_for_day(
                profile.id,
                date(),
                MealSlot::Lunch,
                "Bad",
                "1 serving",
                &macros(-5.0, 0.0, 0.0, 100.0),
            )
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InvalidInput { field: "protein_g", .. })
        ));
        assert!(db.get_log(profile.id, date()).unwrap().is_none());

        assert!(db
            .add_meal_for_day(profile.id, date(), MealSlot::Lunch, " ", "1", &Macros::default())
            .is_err());
        assert!(db.get_log(profile.id, date()).unwrap().is_none());
    }

    #[test]
    fn test_rejected_add_meal_for_day_keeps_existing_log() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        db.add_meal(&log, &new_meal(&log, MealSlot::Lunch, "Apple", macros(0.3, 14.0, 0.2, 52.0)))
            .unwrap();
        assert!(db
            .add_meal_for_day(profile.id, date(), MealSlot::Lunch, "Bad", "1", &macros(0.0, 0.0, 0.0, 5e15))
            .is_err());
        let kept = db.get_log(profile.id, date()).unwrap().unwrap();
        assert_eq!(kept.id, log.id);
        assert_eq!(db.get_meal_entries(log.id).unwrap().len(), 1);
        assert_balanced(&db, log.id);
    }

    #[test]
    fn test_delete_log_cascades() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        db.add_meal(&log, &new_meal(&log, MealSlot::Lunch, "Apple", macros(0.3, 14.0, 0.2, 52.0)))
            .unwrap();
        assert!(db.delete_log(log.id).unwrap());
        assert!(db.get_meal_entries(log.id).unwrap().is_empty());
        assert!(db.get_log(profile.id, date()).unwrap().is_none());
    }

    #[test]
    fn test_log_notes() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        let log = db.set_log_notes(log.id, Some("  refeed day ")).unwrap();
        assert_eq!(log.notes.as_deref(), Some("refeed day"));
        let log = db.set_log_notes(log.id, Some("")).unwrap();
        assert!(log.notes.is_none());
    }

    #[test]
    fn test_daily_summary_groups_by_slot() {
        let (db, profile) = db_with_profile();
        let log = db.get_or_create_log(profile.id, date()).unwrap();
        db.add_meal(&log, &new_meal(&log, MealSlot::Dinner, "Salmon", macros(25.0, 0.0, 13.0, 208.0)))
            .unwrap();
        db.add_meal(&log, &new_meal(&log, MealSlot::Breakfast, "Eggs", macros(13.0, 1.1, 11.0, 155.0)))
            .unwrap();
        db.add_meal(&log, &new_meal(&log, MealSlot::Dinner, "Rice", macros(2.7, 28.0, 0.3, 130.0)))
            .unwrap();

        let summary = db.daily_summary(&profile, date()).unwrap();
        assert_eq!(summary.log_id, Some(log.id));
        assert_eq!(summary.meals.len(), 2);
        assert_eq!(summary.meals[0].slot, MealSlot::Breakfast);
        assert_eq!(summary.meals[1].slot, MealSlot::Dinner);
        assert_eq!(summary.meals[1].entries.len(), 2);
        assert!((summary.meals[1].subtotal.calories - 338.0).abs() < 1e-9);
        assert!((summary.totals.calories - 493.0).abs() < 1e-9);
        assert!((summary.remaining.calories - (1800.0 - 493.0)).abs() < 1e-9);
    }

    #[test]
    fn test_daily_summary_without_log() {
        let (db, profile) = db_with_profile();
        let summary = db.daily_summary(&profile, date()).unwrap();
        assert!(summary.log_id.is_none());
        assert!(summary.meals.is_empty());
        assert_eq!(summary.remaining, profile.targets);
        assert!(db.get_log(profile.id, date()).unwrap().is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_totals_match_entries_after_every_step(
            ops in proptest::collection::vec(
                (0.0f64..200.0, 0.0f64..200.0, 0.0f64..100.0, 0.0f64..2000.0, any::<bool>(), 0usize..8),
                1..25,
            )
        ) {
            let (db, profile) = db_with_profile();
            let log = db.get_or_create_log(profile.id, date()).unwrap();
            let mut live: Vec<MealEntry> = Vec::new();

            for (p, c, f, kcal, remove, pick) in ops {
                if remove && !live.is_empty() {
                    let entry = live.remove(pick % live.len());
                    db.remove_meal(&log, &entry).unwrap();
                } else {
                    let meal = new_meal(&log, MealSlot::Snack, "item", macros(p, c, f, kcal));
                    live.push(db.add_meal(&log, &meal).unwrap());
                }
                prop_assert_eq!(db.totals(log.id).unwrap(), db.entries_sum(log.id).unwrap());
            }
        }
    }
}
