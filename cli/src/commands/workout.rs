use anyhow::{Context, Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use recomp_core::error::EngineError;
use recomp_core::models::{
    ExerciseSearchMode, NewExercise, WorkoutBuilder, WorkoutCategory, WorkoutSession,
};
use recomp_core::service::{ExerciseLookupProvider, RecompService};
use recomp_core::units::{WeightUnit, lb_from_kg};

use super::helpers::{exit_no_results, parse_date, print_exercise_table, truncate};

/// Parse `NAME[:SETSxREPS][@WEIGHT]`, e.g. `"Squat:3x8@95"` or `"Plank"`.
/// Weight is in `unit`.
pub(crate) fn parse_exercise(spec: &str, unit: WeightUnit) -> Result<NewExercise> {
    let (rest, weight) = match spec.rsplit_once('@') {
        Some((rest, w)) => {
            let w: f64 = w
                .trim()
                .parse()
                .with_context(|| format!("Invalid weight in '{spec}'"))?;
            (rest, unit.to_kg(w))
        }
        None => (spec, 0.0),
    };

    let (name, sets, reps) = match rest.rsplit_once(':') {
        Some((name, scheme)) => {
            let (sets, reps) = scheme
                .trim()
                .to_lowercase()
                .split_once('x')
                .map(|(s, r)| (s.trim().parse::<u32>(), r.trim().parse::<u32>()))
                .with_context(|| format!("Invalid sets x reps in '{spec}'. Use e.g. 3x8"))?;
            let sets = sets.with_context(|| format!("Invalid sets in '{spec}'"))?;
            let reps = reps.with_context(|| format!("Invalid reps in '{spec}'"))?;
            (name, Some(sets), Some(reps))
        }
        None => (rest, None, None),
    };

    let name = name.trim();
    if name.is_empty() {
        bail!("Exercise name is missing in '{spec}'");
    }

    Ok(NewExercise {
        name: name.to_string(),
        sets,
        reps,
        weight_kg: weight,
        ..NewExercise::default()
    })
}

pub(crate) struct WorkoutArgs {
    pub category: String,
    pub exercises: Vec<String>,
    pub duration: Option<u32>,
    pub notes: Option<String>,
    pub unit: String,
    pub date: Option<String>,
    pub lookup: bool,
}

pub(crate) fn cmd_workout_log(
    svc: &RecompService,
    provider: Option<&dyn ExerciseLookupProvider>,
    args: WorkoutArgs,
    json: bool,
) -> Result<()> {
    let profile = svc.profile()?;
    let category: WorkoutCategory = args.category.parse()?;
    let unit = WeightUnit::parse(&args.unit)
        .with_context(|| format!("Invalid unit '{}'. Use 'kg' or 'lb'", args.unit))?;
    let date = parse_date(args.date)?;

    let mut builder = WorkoutBuilder::new(date, category)
        .duration_minutes(args.duration)
        .notes(args.notes);

    for spec in &args.exercises {
        let mut exercise = parse_exercise(spec, unit)?;
        if let Some(provider) = provider.filter(|_| args.lookup) {
            match svc.search_exercises(provider, &exercise.name, ExerciseSearchMode::Name) {
                Ok(found) => {
                    if let Some(record) = found.first() {
                        exercise = exercise.with_record(record);
                    }
                }
                Err(EngineError::LookupUnavailable { query }) => {
                    eprintln!("No directory match for '{query}', saving as entered");
                }
                Err(e) => return Err(e.into()),
            }
        }
        builder.add_exercise(exercise);
    }

    let session = svc.save_workout(&profile, builder)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        println!(
            "Saved {} workout on {} with {} exercise(s) [id {}]",
            session.category,
            session.date,
            session.exercises.len(),
            session.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_workout_list(svc: &RecompService, limit: u32, json: bool) -> Result<()> {
    let workouts = svc.list_workouts(Some(limit))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workouts)?);
        return Ok(());
    }
    if workouts.is_empty() {
        eprintln!("No workouts yet. Use `recomp workout log` to record one.");
        return Ok(());
    }

    print_workout_table(&workouts);
    Ok(())
}

pub(crate) fn print_workout_table(workouts: &[WorkoutSession]) {
    #[derive(Tabled)]
    struct WorkoutRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Minutes")]
        minutes: String,
        #[tabled(rename = "Exercises")]
        exercises: String,
    }

    let rows: Vec<WorkoutRow> = workouts
        .iter()
        .map(|w| WorkoutRow {
            id: w.id,
            date: w.date.format("%Y-%m-%d").to_string(),
            category: w.category.to_string(),
            minutes: w.duration_minutes.map_or("-".into(), |m| m.to_string()),
            exercises: truncate(
                &w.exercises
                    .iter()
                    .map(|e| e.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                40,
            ),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_workout_show(svc: &RecompService, id: i64, json: bool) -> Result<()> {
    let w = svc.get_workout(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&w)?);
        return Ok(());
    }

    #[derive(Tabled)]
    struct ExerciseRow {
        #[tabled(rename = "Exercise")]
        name: String,
        #[tabled(rename = "Sets")]
        sets: String,
        #[tabled(rename = "Reps")]
        reps: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Target")]
        target: String,
    }

    println!("=== {} workout, {} ===", w.category, w.date);
    if let Some(m) = w.duration_minutes {
        println!("  Duration: {m} min");
    }
    if let Some(ref n) = w.notes {
        println!("  Notes: {n}");
    }

    let rows: Vec<ExerciseRow> = w
        .exercises
        .iter()
        .map(|e| ExerciseRow {
            name: e.name.clone(),
            sets: e.sets.map_or("-".into(), |s| s.to_string()),
            reps: e.reps.map_or("-".into(), |r| r.to_string()),
            weight: if e.weight_kg > 0.0 {
                format!("{:.1} lb", lb_from_kg(e.weight_kg))
            } else {
                "-".into()
            },
            target: e.target_muscle.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_workout_delete(svc: &RecompService, id: i64, json: bool) -> Result<()> {
    if !svc.delete_workout(id)? {
        bail!("Workout {id} not found");
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted workout {id}");
    }
    Ok(())
}

pub(crate) fn cmd_exercise_search(
    svc: &RecompService,
    provider: &dyn ExerciseLookupProvider,
    query: &str,
    mode: &str,
    json: bool,
) -> Result<()> {
    let mode: ExerciseSearchMode = mode.parse()?;
    let found = match svc.search_exercises(provider, query, mode) {
        Ok(found) => found,
        Err(EngineError::LookupUnavailable { query }) => exit_no_results(&query, json),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        print_exercise_table(&found);
    }
    Ok(())
}
