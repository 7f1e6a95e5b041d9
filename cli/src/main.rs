mod commands;
mod config;
mod exercisedb;
mod usda;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    CustomMacros, LogArgs, ProgressArgs, SetupArgs, WorkoutArgs, cmd_dashboard, cmd_delete,
    cmd_exercise_search, cmd_food_search, cmd_food_show, cmd_goal_set, cmd_log,
    cmd_progress_delete, cmd_progress_history, cmd_progress_log, cmd_progress_trend, cmd_setup,
    cmd_summary, cmd_targets_calc, cmd_targets_set, cmd_targets_show, cmd_workout_delete,
    cmd_workout_list, cmd_workout_log, cmd_workout_show,
};
use crate::config::Config;
use crate::exercisedb::ExerciseDbClient;
use crate::usda::UsdaClient;
use recomp_core::service::{ExerciseLookupProvider, RecompService};

#[derive(Parser)]
#[command(
    name = "recomp",
    version,
    about = "A local-first body-recomposition tracker",
    long_about = "Track macros, workouts and body measurements against targets \
                  derived from your BMR and activity level."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create your profile and compute initial macro targets
    Setup {
        /// Your name
        #[arg(long)]
        name: String,
        /// Age in years
        #[arg(long)]
        age: u32,
        /// Sex: female or male (BMR offset comes from config.toml)
        #[arg(long, default_value = "female")]
        sex: String,
        /// Height (number)
        #[arg(long)]
        height: f64,
        /// Height unit: in or cm
        #[arg(long, default_value = "in")]
        height_unit: String,
        /// Current weight (number)
        #[arg(long)]
        weight: f64,
        /// Target weight (number)
        #[arg(long)]
        target_weight: f64,
        /// Weight unit: kg or lb
        #[arg(short, long, default_value = "lb")]
        unit: String,
        /// Activity level: sedentary, light, moderate, very_active, extremely_active
        #[arg(short, long, default_value = "moderate")]
        activity: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change daily macro targets
    Targets {
        #[command(subcommand)]
        command: TargetCommands,
    },
    /// Look up foods in USDA `FoodData` Central
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Log a food entry
    Log {
        /// Food name to search for (or the entry name with custom macros)
        food: String,
        /// Serving (e.g. "150g", "1.5 cup"; a bare number uses the food's unit)
        serving: String,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Log directly by FDC id (skip search)
        #[arg(long)]
        fdc_id: Option<String>,
        /// Custom protein grams (skips lookup)
        #[arg(long)]
        protein: Option<f64>,
        /// Custom carb grams (skips lookup)
        #[arg(long)]
        carbs: Option<f64>,
        /// Custom fat grams (skips lookup)
        #[arg(long)]
        fat: Option<f64>,
        /// Custom calories (defaults to 4/4/9 from the grams)
        #[arg(long)]
        calories: Option<f64>,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily totals against targets (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record and review workouts
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Search the exercise directory
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Track weight and body measurements
    Progress {
        #[command(subcommand)]
        command: ProgressCommands,
    },
    /// Today's totals, weight trend and recent workouts
    Dashboard {
        /// Number of recent workouts to show
        #[arg(short, long, default_value = "5")]
        recent: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TargetCommands {
    /// Recompute targets from the latest weight
    Calc {
        /// Change activity level before recomputing
        #[arg(short, long)]
        activity: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set targets by hand (grams; calories follow 4/4/9)
    Set {
        #[arg(long)]
        protein: f64,
        #[arg(long)]
        carbs: f64,
        #[arg(long)]
        fat: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show profile and current targets
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the target weight
    Goal {
        /// Target weight (number)
        weight: f64,
        /// Unit: kg or lb
        #[arg(short, long, default_value = "lb")]
        unit: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Search foods by name
    Search {
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one food by FDC id
    Show {
        fdc_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// Log a workout session
    Log {
        /// Category: strength, cardio, sculpt, hiit, yoga, other
        category: String,
        /// Exercise as NAME[:SETSxREPS][@WEIGHT], repeatable
        #[arg(short, long = "exercise", required = true)]
        exercises: Vec<String>,
        /// Duration in minutes
        #[arg(short, long)]
        duration: Option<u32>,
        /// Weight unit for exercises: kg or lb
        #[arg(short, long, default_value = "lb")]
        unit: String,
        /// Fill in body part, target and equipment from the exercise directory
        #[arg(long)]
        lookup: bool,
        #[arg(long)]
        notes: Option<String>,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recent workouts
    List {
        #[arg(short = 'n', long, default_value = "10")]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one workout with its exercises
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout and its exercises
    Delete {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExerciseCommands {
    /// Search by name, body part, target muscle or equipment
    Search {
        query: String,
        /// Search mode: name, body-part, target, equipment
        #[arg(short, long, default_value = "name")]
        mode: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProgressCommands {
    /// Log weight and optional measurements
    Log {
        /// Weight value (number)
        weight: f64,
        /// Unit: kg or lb
        #[arg(short, long, default_value = "lb")]
        unit: String,
        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,
        #[arg(long)]
        waist: Option<f64>,
        #[arg(long)]
        chest: Option<f64>,
        #[arg(long)]
        arms: Option<f64>,
        #[arg(long)]
        thighs: Option<f64>,
        /// Unit for measurements: in or cm
        #[arg(long, default_value = "in")]
        length_unit: String,
        /// Path to a progress photo
        #[arg(long)]
        photo: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent entries, newest first
    History {
        /// Number of entries to show (default from config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Weight change between the first and latest entry
    Trend {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a progress entry by ID
    Delete {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RECOMP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let svc = RecompService::new(&config.db_path, config.settings.engine())?;
    let usda = || {
        UsdaClient::new(
            &config.settings.usda.api_key,
            config.settings.usda.page_size,
        )
    };
    let exercise_db = || ExerciseDbClient::new(config.settings.exercisedb.api_key.clone());

    match cli.command {
        Commands::Setup {
            name,
            age,
            sex,
            height,
            height_unit,
            weight,
            target_weight,
            unit,
            activity,
            json,
        } => {
            let args = SetupArgs {
                name,
                age,
                sex,
                height,
                height_unit,
                weight,
                target_weight,
                unit,
                activity,
            };
            cmd_setup(&svc, args, json)?;
            if !json {
                eprintln!("Data stored in {}", config.data_dir.display());
            }
            Ok(())
        }
        Commands::Targets { command } => match command {
            TargetCommands::Calc { activity, json } => {
                cmd_targets_calc(&svc, activity.as_deref(), json)
            }
            TargetCommands::Set {
                protein,
                carbs,
                fat,
                json,
            } => cmd_targets_set(&svc, protein, carbs, fat, json),
            TargetCommands::Show { json } => cmd_targets_show(&svc, json),
            TargetCommands::Goal { weight, unit, json } => cmd_goal_set(&svc, weight, &unit, json),
        },
        Commands::Food { command } => match command {
            FoodCommands::Search { query, json } => cmd_food_search(&svc, &usda()?, &query, json),
            FoodCommands::Show { fdc_id, json } => cmd_food_show(&svc, &usda()?, &fdc_id, json),
        },
        Commands::Log {
            food,
            serving,
            meal,
            fdc_id,
            protein,
            carbs,
            fat,
            calories,
            date,
            json,
        } => {
            let args = LogArgs {
                food,
                serving,
                meal,
                fdc_id,
                date,
                custom: CustomMacros {
                    protein,
                    carbs,
                    fat,
                    calories,
                },
            };
            cmd_log(&svc, &usda()?, args, json)
        }
        Commands::Summary { date, json } => cmd_summary(&svc, date, json),
        Commands::Delete { entry_id, json } => cmd_delete(&svc, entry_id, json),
        Commands::Workout { command } => match command {
            WorkoutCommands::Log {
                category,
                exercises,
                duration,
                unit,
                lookup,
                notes,
                date,
                json,
            } => {
                let client = if lookup { Some(exercise_db()?) } else { None };
                let args = WorkoutArgs {
                    category,
                    exercises,
                    duration,
                    notes,
                    unit,
                    date,
                    lookup,
                };
                let provider = client.as_ref().map(|c| c as &dyn ExerciseLookupProvider);
                cmd_workout_log(&svc, provider, args, json)
            }
            WorkoutCommands::List { limit, json } => cmd_workout_list(&svc, limit, json),
            WorkoutCommands::Show { id, json } => cmd_workout_show(&svc, id, json),
            WorkoutCommands::Delete { id, json } => cmd_workout_delete(&svc, id, json),
        },
        Commands::Exercise { command } => match command {
            ExerciseCommands::Search { query, mode, json } => {
                cmd_exercise_search(&svc, &exercise_db()?, &query, &mode, json)
            }
        },
        Commands::Progress { command } => match command {
            ProgressCommands::Log {
                weight,
                unit,
                body_fat,
                waist,
                chest,
                arms,
                thighs,
                length_unit,
                photo,
                notes,
                date,
                json,
            } => {
                let args = ProgressArgs {
                    weight,
                    unit,
                    body_fat,
                    waist,
                    chest,
                    arms,
                    thighs,
                    length_unit,
                    photo,
                    notes,
                    date,
                };
                cmd_progress_log(&svc, args, json)
            }
            ProgressCommands::History { limit, json } => {
                let limit = limit.unwrap_or(config.settings.trend.history_limit);
                cmd_progress_history(&svc, limit, json)
            }
            ProgressCommands::Trend { json } => cmd_progress_trend(&svc, json),
            ProgressCommands::Delete { id, json } => cmd_progress_delete(&svc, id, json),
        },
        Commands::Dashboard { recent, json } => cmd_dashboard(&svc, recent, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_counts_rejected() {
        assert!(Cli::try_parse_from(["recomp", "workout", "list", "-n", "-1"]).is_err());
        assert!(Cli::try_parse_from(["recomp", "dashboard", "--recent", "-3"]).is_err());
    }

    #[test]
    fn test_count_defaults_and_values() {
        let cli = Cli::try_parse_from(["recomp", "dashboard"]).unwrap();
        assert!(matches!(cli.command, Commands::Dashboard { recent: 5, .. }));

        let cli = Cli::try_parse_from(["recomp", "workout", "list", "-n", "0"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Workout {
                command: WorkoutCommands::List { limit: 0, .. }
            }
        ));
    }
}
