mod dashboard;
mod helpers;
mod nutrition;
mod profile;
mod progress;
mod workout;

pub(crate) use dashboard::cmd_dashboard;
pub(crate) use nutrition::{
    CustomMacros, LogArgs, cmd_delete, cmd_food_search, cmd_food_show, cmd_log, cmd_summary,
};
pub(crate) use profile::{
    SetupArgs, cmd_goal_set, cmd_setup, cmd_targets_calc, cmd_targets_set, cmd_targets_show,
};
pub(crate) use progress::{
    ProgressArgs, cmd_progress_delete, cmd_progress_history, cmd_progress_log, cmd_progress_trend,
};
pub(crate) use workout::{
    WorkoutArgs, cmd_exercise_search, cmd_workout_delete, cmd_workout_list, cmd_workout_log,
    cmd_workout_show,
};
