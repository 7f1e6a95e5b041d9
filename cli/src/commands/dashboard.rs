use anyhow::Result;
use chrono::Local;

use recomp_core::service::RecompService;

use super::helpers::{fmt_macros, fmt_weight};
use super::progress::change_line;
use super::workout::print_workout_table;

pub(crate) fn cmd_dashboard(svc: &RecompService, recent: u32, json: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let dash = svc.dashboard(today, recent)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    let p = &dash.profile;
    println!("=== {} | {today} ===\n", p.name);

    let weight = dash
        .latest_progress
        .as_ref()
        .map_or(p.current_weight_kg, |e| e.weight_kg);
    println!("  Weight: {}", fmt_weight(weight));
    println!("  Goal:   {}", fmt_weight(p.target_weight_kg));
    if let Some(ref change) = dash.weight_change {
        println!("  {}", change_line(change));
    }
    println!();

    println!("  EATEN:     {}", fmt_macros(&dash.today.totals));
    println!("  TARGET:    {}", fmt_macros(&dash.today.targets));
    println!("  REMAINING: {}", fmt_macros(&dash.today.remaining));
    println!();

    if dash.recent_workouts.is_empty() {
        println!("  No workouts logged yet.");
    } else {
        println!("  Recent workouts:");
        print_workout_table(&dash.recent_workouts);
    }
    Ok(())
}
