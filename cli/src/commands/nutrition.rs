use anyhow::Result;
use std::process;

use recomp_core::error::EngineError;
use recomp_core::models::{FoodRecord, Macros, MealEntry, MealSlot};
use recomp_core::planner;
use recomp_core::service::{FoodLookupProvider, RecompService};

use super::helpers::{
    exit_no_results, fmt_macros, json_error, parse_date, parse_serving_amount, print_food_table,
    prompt_choice,
};

/// Search, exiting with status 2 when nothing comes back.
fn search_or_exit(
    svc: &RecompService,
    provider: &dyn FoodLookupProvider,
    query: &str,
    json: bool,
) -> Result<Vec<FoodRecord>> {
    match svc.search_foods(provider, query) {
        Ok(foods) => Ok(foods),
        Err(EngineError::LookupUnavailable { query }) => exit_no_results(&query, json),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn cmd_food_search(
    svc: &RecompService,
    provider: &dyn FoodLookupProvider,
    query: &str,
    json: bool,
) -> Result<()> {
    let foods = search_or_exit(svc, provider, query, json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        print_food_table(&foods);
    }
    Ok(())
}

pub(crate) fn cmd_food_show(
    svc: &RecompService,
    provider: &dyn FoodLookupProvider,
    fdc_id: &str,
    json: bool,
) -> Result<()> {
    let food = match svc.food_details(provider, fdc_id) {
        Ok(food) => food,
        Err(EngineError::LookupUnavailable { query }) => exit_no_results(&query, json),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        print_food_table(std::slice::from_ref(&food));
    }
    Ok(())
}

/// Hand-entered macros; calories default to the 4/4/9 sum.
pub(crate) struct CustomMacros {
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub calories: Option<f64>,
}

impl CustomMacros {
    fn is_given(&self) -> bool {
        self.protein.is_some() || self.carbs.is_some() || self.fat.is_some() || self.calories.is_some()
    }

    fn to_macros(&self) -> Result<Macros> {
        let mut m = planner::from_grams(
            self.protein.unwrap_or(0.0),
            self.carbs.unwrap_or(0.0),
            self.fat.unwrap_or(0.0),
        )?;
        if let Some(kcal) = self.calories {
            m.calories = kcal;
        }
        Ok(m)
    }
}

pub(crate) struct LogArgs {
    pub food: String,
    pub serving: String,
    pub meal: String,
    pub fdc_id: Option<String>,
    pub date: Option<String>,
    pub custom: CustomMacros,
}

pub(crate) fn cmd_log(
    svc: &RecompService,
    provider: &dyn FoodLookupProvider,
    args: LogArgs,
    json: bool,
) -> Result<()> {
    let slot: MealSlot = args.meal.parse()?;
    let date = parse_date(args.date)?;
    let profile = svc.profile()?;

    let entry = if args.custom.is_given() {
        svc.log_custom(
            &profile,
            date,
            slot,
            &args.food,
            &args.serving,
            args.custom.to_macros()?,
        )?
    } else {
        let food = if let Some(id) = args.fdc_id.as_deref() {
            match svc.food_details(provider, id) {
                Ok(food) => food,
                Err(EngineError::LookupUnavailable { query }) => exit_no_results(&query, json),
                Err(e) => return Err(e.into()),
            }
        } else {
            let mut foods = search_or_exit(svc, provider, &args.food, json)?;
            let idx = if foods.len() == 1 {
                0
            } else {
                print_food_table(&foods);
                prompt_choice("a food", foods.len())?
            };
            foods.swap_remove(idx)
        };
        let serving = parse_serving_amount(&args.serving, &food.serving_unit)?;
        svc.log_food(&profile, date, slot, &food, serving)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!(
            "Logged {} ({}) to {} on {}: {}",
            entry.food_name,
            entry.serving,
            entry.slot,
            date,
            fmt_macros(&entry.macros)
        );
    }
    Ok(())
}

pub(crate) fn cmd_summary(svc: &RecompService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let profile = svc.profile()?;
    let summary = svc.daily_summary(&profile, date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.meals.is_empty() {
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    println!("=== {date} ===\n");

    for meal in &summary.meals {
        let label = meal.slot.as_str().to_uppercase();
        let sub_cal = meal.subtotal.calories;
        println!("  {label} ({sub_cal:.0} kcal)");
        for e in &meal.entries {
            print_entry(e);
        }
        println!();
    }

    println!("  TOTAL:     {}", fmt_macros(&summary.totals));
    println!("  TARGET:    {}", fmt_macros(&summary.targets));
    println!("  REMAINING: {}", fmt_macros(&summary.remaining));
    Ok(())
}

fn print_entry(e: &MealEntry) {
    let id = e.id;
    let name = &e.food_name;
    let serving = &e.serving;
    let m = &e.macros;
    println!(
        "    [{id}] {name}, {serving}: {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
        m.calories, m.protein_g, m.carbs_g, m.fats_g
    );
}

pub(crate) fn cmd_delete(svc: &RecompService, entry_id: i64, json: bool) -> Result<()> {
    match svc.remove_meal(entry_id) {
        Ok(entry) => {
            if json {
                println!("{}", serde_json::json!({ "deleted": entry.id }));
            } else {
                println!("Deleted entry {} ({})", entry.id, entry.food_name);
            }
            Ok(())
        }
        Err(e) if json => {
            println!("{}", json_error(&format!("{e:#}")));
            process::exit(1);
        }
        Err(e) => Err(e),
    }
}
