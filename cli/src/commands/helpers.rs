use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use recomp_core::models::{ExerciseRecord, FoodRecord, Macros};
use recomp_core::serving::convert_to_grams;
use recomp_core::units::{WeightUnit, cm_from_in, lb_from_kg};

/// Parse a serving like "150", "150g", "5 oz" or "1 cup"-style input into an
/// amount in `record_unit`. Plain numbers are taken in the record's own unit;
/// anything else must convert to grams, which is only meaningful when the
/// record is measured in g or ml.
pub(crate) fn parse_serving_amount(s: &str, record_unit: &str) -> Result<f64> {
    let s = s.trim();

    let (qty, unit) = if let Ok(v) = s.parse::<f64>() {
        (v, None)
    } else if let Some((qty, unit)) = split_number_unit(s) {
        (qty, Some(unit))
    } else {
        let parts: Vec<&str> = s.splitn(2, char::is_whitespace).collect();
        if parts.len() != 2 {
            bail!("Invalid serving format: '{s}'. Use '150', '150g', '5 oz', etc.");
        }
        let qty: f64 = parts[0]
            .parse()
            .with_context(|| format!("Invalid quantity: '{s}'"))?;
        (qty, Some(parts[1].trim()))
    };

    if !qty.is_finite() || qty < 0.0 {
        bail!("Serving size must be 0 or more");
    }

    let Some(unit) = unit else {
        return Ok(qty);
    };
    if unit.eq_ignore_ascii_case(record_unit) {
        return Ok(qty);
    }
    let Some((grams, is_approx)) = convert_to_grams(qty, unit) else {
        bail!("Unknown unit '{unit}' in '{s}'. Supported: g, kg, lb, oz, tbsp, tsp, ml, l");
    };
    if !matches!(record_unit.to_lowercase().as_str(), "g" | "ml") {
        bail!("This food is measured in '{record_unit}'; give the serving as a plain number");
    }
    if is_approx {
        eprintln!("Note: {qty} {unit} ≈ {grams:.0}g (approximate, assumes water density)");
    }
    Ok(grams)
}

/// Split "500ml" or "2.5tbsp" into (500.0, "ml") or (2.5, "tbsp").
fn split_number_unit(s: &str) -> Option<(f64, &str)> {
    let idx = s.find(|c: char| c.is_alphabetic())?;
    if idx == 0 {
        return None;
    }
    let (num_part, unit_part) = s.split_at(idx);
    let qty: f64 = num_part.trim().parse().ok()?;
    if unit_part.is_empty() {
        return None;
    }
    Some((qty, unit_part))
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn parse_weight_kg(value: f64, unit: &str) -> Result<f64> {
    let unit = WeightUnit::parse(unit)
        .with_context(|| format!("Invalid unit '{unit}'. Use 'kg' or 'lb'"))?;
    Ok(unit.to_kg(value))
}

pub(crate) fn parse_length_cm(value: f64, unit: &str) -> Result<f64> {
    match unit.trim().to_lowercase().as_str() {
        "cm" => Ok(value),
        "in" | "inch" | "inches" => Ok(cm_from_in(value)),
        _ => bail!("Invalid unit '{unit}'. Use 'in' or 'cm'"),
    }
}

pub(crate) fn fmt_weight(kg: f64) -> String {
    format!(
        "{:.1} kg ({:.1} lb)",
        no_neg_zero(kg),
        no_neg_zero(lb_from_kg(kg))
    )
}

pub(crate) fn fmt_macros(m: &Macros) -> String {
    let cal = no_neg_zero(m.calories);
    let p = no_neg_zero(m.protein_g);
    let c = no_neg_zero(m.carbs_g);
    let f = no_neg_zero(m.fats_g);
    format!("{cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g")
}

pub(crate) fn prompt_choice(what: &str, count: usize) -> Result<usize> {
    eprint!("\nSelect {what} (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

/// Report an empty lookup and exit with status 2.
pub(crate) fn exit_no_results(query: &str, json: bool) -> ! {
    if json {
        println!("[]");
    } else {
        eprintln!("No results found for '{query}'");
    }
    process::exit(2);
}

pub(crate) fn print_food_table(foods: &[FoodRecord]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "FDC ID")]
        id: String,
        #[tabled(rename = "Description")]
        name: String,
        #[tabled(rename = "Brand")]
        brand: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: f.source_id.clone().unwrap_or_else(|| "-".into()),
            name: truncate(&f.description, 35),
            brand: truncate(&f.brand, 20),
            serving: format!("{} {}", f.serving_size, f.serving_unit),
            calories: format!("{:.0}", f.macros.calories),
            protein: format!("{:.1}", f.macros.protein_g),
            carbs: format!("{:.1}", f.macros.carbs_g),
            fat: format!("{:.1}", f.macros.fats_g),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..9)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_exercise_table(exercises: &[ExerciseRecord]) {
    #[derive(Tabled)]
    struct ExerciseRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Body part")]
        body_part: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "Equipment")]
        equipment: String,
    }

    let rows: Vec<ExerciseRow> = exercises
        .iter()
        .enumerate()
        .map(|(i, e)| ExerciseRow {
            idx: i + 1,
            id: e.source_id.clone(),
            name: truncate(&e.name, 35),
            body_part: e.body_part.clone(),
            target: e.target.clone(),
            equipment: e.equipment.clone(),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
