use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use recomp_core::error::EngineError;
use recomp_core::models::NewProgressEntry;
use recomp_core::service::RecompService;
use recomp_core::trend::{self, Trend, WeightChange};
use recomp_core::units::lb_from_kg;

use super::helpers::{fmt_weight, parse_date, parse_length_cm, parse_weight_kg};

pub(crate) struct ProgressArgs {
    pub weight: f64,
    pub unit: String,
    pub body_fat: Option<f64>,
    pub waist: Option<f64>,
    pub chest: Option<f64>,
    pub arms: Option<f64>,
    pub thighs: Option<f64>,
    pub length_unit: String,
    pub photo: Option<String>,
    pub notes: Option<String>,
    pub date: Option<String>,
}

pub(crate) fn cmd_progress_log(svc: &RecompService, args: ProgressArgs, json: bool) -> Result<()> {
    let profile = svc.profile()?;
    let length = |v: Option<f64>| v.map(|v| parse_length_cm(v, &args.length_unit)).transpose();

    let entry = NewProgressEntry {
        date: parse_date(args.date.clone())?,
        weight_kg: parse_weight_kg(args.weight, &args.unit)?,
        body_fat_pct: args.body_fat,
        waist_cm: length(args.waist)?,
        chest_cm: length(args.chest)?,
        arms_cm: length(args.arms)?,
        thighs_cm: length(args.thighs)?,
        photo_path: args.photo.clone(),
        notes: args.notes.clone(),
    };
    let saved = svc.log_progress(&profile, &entry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        println!("Logged {} on {}", fmt_weight(saved.weight_kg), saved.date);
        if let Some(bf) = saved.body_fat_pct {
            println!("  Body fat: {bf:.1}%");
        }
    }
    Ok(())
}

pub(crate) fn cmd_progress_history(svc: &RecompService, limit: usize, json: bool) -> Result<()> {
    let entries = svc.progress_history()?;
    let view = trend::history_view(&entries, limit);

    if json {
        let shown: Vec<_> = view.iter().collect();
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }
    if view.is_empty() {
        eprintln!("No progress entries yet. Use `recomp progress log` to add one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ProgressRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight (kg)")]
        kg: String,
        #[tabled(rename = "Weight (lb)")]
        lb: String,
        #[tabled(rename = "Body Fat")]
        body_fat: String,
        #[tabled(rename = "Waist (cm)")]
        waist: String,
    }

    let rows: Vec<ProgressRow> = view
        .iter()
        .map(|e| ProgressRow {
            id: e.id,
            date: e.date.format("%Y-%m-%d").to_string(),
            kg: format!("{:.1}", e.weight_kg),
            lb: format!("{:.1}", lb_from_kg(e.weight_kg)),
            body_fat: e.body_fat_pct.map_or("-".into(), |bf| format!("{bf:.1}%")),
            waist: e.waist_cm.map_or("-".into(), |w| format!("{w:.1}")),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    if view.len() < entries.len() {
        eprintln!("Showing {} of {} entries", view.len(), entries.len());
    }
    Ok(())
}

pub(crate) fn change_line(change: &WeightChange) -> String {
    let lb = lb_from_kg(change.delta_kg);
    let suffix = match change.trend {
        Trend::Loss => " (Lost weight!)",
        Trend::Gain => " (Gained weight)",
        Trend::NoChange => " (No change)",
    };
    format!("Total change: {lb:+.1} lb ({:+.1} kg){suffix}", change.delta_kg)
}

pub(crate) fn cmd_progress_trend(svc: &RecompService, json: bool) -> Result<()> {
    let change = match svc.weight_change() {
        Ok(change) => change,
        Err(e) => match e.downcast_ref::<EngineError>() {
            Some(EngineError::InsufficientData { needed, found }) => {
                if json {
                    println!("null");
                } else {
                    eprintln!(
                        "Need at least {needed} progress entries to show a trend (have {found})"
                    );
                }
                return Ok(());
            }
            _ => return Err(e),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&change)?);
    } else {
        println!("{} to {}", change.from, change.to);
        println!("{}", change_line(&change));
    }
    Ok(())
}

pub(crate) fn cmd_progress_delete(svc: &RecompService, id: i64, json: bool) -> Result<()> {
    if !svc.delete_progress(id)? {
        bail!("Progress entry {id} not found");
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted progress entry {id}");
    }
    Ok(())
}
