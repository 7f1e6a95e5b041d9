use anyhow::Result;
use serde_json::json;

use recomp_core::energy::ActivityLevel;
use recomp_core::models::{Profile, Sex};
use recomp_core::service::{ProfileSetup, RecompService, TargetPlan};
use recomp_core::units::{in_from_cm, lb_from_kg};

use super::helpers::{fmt_macros, fmt_weight, parse_length_cm, parse_weight_kg};

pub(crate) struct SetupArgs {
    pub name: String,
    pub age: u32,
    pub sex: String,
    pub height: f64,
    pub height_unit: String,
    pub weight: f64,
    pub target_weight: f64,
    pub unit: String,
    pub activity: String,
}

pub(crate) fn cmd_setup(svc: &RecompService, args: SetupArgs, json: bool) -> Result<()> {
    let setup = ProfileSetup {
        name: args.name,
        age: args.age,
        sex: args.sex.parse::<Sex>()?,
        height_cm: parse_length_cm(args.height, &args.height_unit)?,
        weight_kg: parse_weight_kg(args.weight, &args.unit)?,
        target_weight_kg: parse_weight_kg(args.target_weight, &args.unit)?,
        activity_level: args.activity.parse::<ActivityLevel>()?,
    };
    let (profile, plan) = svc.setup_profile(&setup)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "profile": profile, "plan": plan }))?
        );
    } else {
        println!("Created profile for {}", profile.name);
        print_plan(&plan);
    }
    Ok(())
}

pub(crate) fn cmd_targets_calc(
    svc: &RecompService,
    activity: Option<&str>,
    json: bool,
) -> Result<()> {
    let profile = svc.profile()?;
    let activity = activity.map(str::parse::<ActivityLevel>).transpose()?;
    let (profile, plan) = svc.recalculate_targets(&profile, activity)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "profile": profile, "plan": plan }))?
        );
    } else {
        println!(
            "Recalculated targets from {} at {} activity",
            fmt_weight(profile.current_weight_kg),
            profile.activity_level
        );
        print_plan(&plan);
    }
    Ok(())
}

pub(crate) fn cmd_targets_set(
    svc: &RecompService,
    protein: f64,
    carbs: f64,
    fat: f64,
    json: bool,
) -> Result<()> {
    let profile = svc.profile()?;
    let profile = svc.set_manual_targets(&profile, protein, carbs, fat)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile.targets)?);
    } else {
        println!("Targets set: {}", fmt_macros(&profile.targets));
    }
    Ok(())
}

pub(crate) fn cmd_goal_set(svc: &RecompService, weight: f64, unit: &str, json: bool) -> Result<()> {
    let profile = svc.set_target_weight(parse_weight_kg(weight, unit)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Target weight set to {}", fmt_weight(profile.target_weight_kg));
        eprintln!("Run `recomp targets calc` to update your macro targets.");
    }
    Ok(())
}

pub(crate) fn cmd_targets_show(svc: &RecompService, json: bool) -> Result<()> {
    let profile = svc.profile()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile);
    }
    Ok(())
}

fn print_profile(p: &Profile) {
    println!("=== {} ===\n", p.name);
    println!("  Age:            {}", p.age);
    println!("  Sex:            {}", p.sex.as_str());
    println!(
        "  Height:         {:.1} cm ({:.1} in)",
        p.height_cm,
        in_from_cm(p.height_cm)
    );
    println!("  Current weight: {}", fmt_weight(p.current_weight_kg));
    println!("  Target weight:  {}", fmt_weight(p.target_weight_kg));
    println!("  Activity:       {}", p.activity_level);
    println!();
    println!("  TARGETS: {}", fmt_macros(&p.targets));
    let to_go = lb_from_kg(p.current_weight_kg - p.target_weight_kg);
    if to_go.abs() >= 0.05 {
        println!("  {:.1} lb to goal", to_go.abs());
    }
}

fn print_plan(plan: &TargetPlan) {
    let bmr = plan.estimate.bmr;
    let tdee = plan.estimate.tdee;
    println!("  BMR:  {bmr:.0} kcal");
    println!("  TDEE: {tdee:.0} kcal ({})", plan.estimate.activity_level);
    println!("  TARGETS: {}", fmt_macros(&plan.targets));
    if plan.targets.carbs_g < 0.0 {
        eprintln!(
            "Warning: protein and fat targets exceed the calorie budget; carbs are negative."
        );
    }
}
