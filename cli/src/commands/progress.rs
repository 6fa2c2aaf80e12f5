use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use vitality_core::SyncEngine;
use vitality_core::models::{DailyProgress, MealLogEntry, Profile};

use super::helpers::{no_neg_zero, parse_date, print_json, truncate};

/// Progress plus the targets it is measured against.
#[derive(Serialize)]
struct DayReport<'a> {
    #[serde(flatten)]
    progress: &'a DailyProgress,
    calorie_target: Option<u32>,
    calories_remaining: Option<f64>,
    water_target_ml: Option<u32>,
}

fn report<'a>(progress: &'a DailyProgress, profile: &Profile) -> DayReport<'a> {
    if profile.is_onboarding_placeholder() {
        return DayReport {
            progress,
            calorie_target: None,
            calories_remaining: None,
            water_target_ml: None,
        };
    }
    DayReport {
        progress,
        calorie_target: Some(profile.goals.daily_calories),
        calories_remaining: Some(no_neg_zero(progress.calories_remaining(profile))),
        water_target_ml: Some(profile.water_target_ml()),
    }
}

fn print_day(report: &DayReport<'_>) {
    let p = report.progress;
    println!("{}", p.date.format("%A, %Y-%m-%d"));
    match (report.calorie_target, report.calories_remaining) {
        (Some(target), Some(remaining)) => println!(
            "  Calories:  {:.0} eaten, {:.0} burned, {:.0} of {target} kcal left",
            p.calories_consumed, p.calories_burned, remaining
        ),
        _ => println!(
            "  Calories:  {:.0} eaten, {:.0} burned",
            p.calories_consumed, p.calories_burned
        ),
    }
    println!(
        "  Macros:    P {:.1}g  C {:.1}g  F {:.1}g",
        p.macros.protein, p.macros.carbs, p.macros.fats
    );
    match report.water_target_ml {
        Some(target) => println!("  Water:     {:.0} / {target} ml", p.water_ml),
        None => println!("  Water:     {:.0} ml", p.water_ml),
    }
    println!("  Steps:     {}", p.steps);

    if p.meals.is_empty() {
        return;
    }

    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Meal")]
        name: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fats: String,
    }

    let rows: Vec<MealRow> = p
        .meals
        .iter()
        .map(|m| MealRow {
            time: chrono::DateTime::from_timestamp_millis(m.timestamp)
                .map(|t| t.with_timezone(&chrono::Local).format("%H:%M").to_string())
                .unwrap_or_default(),
            name: truncate(&m.name, 35),
            calories: format!("{:.0}", m.calories),
            protein: format!("{:.1}", m.protein),
            carbs: format!("{:.1}", m.carbs),
            fats: format!("{:.1}", m.fats),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

async fn show(engine: &SyncEngine, progress: &DailyProgress, json: bool) -> Result<()> {
    let profile = engine.load_profile().await?;
    let report = report(progress, &profile);
    if json {
        print_json(&report)
    } else {
        print_day(&report);
        Ok(())
    }
}

pub(crate) async fn cmd_progress_show(
    engine: &SyncEngine,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let progress = match date {
        None => engine.load_today().await?,
        Some(_) => engine.load_progress(parse_date(date)?).await?,
    };
    show(engine, &progress, json).await
}

pub(crate) struct MealInput {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

pub(crate) async fn cmd_progress_meal(
    engine: &SyncEngine,
    meal: MealInput,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if meal.calories < 0.0 {
        bail!("Calories must not be negative");
    }
    let date = parse_date(date)?;
    let entry = MealLogEntry::new(&meal.name, meal.calories, meal.protein, meal.carbs, meal.fat);
    let progress = engine.log_meal(date, entry).await?;

    if !json {
        println!("Logged {} ({:.0} kcal)", meal.name, meal.calories);
    }
    show(engine, &progress, json).await
}

pub(crate) async fn cmd_progress_water(
    engine: &SyncEngine,
    ml: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if ml <= 0.0 {
        bail!("Water amount must be greater than 0");
    }
    let date = parse_date(date)?;
    let progress = engine.add_water(date, ml).await?;

    if json {
        print_json(&progress)
    } else {
        println!(
            "Added {ml:.0} ml of water ({:.0} ml total for {})",
            progress.water_ml,
            date.format("%Y-%m-%d")
        );
        Ok(())
    }
}

pub(crate) async fn cmd_progress_activity(
    engine: &SyncEngine,
    steps: u64,
    burned: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let progress = engine.record_activity(date, steps, burned).await?;

    if json {
        print_json(&progress)
    } else {
        println!(
            "Activity for {}: {} steps, {:.0} kcal burned",
            date.format("%Y-%m-%d"),
            progress.steps,
            progress.calories_burned
        );
        Ok(())
    }
}

pub(crate) async fn cmd_progress_history(engine: &SyncEngine, days: usize, json: bool) -> Result<()> {
    if days == 0 {
        bail!("--days must be at least 1");
    }
    let history = engine.progress_history(days).await?;

    if json {
        return print_json(&history);
    }
    if history.is_empty() {
        eprintln!("No progress recorded yet. Use `vitality progress meal` to log a meal.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: NaiveDate,
        #[tabled(rename = "Eaten")]
        eaten: String,
        #[tabled(rename = "Burned")]
        burned: String,
        #[tabled(rename = "Water ml")]
        water: String,
        #[tabled(rename = "Steps")]
        steps: u64,
        #[tabled(rename = "Meals")]
        meals: usize,
    }

    let rows: Vec<HistoryRow> = history
        .iter()
        .map(|p| HistoryRow {
            date: p.date,
            eaten: format!("{:.0}", p.calories_consumed),
            burned: format!("{:.0}", p.calories_burned),
            water: format!("{:.0}", p.water_ml),
            steps: p.steps,
            meals: p.meals.len(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}
