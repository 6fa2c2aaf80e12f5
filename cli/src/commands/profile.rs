use anyhow::{Result, bail};
use clap::Args;
use uuid::Uuid;

use vitality_core::SyncEngine;
use vitality_core::models::{Biometrics, DietaryType, Goals, MacroRatio, Preferences, Profile};

use super::helpers::{
    json_error, parse_activity, parse_diet, parse_gender, parse_goal, parse_macro_ratio,
    print_json,
};

#[derive(Args)]
pub(crate) struct ProfileInit {
    /// Display name
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub age: u32,
    /// Body weight in kg
    #[arg(long)]
    pub weight: f64,
    /// Height in cm
    #[arg(long)]
    pub height: f64,
    /// male, female, other
    #[arg(long, default_value = "other")]
    pub gender: String,
    /// sedentary, light, moderate, active, athlete
    #[arg(long, default_value = "moderate")]
    pub activity: String,
    /// weight-loss, maintenance, muscle-gain
    #[arg(long, default_value = "maintenance")]
    pub goal: String,
    /// Daily calorie target (kcal)
    #[arg(long)]
    pub calories: u32,
    /// Daily water target (ml)
    #[arg(long)]
    pub water: Option<u32>,
    /// Target weight in kg
    #[arg(long)]
    pub target_weight: Option<f64>,
    /// Protein percentage (requires --carbs and --fat)
    #[arg(long)]
    pub protein: Option<f64>,
    /// Carbs percentage (requires --protein and --fat)
    #[arg(long)]
    pub carbs: Option<f64>,
    /// Fat percentage (requires --protein and --carbs)
    #[arg(long)]
    pub fat: Option<f64>,
    /// omnivore, vegetarian, vegan, keto, paleo
    #[arg(long, default_value = "omnivore")]
    pub diet: String,
    /// Allergy (repeatable)
    #[arg(long = "allergy")]
    pub allergies: Vec<String>,
    /// Excluded ingredient (repeatable)
    #[arg(long = "exclude")]
    pub excluded: Vec<String>,
}

#[derive(Args)]
pub(crate) struct ProfileUpdate {
    #[arg(long)]
    pub name: Option<String>,
    /// Body weight in kg
    #[arg(long)]
    pub weight: Option<f64>,
    /// sedentary, light, moderate, active, athlete
    #[arg(long)]
    pub activity: Option<String>,
    /// weight-loss, maintenance, muscle-gain
    #[arg(long)]
    pub goal: Option<String>,
    /// Daily calorie target (kcal)
    #[arg(long)]
    pub calories: Option<u32>,
    /// Daily water target (ml)
    #[arg(long)]
    pub water: Option<u32>,
    /// Target weight in kg
    #[arg(long)]
    pub target_weight: Option<f64>,
    #[arg(long)]
    pub protein: Option<f64>,
    #[arg(long)]
    pub carbs: Option<f64>,
    #[arg(long)]
    pub fat: Option<f64>,
    /// omnivore, vegetarian, vegan, keto, paleo
    #[arg(long)]
    pub diet: Option<String>,
}

fn print_profile(profile: &Profile) {
    let bio = &profile.biometrics;
    let goals = &profile.goals;
    let ratio = goals.macro_ratio;

    println!("{} ({})", profile.name, profile.id);
    if let Some(ref email) = profile.email {
        println!("  Email:     {email}");
    }
    println!(
        "  Body:      {} y, {:.1} kg, {:.0} cm, {:?}, {:?}",
        bio.age, bio.weight, bio.height, bio.gender, bio.activity_level
    );
    print!("  Goal:      {:?}, {} kcal/day", goals.primary, goals.daily_calories);
    if let Some(target) = goals.target_weight {
        print!(", target {target:.1} kg");
    }
    println!();
    println!(
        "  Macros:    Protein {}%  Carbs {}%  Fat {}%",
        ratio.p, ratio.c, ratio.f
    );
    println!("  Water:     {} ml/day", profile.water_target_ml());
    println!("  Diet:      {:?}", profile.preferences.dietary_type);
    if !profile.preferences.allergies.is_empty() {
        println!("  Allergies: {}", profile.preferences.allergies.join(", "));
    }
    if !profile.preferences.excluded_ingredients.is_empty() {
        println!(
            "  Excludes:  {}",
            profile.preferences.excluded_ingredients.join(", ")
        );
    }
    println!("  Reminders: {}", profile.reminders.len());
}

pub(crate) async fn cmd_profile_show(engine: &SyncEngine, json: bool) -> Result<()> {
    let profile = engine.load_profile().await?;

    if profile.is_onboarding_placeholder() {
        let message = "No profile yet. Use `vitality profile init` to create one.";
        if json {
            println!("{}", json_error(message));
        } else {
            eprintln!("{message}");
        }
        return Ok(());
    }

    if json {
        print_json(&profile)
    } else {
        print_profile(&profile);
        Ok(())
    }
}

pub(crate) async fn cmd_profile_init(
    engine: &SyncEngine,
    identity: Option<String>,
    init: ProfileInit,
    json: bool,
) -> Result<()> {
    let existing = engine.load_profile().await?;
    if !existing.is_onboarding_placeholder() {
        bail!(
            "A profile for '{}' already exists. Use `vitality profile set` to change it",
            existing.name
        );
    }

    let macro_ratio = parse_macro_ratio(init.protein, init.carbs, init.fat)?.unwrap_or(
        MacroRatio {
            p: 30.0,
            c: 40.0,
            f: 30.0,
        },
    );

    let profile = Profile {
        id: identity.unwrap_or_else(|| Uuid::new_v4().to_string()),
        email: init.email,
        name: init.name,
        avatar_url: None,
        biometrics: Biometrics {
            age: init.age,
            weight: init.weight,
            height: init.height,
            gender: parse_gender(&init.gender)?,
            activity_level: parse_activity(&init.activity)?,
        },
        goals: Goals {
            primary: parse_goal(&init.goal)?,
            target_weight: init.target_weight,
            daily_calories: init.calories,
            daily_water: init.water,
            macro_ratio,
        },
        preferences: Preferences {
            allergies: init.allergies,
            dietary_type: parse_diet(&init.diet)?,
            excluded_ingredients: init.excluded,
        },
        reminders: Vec::new(),
    };

    engine.save_profile(&profile).await?;

    if json {
        print_json(&profile)
    } else {
        println!("Profile created for {}", profile.name);
        print_profile(&profile);
        Ok(())
    }
}

pub(crate) async fn cmd_profile_set(
    engine: &SyncEngine,
    update: ProfileUpdate,
    json: bool,
) -> Result<()> {
    let macro_ratio = parse_macro_ratio(update.protein, update.carbs, update.fat)?;
    let activity = update.activity.as_deref().map(parse_activity).transpose()?;
    let goal = update.goal.as_deref().map(parse_goal).transpose()?;
    let diet: Option<DietaryType> = update.diet.as_deref().map(parse_diet).transpose()?;

    let profile = engine
        .update_profile(|p| {
            if let Some(name) = update.name {
                p.name = name;
            }
            if let Some(weight) = update.weight {
                p.biometrics.weight = weight;
            }
            if let Some(level) = activity {
                p.biometrics.activity_level = level;
            }
            if let Some(goal) = goal {
                p.goals.primary = goal;
            }
            if let Some(calories) = update.calories {
                p.goals.daily_calories = calories;
            }
            if let Some(water) = update.water {
                p.goals.daily_water = Some(water);
            }
            if let Some(target) = update.target_weight {
                p.goals.target_weight = Some(target);
            }
            if let Some(ratio) = macro_ratio {
                p.goals.macro_ratio = ratio;
            }
            if let Some(diet) = diet {
                p.preferences.dietary_type = diet;
            }
            Ok(())
        })
        .await?;

    if json {
        print_json(&profile)
    } else {
        println!("Profile updated");
        print_profile(&profile);
        Ok(())
    }
}
