use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use vitality_core::models::{
    ActivityLevel, DietaryType, Gender, MacroRatio, PrimaryGoal, ReminderFrequency, ReminderType,
    validate_macro_ratio,
};

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

fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace(['_', ' '], "-")
}

pub(crate) fn parse_gender(s: &str) -> Result<Gender> {
    match normalize(s).as_str() {
        "male" | "m" => Ok(Gender::Male),
        "female" | "f" => Ok(Gender::Female),
        "other" => Ok(Gender::Other),
        _ => bail!("Invalid gender '{s}'. Use male, female, or other"),
    }
}

pub(crate) fn parse_activity(s: &str) -> Result<ActivityLevel> {
    match normalize(s).as_str() {
        "sedentary" => Ok(ActivityLevel::Sedentary),
        "light" => Ok(ActivityLevel::Light),
        "moderate" => Ok(ActivityLevel::Moderate),
        "active" => Ok(ActivityLevel::Active),
        "athlete" => Ok(ActivityLevel::Athlete),
        _ => bail!("Invalid activity level '{s}'. Use sedentary, light, moderate, active, or athlete"),
    }
}

pub(crate) fn parse_goal(s: &str) -> Result<PrimaryGoal> {
    match normalize(s).as_str() {
        "weight-loss" | "lose" => Ok(PrimaryGoal::WeightLoss),
        "maintenance" | "maintain" => Ok(PrimaryGoal::Maintenance),
        "muscle-gain" | "gain" => Ok(PrimaryGoal::MuscleGain),
        _ => bail!("Invalid goal '{s}'. Use weight-loss, maintenance, or muscle-gain"),
    }
}

pub(crate) fn parse_diet(s: &str) -> Result<DietaryType> {
    match normalize(s).as_str() {
        "omnivore" => Ok(DietaryType::Omnivore),
        "vegetarian" => Ok(DietaryType::Vegetarian),
        "vegan" => Ok(DietaryType::Vegan),
        "keto" => Ok(DietaryType::Keto),
        "paleo" => Ok(DietaryType::Paleo),
        _ => bail!("Invalid diet '{s}'. Use omnivore, vegetarian, vegan, keto, or paleo"),
    }
}

pub(crate) fn parse_reminder_type(s: &str) -> Result<ReminderType> {
    match normalize(s).as_str() {
        "medicine" | "med" => Ok(ReminderType::Medicine),
        "screening" => Ok(ReminderType::Screening),
        "custom" => Ok(ReminderType::Custom),
        "water" => Ok(ReminderType::Water),
        _ => bail!("Invalid reminder type '{s}'. Use medicine, screening, custom, or water"),
    }
}

pub(crate) fn parse_frequency(s: &str) -> Result<ReminderFrequency> {
    match normalize(s).as_str() {
        "daily" => Ok(ReminderFrequency::Daily),
        "weekly" => Ok(ReminderFrequency::Weekly),
        "once" => Ok(ReminderFrequency::Once),
        _ => bail!("Invalid frequency '{s}'. Use daily, weekly, or once"),
    }
}

/// All three percentages or none.
pub(crate) fn parse_macro_ratio(
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
) -> Result<Option<MacroRatio>> {
    match (protein, carbs, fat) {
        (None, None, None) => Ok(None),
        (Some(p), Some(c), Some(f)) => {
            let ratio = MacroRatio { p, c, f };
            validate_macro_ratio(&ratio)?;
            Ok(Some(ratio))
        }
        _ => bail!(
            "If setting macro percentages, all three (--protein, --carbs, --fat) must be provided"
        ),
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_parse_enums_are_forgiving() {
        assert_eq!(parse_goal("Weight Loss").unwrap(), PrimaryGoal::WeightLoss);
        assert_eq!(parse_goal("muscle_gain").unwrap(), PrimaryGoal::MuscleGain);
        assert_eq!(parse_activity(" ACTIVE ").unwrap(), ActivityLevel::Active);
        assert_eq!(parse_gender("f").unwrap(), Gender::Female);
        assert_eq!(parse_reminder_type("med").unwrap(), ReminderType::Medicine);
        assert_eq!(parse_frequency("weekly").unwrap(), ReminderFrequency::Weekly);
        assert_eq!(parse_diet("Vegan").unwrap(), DietaryType::Vegan);
        assert!(parse_goal("bulk").is_err());
    }

    #[test]
    fn test_parse_macro_ratio() {
        assert!(parse_macro_ratio(None, None, None).unwrap().is_none());
        let ratio = parse_macro_ratio(Some(30.0), Some(45.0), Some(25.0))
            .unwrap()
            .unwrap();
        assert!((ratio.p - 30.0).abs() < f64::EPSILON);
        assert!(parse_macro_ratio(Some(30.0), None, None).is_err());
        assert!(parse_macro_ratio(Some(50.0), Some(50.0), Some(50.0)).is_err());
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }
}
