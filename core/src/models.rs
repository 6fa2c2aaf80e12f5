use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Allowed drift when the three macro percentages are summed.
pub const MACRO_SUM_TOLERANCE: f64 = 1.0;

/// Water goal assumed when a profile has none set.
pub const DEFAULT_WATER_TARGET_ML: u32 = 2500;

// --- Profile ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    Athlete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryGoal {
    #[serde(rename = "Weight Loss")]
    WeightLoss,
    Maintenance,
    #[serde(rename = "Muscle Gain")]
    MuscleGain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DietaryType {
    Omnivore,
    Vegetarian,
    Vegan,
    Keto,
    Paleo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biometrics {
    pub age: u32,
    /// kg
    pub weight: f64,
    /// cm
    pub height: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroRatio {
    pub p: f64,
    pub c: f64,
    pub f: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goals {
    pub primary: PrimaryGoal,
    #[serde(default)]
    pub target_weight: Option<f64>,
    pub daily_calories: u32,
    /// ml
    #[serde(default)]
    pub daily_water: Option<u32>,
    pub macro_ratio: MacroRatio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub allergies: Vec<String>,
    pub dietary_type: DietaryType,
    #[serde(default)]
    pub excluded_ingredients: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderType {
    Medicine,
    Screening,
    Custom,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderFrequency {
    Daily,
    Weekly,
    Once,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ReminderType,
    pub title: String,
    pub date: NaiveDate,
    /// "HH:MM", 24h
    pub time: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<ReminderFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Reminder {
    #[must_use]
    pub fn new(kind: ReminderType, title: &str, date: NaiveDate, time: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.to_string(),
            date,
            time: time.to_string(),
            completed: false,
            dosage: None,
            frequency: None,
            location: None,
            notes: None,
        }
    }

    /// Whether the reminder fires on `day`.
    #[must_use]
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        match self.frequency {
            None | Some(ReminderFrequency::Once) => self.date == day,
            Some(_) if day < self.date => false,
            Some(ReminderFrequency::Daily) => true,
            Some(ReminderFrequency::Weekly) => day.weekday() == self.date.weekday(),
        }
    }
}

/// One record per identity. An empty `id` marks the "needs onboarding" sentinel.
///
/// Unset optionals serialize as `null` so a merge-write clears them remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub biometrics: Biometrics,
    pub goals: Goals,
    pub preferences: Preferences,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl Profile {
    /// Placeholder returned when no profile exists anywhere yet.
    #[must_use]
    pub fn needs_onboarding() -> Self {
        Self {
            id: String::new(),
            email: None,
            name: String::new(),
            avatar_url: None,
            biometrics: Biometrics {
                age: 0,
                weight: 0.0,
                height: 0.0,
                gender: Gender::Other,
                activity_level: ActivityLevel::Moderate,
            },
            goals: Goals {
                primary: PrimaryGoal::Maintenance,
                target_weight: None,
                daily_calories: 0,
                daily_water: None,
                macro_ratio: MacroRatio {
                    p: 30.0,
                    c: 40.0,
                    f: 30.0,
                },
            },
            preferences: Preferences {
                allergies: Vec::new(),
                dietary_type: DietaryType::Omnivore,
                excluded_ingredients: Vec::new(),
            },
            reminders: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_onboarding_placeholder(&self) -> bool {
        self.id.is_empty()
    }

    #[must_use]
    pub fn water_target_ml(&self) -> u32 {
        self.goals.daily_water.unwrap_or(DEFAULT_WATER_TARGET_ML)
    }

    pub fn add_reminder(&mut self, reminder: Reminder) -> Result<()> {
        if self.reminders.iter().any(|r| r.id == reminder.id) {
            bail!("Reminder '{}' already exists", reminder.id);
        }
        validate_reminder(&reminder)?;
        self.reminders.push(reminder);
        Ok(())
    }

    /// Flip the completed flag; returns the new state.
    pub fn toggle_reminder(&mut self, id: &str) -> Result<bool> {
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .with_context(|| format!("Reminder '{id}' not found"))?;
        reminder.completed = !reminder.completed;
        Ok(reminder.completed)
    }

    pub fn remove_reminder(&mut self, id: &str) -> bool {
        let before = self.reminders.len();
        self.reminders.retain(|r| r.id != id);
        self.reminders.len() != before
    }

    /// Reminders that fire on `day`, earliest first.
    #[must_use]
    pub fn reminders_on(&self, day: NaiveDate) -> Vec<&Reminder> {
        let mut active: Vec<&Reminder> = self
            .reminders
            .iter()
            .filter(|r| r.is_active_on(day))
            .collect();
        active.sort_by(|a, b| a.time.cmp(&b.time));
        active
    }
}

// --- Daily progress ---

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroTotals {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealLogEntry {
    pub id: String,
    pub name: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl MealLogEntry {
    #[must_use]
    pub fn new(name: &str, calories: f64, protein: f64, carbs: f64, fats: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            calories,
            protein,
            carbs,
            fats,
        }
    }
}

/// Accumulators for one (identity, calendar date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,
    #[serde(default)]
    pub calories_consumed: f64,
    #[serde(default)]
    pub calories_burned: f64,
    #[serde(default)]
    pub steps: u64,
    #[serde(default)]
    pub water_ml: f64,
    #[serde(default)]
    pub macros: MacroTotals,
    #[serde(default)]
    pub meals: Vec<MealLogEntry>,
}

impl DailyProgress {
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            calories_consumed: 0.0,
            calories_burned: 0.0,
            steps: 0,
            water_ml: 0.0,
            macros: MacroTotals::default(),
            meals: Vec::new(),
        }
    }

    pub fn log_meal(&mut self, entry: MealLogEntry) -> Result<()> {
        validate_meal_log_entry(&entry)?;
        self.calories_consumed += entry.calories;
        self.macros.protein += entry.protein;
        self.macros.carbs += entry.carbs;
        self.macros.fats += entry.fats;
        self.meals.push(entry);
        Ok(())
    }

    pub fn add_water(&mut self, ml: f64) -> Result<()> {
        if !ml.is_finite() || ml < 0.0 {
            bail!("Water amount must be a non-negative number (got {ml})");
        }
        self.water_ml += ml;
        Ok(())
    }

    /// Health readings are absolute daily totals, so the stored values only
    /// move up.
    pub fn record_activity(&mut self, steps: u64, calories_burned: f64) -> Result<()> {
        if !calories_burned.is_finite() || calories_burned < 0.0 {
            bail!("calories_burned must be a non-negative number (got {calories_burned})");
        }
        self.steps = self.steps.max(steps);
        self.calories_burned = self.calories_burned.max(calories_burned);
        Ok(())
    }

    #[must_use]
    pub fn calories_remaining(&self, profile: &Profile) -> f64 {
        f64::from(profile.goals.daily_calories) - self.calories_consumed
    }
}

// --- Validation ---

fn check_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        bail!("{field} must be greater than 0 (got {value})");
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        bail!("{field} must not be negative (got {value})");
    }
    Ok(())
}

pub fn validate_macro_ratio(ratio: &MacroRatio) -> Result<()> {
    for (name, pct) in [("p", ratio.p), ("c", ratio.c), ("f", ratio.f)] {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            bail!("Macro ratio '{name}' must be between 0 and 100 (got {pct})");
        }
    }
    let sum = ratio.p + ratio.c + ratio.f;
    if (sum - 100.0).abs() > MACRO_SUM_TOLERANCE {
        bail!("Macro ratio must sum to 100 (got {sum})");
    }
    Ok(())
}

pub fn validate_reminder(reminder: &Reminder) -> Result<()> {
    if reminder.id.trim().is_empty() {
        bail!("Reminder id must not be empty");
    }
    if reminder.title.trim().is_empty() {
        bail!("Reminder title must not be empty");
    }
    NaiveTime::parse_from_str(&reminder.time, "%H:%M").map_err(|_| {
        anyhow::anyhow!(
            "Invalid reminder time '{}'. Must be HH:MM (24h)",
            reminder.time
        )
    })?;
    Ok(())
}

/// Validate a profile before it is persisted anywhere.
pub fn validate_profile(profile: &Profile) -> Result<()> {
    if profile.id.trim().is_empty() {
        bail!("Profile id must not be empty");
    }
    if profile.name.trim().is_empty() {
        bail!("Profile name must not be empty");
    }

    let bio = &profile.biometrics;
    if bio.age == 0 {
        bail!("age must be greater than 0");
    }
    check_positive("weight", bio.weight)?;
    check_positive("height", bio.height)?;

    let goals = &profile.goals;
    if goals.daily_calories == 0 {
        bail!("dailyCalories must be greater than 0");
    }
    if let Some(target) = goals.target_weight {
        check_positive("targetWeight", target)?;
    }
    if goals.daily_water == Some(0) {
        bail!("dailyWater must be greater than 0 when set");
    }
    validate_macro_ratio(&goals.macro_ratio)?;

    for (i, reminder) in profile.reminders.iter().enumerate() {
        validate_reminder(reminder)?;
        if profile.reminders[..i].iter().any(|r| r.id == reminder.id) {
            bail!("Duplicate reminder id '{}'", reminder.id);
        }
    }
    Ok(())
}

fn validate_meal_log_entry(entry: &MealLogEntry) -> Result<()> {
    if entry.id.trim().is_empty() {
        bail!("Meal id must not be empty");
    }
    if entry.name.trim().is_empty() {
        bail!("Meal name must not be empty");
    }
    check_non_negative("meal calories", entry.calories)?;
    check_non_negative("meal protein", entry.protein)?;
    check_non_negative("meal carbs", entry.carbs)?;
    check_non_negative("meal fats", entry.fats)?;
    Ok(())
}

pub fn validate_progress(progress: &DailyProgress) -> Result<()> {
    check_non_negative("caloriesConsumed", progress.calories_consumed)?;
    check_non_negative("caloriesBurned", progress.calories_burned)?;
    check_non_negative("waterMl", progress.water_ml)?;
    check_non_negative("macros.protein", progress.macros.protein)?;
    check_non_negative("macros.carbs", progress.macros.carbs)?;
    check_non_negative("macros.fats", progress.macros.fats)?;
    for entry in &progress.meals {
        validate_meal_log_entry(entry)?;
    }
    Ok(())
}

// --- Document boundary ---

/// Parse a schema-free document into a validated profile.
pub fn profile_from_value(value: Value) -> Result<Profile> {
    let profile: Profile =
        serde_json::from_value(value).context("Profile document does not match schema")?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Parse a schema-free document into validated progress. Legacy documents
/// carrying `macros.calories` are accepted; the key is dropped.
pub fn progress_from_value(value: Value) -> Result<DailyProgress> {
    let progress: DailyProgress =
        serde_json::from_value(value).context("Progress document does not match schema")?;
    validate_progress(&progress)?;
    Ok(progress)
}

pub fn profile_from_slice(bytes: &[u8]) -> Result<Profile> {
    let value: Value = serde_json::from_slice(bytes).context("Stored profile is not JSON")?;
    profile_from_value(value)
}

pub fn progress_from_slice(bytes: &[u8]) -> Result<DailyProgress> {
    let value: Value = serde_json::from_slice(bytes).context("Stored progress is not JSON")?;
    progress_from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_profile() -> Profile {
        Profile {
            id: "u_12345".to_string(),
            email: Some("alex@example.com".to_string()),
            name: "Alex Sterling".to_string(),
            avatar_url: None,
            biometrics: Biometrics {
                age: 28,
                weight: 78.0,
                height: 180.0,
                gender: Gender::Male,
                activity_level: ActivityLevel::Active,
            },
            goals: Goals {
                primary: PrimaryGoal::MuscleGain,
                target_weight: Some(82.0),
                daily_calories: 2600,
                daily_water: Some(3000),
                macro_ratio: MacroRatio {
                    p: 30.0,
                    c: 45.0,
                    f: 25.0,
                },
            },
            preferences: Preferences {
                allergies: vec!["Shellfish".to_string()],
                dietary_type: DietaryType::Omnivore,
                excluded_ingredients: vec!["Cilantro".to_string()],
            },
            reminders: vec![],
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_valid_profile() {
        assert!(validate_profile(&sample_profile()).is_ok());
    }

    #[test]
    fn test_profile_requires_positive_biometrics() {
        let mut p = sample_profile();
        p.biometrics.weight = 0.0;
        assert!(validate_profile(&p).is_err());

        let mut p = sample_profile();
        p.biometrics.age = 0;
        assert!(validate_profile(&p).is_err());

        let mut p = sample_profile();
        p.biometrics.height = f64::NAN;
        assert!(validate_profile(&p).is_err());
    }

    #[test]
    fn test_profile_rejects_zero_calorie_goal() {
        let mut p = sample_profile();
        p.goals.daily_calories = 0;
        assert!(validate_profile(&p).is_err());
    }

    #[test]
    fn test_sentinel_is_not_persistable() {
        let sentinel = Profile::needs_onboarding();
        assert!(sentinel.is_onboarding_placeholder());
        assert!(validate_profile(&sentinel).is_err());
    }

    #[test]
    fn test_macro_ratio_tolerance() {
        let ok = MacroRatio {
            p: 33.3,
            c: 33.3,
            f: 33.3,
        };
        assert!(validate_macro_ratio(&ok).is_ok());

        let off = MacroRatio {
            p: 40.0,
            c: 30.0,
            f: 20.0,
        };
        assert!(validate_macro_ratio(&off).is_err());

        let negative = MacroRatio {
            p: -10.0,
            c: 60.0,
            f: 50.0,
        };
        assert!(validate_macro_ratio(&negative).is_err());
    }

    #[test]
    fn test_profile_document_uses_camel_case_keys() {
        let value = serde_json::to_value(sample_profile()).unwrap();
        assert_eq!(value["goals"]["primary"], "Muscle Gain");
        assert_eq!(value["goals"]["dailyCalories"], 2600);
        assert_eq!(value["biometrics"]["activityLevel"], "Active");
        assert_eq!(value["preferences"]["excludedIngredients"][0], "Cilantro");
    }

    #[test]
    fn test_cleared_optionals_serialize_as_null() {
        let mut p = sample_profile();
        p.email = None;
        p.goals.target_weight = None;
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["email"], Value::Null);
        assert_eq!(value["goals"]["targetWeight"], Value::Null);
        assert_eq!(profile_from_value(value).unwrap(), p);
    }

    #[test]
    fn test_profile_from_value_rejects_bad_enum() {
        let mut value = serde_json::to_value(sample_profile()).unwrap();
        value["preferences"]["dietaryType"] = json!("Carnivore");
        let err = profile_from_value(value).unwrap_err();
        assert!(format!("{err:#}").contains("does not match schema"));
    }

    #[test]
    fn test_profile_from_value_rejects_invalid_values() {
        let mut value = serde_json::to_value(sample_profile()).unwrap();
        value["goals"]["macroRatio"] = json!({ "p": 50, "c": 50, "f": 50 });
        assert!(profile_from_value(value).is_err());
    }

    #[test]
    fn test_reminder_toggle_and_remove() {
        let mut p = sample_profile();
        let reminder = Reminder::new(ReminderType::Medicine, "Vitamin D", date("2024-05-01"), "08:00");
        let id = reminder.id.clone();
        p.add_reminder(reminder.clone()).unwrap();
        assert!(p.add_reminder(reminder).is_err());

        assert!(p.toggle_reminder(&id).unwrap());
        assert!(!p.toggle_reminder(&id).unwrap());
        assert!(p.toggle_reminder("missing").is_err());

        assert!(p.remove_reminder(&id));
        assert!(!p.remove_reminder(&id));
    }

    #[test]
    fn test_reminder_rejects_bad_time() {
        let mut p = sample_profile();
        let reminder = Reminder::new(ReminderType::Water, "Drink", date("2024-05-01"), "25:00");
        assert!(p.add_reminder(reminder).is_err());
    }

    #[test]
    fn test_reminder_active_once() {
        let r = Reminder::new(ReminderType::Screening, "Checkup", date("2024-05-01"), "10:00");
        assert!(r.is_active_on(date("2024-05-01")));
        assert!(!r.is_active_on(date("2024-05-02")));
    }

    #[test]
    fn test_reminder_active_daily_and_weekly() {
        let mut daily = Reminder::new(ReminderType::Water, "Water", date("2024-05-01"), "09:00");
        daily.frequency = Some(ReminderFrequency::Daily);
        assert!(!daily.is_active_on(date("2024-04-30")));
        assert!(daily.is_active_on(date("2024-05-20")));

        // 2024-05-01 is a Wednesday
        let mut weekly = daily.clone();
        weekly.frequency = Some(ReminderFrequency::Weekly);
        assert!(weekly.is_active_on(date("2024-05-08")));
        assert!(!weekly.is_active_on(date("2024-05-09")));
    }

    #[test]
    fn test_reminders_on_sorted_by_time() {
        let mut p = sample_profile();
        p.add_reminder(Reminder::new(ReminderType::Custom, "Late", date("2024-05-01"), "21:00"))
            .unwrap();
        p.add_reminder(Reminder::new(ReminderType::Custom, "Early", date("2024-05-01"), "07:30"))
            .unwrap();
        p.add_reminder(Reminder::new(ReminderType::Custom, "Other day", date("2024-05-02"), "06:00"))
            .unwrap();

        let titles: Vec<&str> = p
            .reminders_on(date("2024-05-01"))
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Early", "Late"]);
    }

    #[test]
    fn test_log_meal_accumulates() {
        let mut progress = DailyProgress::empty(date("2024-05-01"));
        progress
            .log_meal(MealLogEntry::new("Oats", 450.0, 18.0, 60.0, 9.0))
            .unwrap();
        progress
            .log_meal(MealLogEntry::new("Chicken bowl", 620.0, 45.0, 70.0, 14.0))
            .unwrap();

        assert!((progress.calories_consumed - 1070.0).abs() < f64::EPSILON);
        assert!((progress.macros.protein - 63.0).abs() < f64::EPSILON);
        assert_eq!(progress.meals.len(), 2);
    }

    #[test]
    fn test_log_meal_rejects_negative() {
        let mut progress = DailyProgress::empty(date("2024-05-01"));
        assert!(
            progress
                .log_meal(MealLogEntry::new("Refund", -100.0, 0.0, 0.0, 0.0))
                .is_err()
        );
        assert!(progress.meals.is_empty());
        assert!(progress.calories_consumed.abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_water_rejects_negative() {
        let mut progress = DailyProgress::empty(date("2024-05-01"));
        progress.add_water(250.0).unwrap();
        assert!(progress.add_water(-250.0).is_err());
        assert!((progress.water_ml - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_activity_never_decreases() {
        let mut progress = DailyProgress::empty(date("2024-05-01"));
        progress.record_activity(5000, 210.0).unwrap();
        progress.record_activity(3000, 100.0).unwrap();
        assert_eq!(progress.steps, 5000);
        assert!((progress.calories_burned - 210.0).abs() < f64::EPSILON);

        progress.record_activity(8000, 330.0).unwrap();
        assert_eq!(progress.steps, 8000);
    }

    #[test]
    fn test_progress_from_value_ignores_macro_calories() {
        let value = json!({
            "date": "2024-05-01",
            "caloriesConsumed": 450,
            "caloriesBurned": 0,
            "steps": 0,
            "waterMl": 0,
            "macros": { "calories": 450, "protein": 18, "carbs": 60, "fats": 9 }
        });
        let progress = progress_from_value(value).unwrap();
        assert!((progress.calories_consumed - 450.0).abs() < f64::EPSILON);
        assert!(progress.meals.is_empty());

        let back = serde_json::to_value(&progress).unwrap();
        assert!(back["macros"].get("calories").is_none());
    }

    #[test]
    fn test_progress_from_value_rejects_bad_date() {
        let value = json!({ "date": "05/01/2024", "caloriesConsumed": 0 });
        assert!(progress_from_value(value).is_err());
    }

    #[test]
    fn test_calories_remaining() {
        let mut progress = DailyProgress::empty(date("2024-05-01"));
        progress
            .log_meal(MealLogEntry::new("Lunch", 600.0, 30.0, 50.0, 20.0))
            .unwrap();
        assert!((progress.calories_remaining(&sample_profile()) - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_water_target_default() {
        let mut p = sample_profile();
        assert_eq!(p.water_target_ml(), 3000);
        p.goals.daily_water = None;
        assert_eq!(p.water_target_ml(), DEFAULT_WATER_TARGET_ML);
    }
}
