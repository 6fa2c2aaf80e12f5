use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Modify, Style, Width, object::Columns},
};

use vitality_core::SyncEngine;
use vitality_core::models::{Reminder, validate_reminder};

use super::helpers::{parse_date, parse_frequency, parse_reminder_type, print_json, truncate};

pub(crate) struct NewReminder {
    pub kind: String,
    pub title: String,
    pub date: Option<String>,
    pub time: String,
    pub frequency: Option<String>,
    pub dosage: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

pub(crate) async fn cmd_reminder_add(
    engine: &SyncEngine,
    new: NewReminder,
    json: bool,
) -> Result<()> {
    let mut reminder = Reminder::new(
        parse_reminder_type(&new.kind)?,
        &new.title,
        parse_date(new.date)?,
        &new.time,
    );
    reminder.frequency = new.frequency.as_deref().map(parse_frequency).transpose()?;
    reminder.dosage = new.dosage;
    reminder.location = new.location;
    reminder.notes = new.notes;
    validate_reminder(&reminder)?;

    let added = reminder.clone();
    engine.update_profile(|p| p.add_reminder(reminder)).await?;

    if json {
        print_json(&added)
    } else {
        println!(
            "Added {:?} reminder '{}' at {} ({})",
            added.kind, added.title, added.time, added.id
        );
        Ok(())
    }
}

pub(crate) async fn cmd_reminder_list(
    engine: &SyncEngine,
    date: Option<String>,
    all: bool,
    json: bool,
) -> Result<()> {
    let profile = engine.load_profile().await?;
    if profile.is_onboarding_placeholder() {
        bail!("No profile yet. Use `vitality profile init` to create one");
    }

    let day = parse_date(date)?;
    let reminders: Vec<&Reminder> = if all {
        profile.reminders.iter().collect()
    } else {
        profile.reminders_on(day)
    };

    if json {
        return print_json(&reminders);
    }
    if reminders.is_empty() {
        if all {
            eprintln!("No reminders. Use `vitality profile reminder add` to create one.");
        } else {
            eprintln!("No reminders for {}", day.format("%Y-%m-%d"));
        }
        return Ok(());
    }

    #[derive(Tabled)]
    struct ReminderRow {
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Repeats")]
        frequency: String,
        #[tabled(rename = "Done")]
        done: String,
        #[tabled(rename = "ID")]
        id: String,
    }

    let rows: Vec<ReminderRow> = reminders
        .iter()
        .map(|r| ReminderRow {
            time: r.time.clone(),
            kind: format!("{:?}", r.kind),
            title: truncate(&r.title, 30),
            frequency: r
                .frequency
                .map_or_else(|| "Once".to_string(), |f| format!("{f:?}")),
            done: if r.completed { "yes" } else { "" }.to_string(),
            id: r.id.clone(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(5)).with(Width::truncate(8)))
        .to_string();
    println!("{table}");
    Ok(())
}

/// Accepts a full id or any unique prefix of one.
fn resolve_reminder_id(reminders: &[Reminder], id: &str) -> Result<String> {
    let matches: Vec<&Reminder> = reminders.iter().filter(|r| r.id.starts_with(id)).collect();
    match matches.as_slice() {
        [one] => Ok(one.id.clone()),
        [] => bail!("Reminder '{id}' not found"),
        _ => bail!("Reminder id '{id}' is ambiguous; use more characters"),
    }
}

pub(crate) async fn cmd_reminder_toggle(engine: &SyncEngine, id: &str, json: bool) -> Result<()> {
    let mut completed = false;
    let profile = engine
        .update_profile(|p| {
            let full_id = resolve_reminder_id(&p.reminders, id)?;
            completed = p.toggle_reminder(&full_id)?;
            Ok(())
        })
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "id": id, "completed": completed, "reminders": profile.reminders.len() })
        );
    } else if completed {
        println!("Reminder marked done");
    } else {
        println!("Reminder marked not done");
    }
    Ok(())
}

pub(crate) async fn cmd_reminder_remove(engine: &SyncEngine, id: &str, json: bool) -> Result<()> {
    engine
        .update_profile(|p| {
            let full_id = resolve_reminder_id(&p.reminders, id)?;
            p.remove_reminder(&full_id);
            Ok(())
        })
        .await?;

    if json {
        println!("{}", serde_json::json!({ "removed": true }));
    } else {
        println!("Reminder removed");
    }
    Ok(())
}
