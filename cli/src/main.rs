mod commands;
mod config;
mod remote_client;
mod server;
mod session;

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{
    MealInput, NewReminder, ProfileInit, ProfileUpdate, cmd_login, cmd_logout,
    cmd_profile_init, cmd_profile_set, cmd_profile_show, cmd_progress_activity,
    cmd_progress_history, cmd_progress_meal, cmd_progress_show, cmd_progress_water,
    cmd_reminder_add, cmd_reminder_list, cmd_reminder_remove, cmd_reminder_toggle, cmd_whoami,
};
use crate::config::Config;
use crate::remote_client::{HttpRemoteStore, NoRemote};
use crate::session::FileSession;
use vitality_core::db::Database;
use vitality_core::{IdentityRef, RemoteStore, SessionContext, SyncEngine};

#[derive(Parser)]
#[command(
    name = "vitality",
    version,
    about = "A local-first nutrition and daily-progress tracker",
    long_about = "A local-first nutrition and daily-progress tracker.\n\n\
        Everything is saved on this device first. When you are signed in and a\n\
        remote_url is set in config.json, changes are also synced to your server."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or edit your profile, goals and reminders
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Daily progress: meals, water, activity
    Progress {
        #[command(subcommand)]
        command: ProgressCommands,
    },
    /// Record a credential for an identity so data syncs to the remote
    Login {
        /// Identity issued by your server (e.g. a user id)
        identity: String,
        /// Bearer token (the server's API key)
        #[arg(long)]
        token: String,
        #[arg(long)]
        email: Option<String>,
        /// Treat the token as expired after this many hours
        #[arg(long)]
        expires_in_hours: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the stored credential
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show who is signed in and where data syncs to
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Host the remote document store over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the current profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create your profile (onboarding)
    Init {
        #[command(flatten)]
        fields: ProfileInit,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change profile fields
    Set {
        #[command(flatten)]
        fields: ProfileUpdate,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage reminders
    Reminder {
        #[command(subcommand)]
        command: ReminderCommands,
    },
}

#[derive(Subcommand)]
enum ReminderCommands {
    /// Add a reminder
    Add {
        /// Reminder title
        title: String,
        /// Time of day (HH:MM, 24h)
        #[arg(long)]
        time: String,
        /// medicine, screening, custom, water
        #[arg(short = 't', long = "type", default_value = "custom")]
        kind: String,
        /// First (or only) date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// daily, weekly, once
        #[arg(long)]
        frequency: Option<String>,
        #[arg(long)]
        dosage: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List reminders due on a day
    List {
        /// Day to check (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// List every reminder regardless of date
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a reminder done or not done
    Toggle {
        /// Reminder ID (or a unique prefix)
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a reminder
    Remove {
        /// Reminder ID (or a unique prefix)
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProgressCommands {
    /// Show progress for a day
    Show {
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a meal
    Meal {
        /// Meal name
        name: String,
        /// Calories (kcal)
        #[arg(long)]
        calories: f64,
        /// Protein (g)
        #[arg(long, default_value = "0")]
        protein: f64,
        /// Carbs (g)
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Fat (g)
        #[arg(long, default_value = "0")]
        fat: f64,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add water intake
    Water {
        /// Amount in ml
        ml: f64,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record steps and calories burned (daily totals from a tracker)
    Activity {
        #[arg(long, default_value = "0")]
        steps: u64,
        /// Calories burned (kcal)
        #[arg(long, default_value = "0")]
        burned: f64,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent days, newest first
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// The engine plus the identity it runs as (None when signed out).
fn build_engine(config: &Config) -> Result<(SyncEngine, Option<IdentityRef>)> {
    let local = Database::open(&config.db_path)?;
    let session = FileSession::load(&config.session_path)?;
    let options = config.sync_options();

    let (remote, session): (Arc<dyn RemoteStore>, FileSession) =
        match config.settings.remote_url.as_deref() {
            Some(url) => {
                let token = session.token().map(str::to_string);
                let remote = HttpRemoteStore::new(url, token, options.remote_timeout)?;
                (Arc::new(remote), session)
            }
            None => (Arc::new(NoRemote), session.local_only()),
        };

    let identity = session.current_identity();
    tracing::debug!(?identity, remote = session.is_authenticated(), "sync engine ready");

    let engine = SyncEngine::new(Box::new(local), remote, Arc::new(session)).with_options(options);
    Ok((engine, identity))
}

async fn run_profile(
    engine: &SyncEngine,
    identity: Option<IdentityRef>,
    command: ProfileCommands,
) -> Result<()> {
    match command {
        ProfileCommands::Show { json } => cmd_profile_show(engine, json).await,
        ProfileCommands::Init { fields, json } => {
            cmd_profile_init(engine, identity, fields, json).await
        }
        ProfileCommands::Set { fields, json } => cmd_profile_set(engine, fields, json).await,
        ProfileCommands::Reminder { command } => match command {
            ReminderCommands::Add {
                title,
                time,
                kind,
                date,
                frequency,
                dosage,
                location,
                notes,
                json,
            } => {
                let new = NewReminder {
                    kind,
                    title,
                    date,
                    time,
                    frequency,
                    dosage,
                    location,
                    notes,
                };
                cmd_reminder_add(engine, new, json).await
            }
            ReminderCommands::List { date, all, json } => {
                cmd_reminder_list(engine, date, all, json).await
            }
            ReminderCommands::Toggle { id, json } => cmd_reminder_toggle(engine, &id, json).await,
            ReminderCommands::Remove { id, json } => cmd_reminder_remove(engine, &id, json).await,
        },
    }
}

async fn run_progress(engine: &SyncEngine, command: ProgressCommands) -> Result<()> {
    match command {
        ProgressCommands::Show { date, json } => cmd_progress_show(engine, date, json).await,
        ProgressCommands::Meal {
            name,
            calories,
            protein,
            carbs,
            fat,
            date,
            json,
        } => {
            let meal = MealInput {
                name,
                calories,
                protein,
                carbs,
                fat,
            };
            cmd_progress_meal(engine, meal, date, json).await
        }
        ProgressCommands::Water { ml, date, json } => {
            cmd_progress_water(engine, ml, date, json).await
        }
        ProgressCommands::Activity {
            steps,
            burned,
            date,
            json,
        } => cmd_progress_activity(engine, steps, burned, date, json).await,
        ProgressCommands::History { days, json } => {
            cmd_progress_history(engine, days, json).await
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Profile { command } => {
            let (engine, identity) = build_engine(&config)?;
            let result = run_profile(&engine, identity, command).await;
            // Detached remote writes must land before the process exits.
            engine.flush().await;
            result
        }
        Commands::Progress { command } => {
            let (engine, _) = build_engine(&config)?;
            let result = run_progress(&engine, command).await;
            engine.flush().await;
            result
        }
        Commands::Login {
            identity,
            token,
            email,
            expires_in_hours,
            json,
        } => cmd_login(&config, &identity, &token, email, expires_in_hours, json),
        Commands::Logout { json } => cmd_logout(&config, json),
        Commands::Whoami { json } => {
            let session = FileSession::load(&config.session_path)?;
            cmd_whoami(&config, &session, json)
        }
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?.0)
            };
            let db = Database::open(&config.server_db_path)?;
            server::start_server(db, port, &bind, api_key).await
        }
    }
}
