use anyhow::{Result, bail};
use chrono::{Duration, Utc};

use vitality_core::SessionContext;

use crate::config::Config;
use crate::session::{Credential, FileSession};

pub(crate) fn cmd_login(
    config: &Config,
    identity: &str,
    token: &str,
    email: Option<String>,
    expires_in_hours: Option<i64>,
    json: bool,
) -> Result<()> {
    if identity.trim().is_empty() || identity.contains('/') {
        bail!("Invalid identity '{identity}'");
    }
    if token.trim().is_empty() {
        bail!("Token must not be empty");
    }
    if expires_in_hours.is_some_and(|h| h <= 0) {
        bail!("--expires-in-hours must be greater than 0");
    }

    let credential = Credential {
        identity: identity.to_string(),
        token: token.to_string(),
        email,
        expires_at: expires_in_hours.map(|h| Utc::now() + Duration::hours(h)),
    };
    FileSession::store(&config.session_path, &credential)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "identity": identity, "expires_at": credential.expires_at })
        );
    } else {
        println!("Signed in as {identity}");
        if config.settings.remote_url.is_none() {
            eprintln!("Note: no remote_url in config.json; data stays on this device.");
        }
    }
    Ok(())
}

pub(crate) fn cmd_logout(config: &Config, json: bool) -> Result<()> {
    let removed = FileSession::clear(&config.session_path)?;
    if json {
        println!("{}", serde_json::json!({ "signed_out": removed }));
    } else if removed {
        println!("Signed out");
    } else {
        eprintln!("Not signed in");
    }
    Ok(())
}

pub(crate) fn cmd_whoami(config: &Config, session: &FileSession, json: bool) -> Result<()> {
    let remote = config.settings.remote_url.as_deref();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "identity": session.current_identity(),
                "authenticated": session.is_authenticated(),
                "expires_at": session.credential().and_then(|c| c.expires_at),
                "remote_url": remote,
            })
        );
        return Ok(());
    }

    match session.credential() {
        None => println!("Not signed in (data is stored for this device only)"),
        Some(c) => {
            println!("Identity:  {}", c.identity);
            if let Some(ref email) = c.email {
                println!("Email:     {email}");
            }
            if c.is_expired() {
                println!("Session:   expired, working offline until you sign in again");
            } else if let Some(at) = c.expires_at {
                println!("Session:   valid until {}", at.format("%Y-%m-%d %H:%M UTC"));
            } else {
                println!("Session:   valid");
            }
        }
    }
    println!("Remote:    {}", remote.unwrap_or("none (local only)"));
    Ok(())
}
