//! CLI subcommand: `agentforge secrets`

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::{Outcome, print_json};
use crate::config::Config;
use crate::security::{DEFAULT_WARNING_DAYS, DueItem, NewSecret, Toolkit};

#[derive(Args)]
pub struct SecretsArgs {
    #[command(subcommand)]
    pub command: SecretsCommands,
}

#[derive(Subcommand)]
pub enum SecretsCommands {
    /// Start tracking a secret (name and location only, never the value)
    Add {
        name: String,

        /// api_key | oauth_token | password | ssh_key | database_url |
        /// webhook_secret | encryption_key | other
        #[arg(short = 't', long = "type")]
        secret_type: String,

        #[arg(short, long)]
        service: Option<String>,

        /// Where the secret lives (file, vault path, ...)
        #[arg(short, long)]
        location: Option<String>,

        /// Creation date, YYYY-MM-DD (default: today)
        #[arg(long)]
        created: Option<String>,

        /// Rotation period in days (default: per type)
        #[arg(short, long)]
        rotation_days: Option<u32>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Record a rotation today
    Rotate {
        name: String,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show overdue and upcoming rotations
    Check {
        /// Warn this many days ahead
        #[arg(short, long, default_value_t = DEFAULT_WARNING_DAYS)]
        warning_days: i64,

        #[arg(long)]
        json: bool,
    },

    /// List tracked secrets
    List {
        /// Include deactivated secrets
        #[arg(short, long)]
        all: bool,
    },

    /// Show rotation history for a secret
    History { name: String },

    /// Stop tracking a secret
    Deactivate { name: String },
}

pub fn run(args: SecretsArgs, config: &Config) -> Result<Outcome> {
    let kit = Toolkit::open(config)?;
    let tracker = &kit.secrets;

    match args.command {
        SecretsCommands::Add {
            name,
            secret_type,
            service,
            location,
            created,
            rotation_days,
            notes,
        } => {
            let mut secret = NewSecret::new(name, secret_type.parse()?);
            secret.service = service;
            secret.location = location;
            secret.rotation_days = rotation_days;
            secret.notes = notes;
            if let Some(date) = created {
                secret.created = Some(
                    NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?,
                );
            }
            let name = secret.name.clone();
            tracker.add_secret(secret)?;
            println!("Tracking {}", name);
        }
        SecretsCommands::Rotate { name, notes } => {
            let date = tracker.rotate_secret(&name, notes.as_deref())?;
            println!("Rotated {} on {}", name, date);
        }
        SecretsCommands::Check { warning_days, json } => {
            let status = tracker.check_due(warning_days)?;
            if json {
                print_json(&status)?;
            } else {
                print_bucket("OVERDUE", &status.overdue);
                print_bucket("UPCOMING", &status.upcoming);
                println!("{} healthy", status.healthy.len());
            }
            if !status.overdue.is_empty() {
                return Ok(Outcome::Fail);
            }
        }
        SecretsCommands::List { all } => {
            let secrets = tracker.list(all)?;
            if secrets.is_empty() {
                println!("No secrets tracked.");
            }
            for s in secrets {
                println!(
                    "{:<24} {:<15} rotated {} every {}d{}",
                    s.name,
                    s.secret_type,
                    s.last_rotated,
                    s.rotation_days,
                    if s.is_active { "" } else { " (inactive)" }
                );
                if let Some(location) = &s.location {
                    println!("  at {}", location);
                }
            }
        }
        SecretsCommands::History { name } => {
            let records = tracker.history(&name)?;
            if records.is_empty() {
                println!("No rotations recorded for {}", name);
            }
            for r in records {
                println!("{}  {}", r.rotated_date, r.notes.as_deref().unwrap_or(""));
            }
        }
        SecretsCommands::Deactivate { name } => {
            tracker.deactivate_secret(&name)?;
            println!("Deactivated {}", name);
        }
    }

    Ok(Outcome::Pass)
}

fn print_bucket(label: &str, items: &[DueItem]) {
    if items.is_empty() {
        return;
    }
    println!("{} ({})", label, items.len());
    for item in items {
        println!(
            "  {:<24} due {} ({} days)",
            item.name, item.due_date, item.days_until
        );
    }
}
