//! CLI subcommand: `agentforge audit`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::{Outcome, print_json};
use crate::config::Config;
use crate::security::{AuditEntry, NewAction, Toolkit};

#[derive(Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommands,
}

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Record an external action
    Log {
        /// Action type: email, post, api, file, message, browser, ...
        action_type: String,

        #[arg(short, long)]
        target: Option<String>,

        /// Content sent (stored as a hash only)
        #[arg(short, long)]
        content: Option<String>,

        /// Extra metadata as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,

        /// Session key (default: AGENTFORGE_SESSION_KEY)
        #[arg(short, long, env = "AGENTFORGE_SESSION_KEY")]
        session_key: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,

        /// The action failed
        #[arg(long)]
        failed: bool,
    },

    /// Show recent actions
    Recent {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Only this action type
        #[arg(short = 't', long)]
        action_type: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Action counts
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Search targets, notes and action types
    Search {
        query: String,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Verify the hash chain
    Verify,
}

pub fn run(args: AuditArgs, config: &Config) -> Result<Outcome> {
    let kit = Toolkit::open(config)?;

    match args.command {
        AuditCommands::Log {
            action_type,
            target,
            content,
            metadata,
            session_key,
            notes,
            failed,
        } => {
            let mut action = NewAction::new(action_type).success(!failed);
            if let Some(target) = target {
                action = action.target(target);
            }
            if let Some(content) = content {
                action = action.content(content);
            }
            if let Some(raw) = metadata {
                let value = serde_json::from_str(&raw).context("--metadata must be valid JSON")?;
                action = action.metadata(value);
            }
            if let Some(key) = session_key {
                action = action.session_key(key);
            }
            if let Some(notes) = notes {
                action = action.notes(notes);
            }
            let id = kit.audit.log_action(action)?;
            println!("Logged action #{}", id);
        }
        AuditCommands::Recent {
            limit,
            action_type,
            json,
        } => {
            let entries = kit.audit.recent(limit, action_type.as_deref());
            if json {
                print_json(&entries)?;
            } else {
                print_entries(&entries);
            }
        }
        AuditCommands::Stats { json } => {
            let stats = kit.audit.stats();
            if json {
                print_json(&stats)?;
            } else {
                println!("Total actions: {}", stats.total);
                println!("Last 24h:      {}", stats.last_24h);
                println!("Failures:      {}", stats.failures);
                for (action_type, count) in &stats.by_type {
                    println!("  {:<12} {}", action_type, count);
                }
            }
        }
        AuditCommands::Search { query, limit } => {
            print_entries(&kit.audit.search(&query, limit));
        }
        AuditCommands::Verify => {
            let broken = kit.audit.verify_chain()?;
            if broken.is_empty() {
                println!("Audit chain intact.");
            } else {
                let ids: Vec<String> = broken.iter().map(|id| id.to_string()).collect();
                println!("Audit chain broken at entries: {}", ids.join(", "));
                return Ok(Outcome::Fail);
            }
        }
    }

    Ok(Outcome::Pass)
}

fn print_entries(entries: &[AuditEntry]) {
    if entries.is_empty() {
        println!("No audit entries.");
        return;
    }
    for e in entries {
        println!(
            "#{} {} {} {} -> {}",
            e.id,
            e.timestamp,
            if e.success { "OK  " } else { "FAIL" },
            e.action_type,
            e.target.as_deref().unwrap_or("-")
        );
        if let Some(preview) = &e.content_preview {
            println!("    content: {}", preview);
        }
        if let Some(notes) = &e.notes {
            println!("    notes:   {}", notes);
        }
    }
}
