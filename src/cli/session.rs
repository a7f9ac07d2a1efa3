//! CLI subcommand: `agentforge session`

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::Outcome;
use crate::config::Config;
use crate::security::{FileAction, GuardError, SessionHints, SessionType, Toolkit};

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Check whether the current (or given) session may access a file
    Check {
        file: PathBuf,

        /// Session type to check as (default: current)
        #[arg(short, long)]
        session: Option<String>,

        /// Check a write instead of a read
        #[arg(short, long)]
        write: bool,
    },

    /// Set the current session type
    Set {
        /// main | group_chat | public | sub_agent
        session_type: String,
    },

    /// Set the enforcement mode
    Mode {
        /// block | warn | log_only
        mode: String,
    },

    /// Detect a session type from a session key
    Detect {
        /// Session key (default: AGENTFORGE_SESSION_KEY)
        #[arg(short, long)]
        key: Option<String>,

        /// The session is a direct message
        #[arg(long)]
        dm: bool,
    },

    /// Show recent isolation violations
    Violations {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Check the workspace for files exposed to the current session
    Verify,

    /// Show the current session type and enforcement mode
    Status,

    /// List session types and their policies
    Types,
}

pub fn run(args: SessionArgs, config: &Config) -> Result<Outcome> {
    let kit = Toolkit::open(config)?;

    match args.command {
        SessionCommands::Check {
            file,
            session,
            write,
        } => {
            let action = if write { FileAction::Write } else { FileAction::Read };
            return check(&kit, &file, session.as_deref(), action);
        }
        SessionCommands::Set { session_type } => {
            let mut ctx = kit.context();
            ctx.set_session_type(&session_type)?;
            kit.save_context(&ctx)?;
            println!("Session type: {}", ctx.session_type);
        }
        SessionCommands::Mode { mode } => {
            let mut ctx = kit.context();
            ctx.set_enforcement_mode(&mode)?;
            kit.save_context(&ctx)?;
            println!("Enforcement mode: {}", ctx.mode);
        }
        SessionCommands::Detect { key, dm } => {
            let mut hints = SessionHints::from_env();
            if let Some(key) = key {
                hints.session_key = key;
            }
            hints.is_dm |= dm;
            println!("{}", kit.detect(&hints));
        }
        SessionCommands::Violations { limit } => {
            let violations = kit.isolator.violations(limit);
            if violations.is_empty() {
                println!("No violations recorded.");
            }
            for v in violations {
                println!(
                    "{} [{}] {} {} {}: {}",
                    v.timestamp,
                    if v.blocked { "BLOCKED" } else { "ALLOWED" },
                    v.session_type,
                    v.action.as_str(),
                    v.file,
                    v.reason
                );
            }
        }
        SessionCommands::Verify => {
            let issues = kit.isolator.verify_isolation(&kit.context());
            if issues.is_empty() {
                println!("No isolation issues.");
                return Ok(Outcome::Pass);
            }
            for issue in &issues {
                println!("[{}] {}: {}", issue.severity, issue.file, issue.issue);
            }
            return Ok(Outcome::Fail);
        }
        SessionCommands::Status => {
            let ctx = kit.context();
            println!("Session type:     {}", ctx.session_type);
            println!("  {}", ctx.session_type.policy().description);
            println!("Enforcement mode: {}", ctx.mode);
            println!("Workspace:        {}", kit.isolator.workspace().display());
        }
        SessionCommands::Types => show_types(),
    }

    Ok(Outcome::Pass)
}

fn check(
    kit: &Toolkit,
    file: &std::path::Path,
    session: Option<&str>,
    action: FileAction,
) -> Result<Outcome> {
    let ctx = kit.context();
    match kit.check_access(file, session, action, &ctx) {
        Ok(decision) if decision.allowed => {
            println!("ALLOWED ({}): {}", decision.session_type, decision.reason);
            Ok(Outcome::Pass)
        }
        Ok(decision) => {
            println!(
                "VIOLATION ({}, allowed in {} mode): {}",
                decision.session_type, ctx.mode, decision.reason
            );
            Ok(Outcome::Pass)
        }
        Err(e @ GuardError::PolicyDenied { .. }) => {
            println!("{}", e);
            Ok(Outcome::Fail)
        }
        Err(e) => Err(e.into()),
    }
}

fn show_types() {
    for t in SessionType::ALL {
        let policy = t.policy();
        println!("{}: {}", t, policy.description);
        println!("  allowed: {}", policy.allowed_files.join(" "));
        if !policy.blocked_files.is_empty() {
            println!("  blocked: {}", policy.blocked_files.join(" "));
        }
        let levels: Vec<&str> = policy.allowed_levels.iter().map(|l| l.as_str()).collect();
        println!("  levels:  {}", levels.join(" "));
        println!("  memory writes: {}", if policy.can_write_memory { "yes" } else { "no" });
    }
}
