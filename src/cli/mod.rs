pub mod audit;
pub mod classify;
pub mod config;
pub mod outbound;
pub mod paths;
pub mod secrets;
pub mod session;
pub mod skills;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "agentforge")]
#[command(
    author,
    version,
    about = "Outbound-content security for chat-connected agents"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan text for secrets and personal data
    Scan(outbound::ScanArgs),

    /// Exit non-zero if text is unsafe to send
    Check(outbound::CheckArgs),

    /// Summarize recent outbound findings
    Report(outbound::ReportArgs),

    /// Show or set a file's sensitivity level
    Classify(classify::ClassifyArgs),

    /// Decide whether a file may be shared in a context
    Share(classify::ShareArgs),

    /// Suggest a sensitivity level from file content
    Analyze(classify::AnalyzeArgs),

    /// List files grouped by sensitivity level
    List(classify::ListArgs),

    /// Register a glob pattern under a sensitivity level
    Pattern(classify::PatternArgs),

    /// Describe the sensitivity levels and their handling rules
    Levels,

    /// Session isolation and file-access policy
    Session(session::SessionArgs),

    /// External action audit trail
    Audit(audit::AuditArgs),

    /// Secret rotation tracking
    Secrets(secrets::SecretsArgs),

    /// Static safety review of third-party skills
    Skills(skills::SkillsArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Show resolved XDG directory paths
    Paths,
}

/// Status reported to the shell by commands that gate a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
}

impl From<Outcome> for std::process::ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Pass => Self::SUCCESS,
            Outcome::Fail => Self::from(1),
        }
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
