//! CLI subcommand: `agentforge skills`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::Outcome;
use crate::config::Config;
use crate::security::{
    DEFAULT_MAX_FINDINGS, Severity, count_by_severity, default_scan_paths, exceeds, scan_paths,
};

const SHOWN: usize = 200;

#[derive(Args)]
pub struct SkillsArgs {
    #[command(subcommand)]
    pub command: SkillsCommands,
}

#[derive(Subcommand)]
pub enum SkillsCommands {
    /// Scan skill directories or files
    Scan {
        /// Paths to scan (default: workspace skills/ and the installed skills dir)
        #[arg(short, long, num_args = 1..)]
        paths: Vec<PathBuf>,

        /// Write findings as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Fail when any finding is at or above this severity
        #[arg(long, default_value = "high")]
        fail_on: String,

        /// Stop after this many findings
        #[arg(long, default_value_t = DEFAULT_MAX_FINDINGS)]
        max: usize,

        /// Installed skills directory scanned by default
        #[arg(long, env = "AGENTFORGE_INSTALLED_SKILLS_DIR")]
        installed: Option<PathBuf>,
    },
}

pub fn run(args: SkillsArgs, config: &Config) -> Result<Outcome> {
    match args.command {
        SkillsCommands::Scan {
            paths,
            json,
            fail_on,
            max,
            installed,
        } => {
            let threshold: Severity = fail_on.parse()?;
            let workspace = &config.paths.workspace;
            let paths = if paths.is_empty() {
                default_scan_paths(workspace, installed.as_deref())
            } else {
                paths
            };

            let findings = scan_paths(&paths, workspace, max);

            if let Some(out) = json {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&out, serde_json::to_string_pretty(&findings)?)
                    .with_context(|| format!("Failed to write {}", out.display()))?;
            }

            if findings.is_empty() {
                println!("No findings.");
            } else {
                let counts = count_by_severity(&findings);
                let count = |s: Severity| counts.get(&s).copied().unwrap_or(0);
                println!(
                    "Findings: high={} medium={} low={}",
                    count(Severity::High),
                    count(Severity::Medium),
                    count(Severity::Low)
                );
                for f in findings.iter().take(SHOWN) {
                    println!("- [{}] {} {}", f.severity, f.rule_id, f.location());
                    println!("    {}", f.message);
                    println!("    {}", f.snippet.as_deref().unwrap_or(""));
                }
                if findings.len() > SHOWN {
                    println!("... ({} more not shown)", findings.len() - SHOWN);
                }
            }

            Ok(if exceeds(&findings, threshold) {
                Outcome::Fail
            } else {
                Outcome::Pass
            })
        }
    }
}
