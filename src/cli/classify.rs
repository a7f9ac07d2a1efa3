//! CLI subcommands: `classify`, `share`, `analyze`, `list`, `pattern`, `levels`

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::print_json;
use crate::config::Config;
use crate::security::{SensitivityLevel, ShareContext, Toolkit, check_content};

#[derive(Args)]
pub struct ClassifyArgs {
    pub file: PathBuf,

    /// Set an explicit level (SECRET, CONFIDENTIAL, INTERNAL, PUBLIC)
    #[arg(short, long)]
    pub level: Option<String>,
}

#[derive(Args)]
pub struct ShareArgs {
    pub file: PathBuf,

    /// public | group_chat | direct_message | internal (unknown means public)
    #[arg(short, long)]
    pub context: String,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    pub file: PathBuf,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only show this level
    #[arg(short, long)]
    pub level: Option<String>,

    /// Directory to walk (default: workspace)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct PatternArgs {
    pub level: String,
    pub glob: String,
}

pub fn classify(args: ClassifyArgs, config: &Config) -> Result<()> {
    let kit = Toolkit::open(config)?;

    let level = match args.level {
        Some(name) => kit.classifier.set_level(&args.file, parse_level(&name)?)?,
        None => kit.classifier.classify(&args.file),
    };
    println!("{}: {}", args.file.display(), level);
    println!("  {}", level.description());
    Ok(())
}

pub fn share(args: ShareArgs, config: &Config) -> Result<()> {
    let kit = Toolkit::open(config)?;
    let context = ShareContext::resolve(&args.context);
    let decision = kit.classifier.can_share(&args.file, context);

    if args.json {
        return print_json(&decision);
    }
    println!(
        "{} to {}: {} ({})",
        if decision.allowed { "ALLOWED" } else { "DENIED" },
        context.as_str(),
        args.file.display(),
        decision.level
    );
    for w in &decision.warnings {
        println!("  ! {}", w);
    }
    Ok(())
}

pub fn analyze(args: AnalyzeArgs) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let assessment = check_content(&String::from_utf8_lossy(&bytes));

    if args.json {
        return print_json(&assessment);
    }
    println!(
        "Suggested: {} (confidence {}%)",
        assessment.suggested, assessment.confidence
    );
    for (level, score) in assessment.indicators.iter().rev() {
        println!("  {:<12} {}", level.as_str(), score);
    }
    Ok(())
}

pub fn list(args: ListArgs, config: &Config) -> Result<()> {
    let kit = Toolkit::open(config)?;
    let dir = args.dir.unwrap_or_else(|| config.paths.workspace.clone());
    let filter = args.level.as_deref().map(parse_level).transpose()?;

    let grouped = kit.classifier.list_by_level(&dir, filter)?;
    if grouped.is_empty() {
        println!("No files under {}", dir.display());
        return Ok(());
    }
    for (level, files) in grouped.iter().rev() {
        println!("{} ({})", level, files.len());
        for f in files {
            println!("  {}", f);
        }
    }
    Ok(())
}

pub fn pattern(args: PatternArgs, config: &Config) -> Result<()> {
    let kit = Toolkit::open(config)?;
    let level = parse_level(&args.level)?;

    if kit.classifier.add_pattern(level, &args.glob)? {
        println!("Added '{}' to {}", args.glob, level);
    } else {
        println!("'{}' already registered under {}", args.glob, level);
    }
    Ok(())
}

pub fn levels() -> Result<()> {
    for level in SensitivityLevel::DESCENDING {
        println!("{}: {}", level, level.description());
        let rules: Vec<&str> = level.rules().iter().map(|r| r.as_str()).collect();
        if !rules.is_empty() {
            println!("  rules: {}", rules.join(", "));
        }
    }
    Ok(())
}

fn parse_level(name: &str) -> Result<SensitivityLevel> {
    Ok(name.parse()?)
}
