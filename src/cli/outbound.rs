//! CLI subcommands: `scan`, `check`, `report`

use anyhow::{Context, Result};
use clap::Args;
use std::io::Read;
use std::path::PathBuf;

use super::{Outcome, print_json};
use crate::config::Config;
use crate::security::{ScanResult, Toolkit};

#[derive(Args)]
pub struct ScanArgs {
    /// Text to scan (reads stdin when omitted)
    pub text: Option<String>,

    /// Scan a file instead
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Destination or caller context recorded with the findings
    #[arg(short, long)]
    pub context: Option<String>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Text about to be sent (reads stdin when omitted)
    pub text: Option<String>,

    /// Where the text is going (discord, email, ...)
    #[arg(short, long)]
    pub dest: Option<String>,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Look back this many days
    #[arg(short, long, default_value_t = 7)]
    pub days: u32,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn scan(args: ScanArgs, config: &Config) -> Result<()> {
    let kit = Toolkit::open(config)?;
    let context = args.context.as_deref();

    let result = match args.file {
        Some(path) => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            kit.filter.scan_bytes(&bytes, context)?
        }
        None => kit.filter.scan(&input(args.text)?, context)?,
    };

    if args.json {
        return print_json(&result);
    }
    print_result(&result);
    Ok(())
}

pub fn check(args: CheckArgs, config: &Config) -> Result<Outcome> {
    let kit = Toolkit::open(config)?;
    let text = input(args.text)?;

    if kit.filter.check_before_send(&text, args.dest.as_deref()) {
        println!("SAFE");
        Ok(Outcome::Pass)
    } else {
        println!("BLOCKED");
        Ok(Outcome::Fail)
    }
}

pub fn report(args: ReportArgs, config: &Config) -> Result<()> {
    let kit = Toolkit::open(config)?;
    let report = kit.filter.report(args.days);

    if args.json {
        return print_json(&report);
    }

    println!("Outbound findings, last {} days: {}", report.period_days, report.total);
    if report.total == 0 {
        return Ok(());
    }
    println!();
    println!("By severity:");
    for (severity, count) in report.by_severity.iter().rev() {
        println!("  {:<10} {}", severity.as_str(), count);
    }
    println!("By category:");
    for (category, count) in &report.by_category {
        println!("  {:<20} {}", category.as_str(), count);
    }
    Ok(())
}

fn input(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn print_result(result: &ScanResult) {
    if result.findings.is_empty() {
        println!("No sensitive content found.");
        return;
    }

    let s = &result.summary;
    println!(
        "{} ({} findings: {} critical, {} high, {} medium, {} low)",
        if result.safe { "SAFE" } else { "UNSAFE" },
        s.total,
        s.critical,
        s.high,
        s.medium,
        s.low
    );
    for f in &result.findings {
        println!("  [{}] {} at {}: {}", f.severity, f.category, f.position, f.preview);
    }
    println!();
    println!("Redacted:");
    println!("{}", result.redacted);
}
