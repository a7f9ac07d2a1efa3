use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use agentforge::Config;
use agentforge::cli::{self, Cli, Commands, Outcome};
use agentforge::config::LoggingConfig;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // `config` and `paths` must work before (or without) a config file.
    let config = match cli.command {
        Commands::Config(_) | Commands::Paths => None,
        _ => Some(Config::load()?),
    };
    init_logging(cli.verbose, config.as_ref().map(|c| &c.logging));

    let Some(config) = config else {
        match cli.command {
            Commands::Config(args) => cli::config::run(args)?,
            _ => cli::paths::run()?,
        }
        return Ok(ExitCode::SUCCESS);
    };

    let outcome = match cli.command {
        Commands::Scan(args) => cli::outbound::scan(args, &config).map(|_| Outcome::Pass),
        Commands::Check(args) => cli::outbound::check(args, &config),
        Commands::Report(args) => cli::outbound::report(args, &config).map(|_| Outcome::Pass),
        Commands::Classify(args) => cli::classify::classify(args, &config).map(|_| Outcome::Pass),
        Commands::Share(args) => cli::classify::share(args, &config).map(|_| Outcome::Pass),
        Commands::Analyze(args) => cli::classify::analyze(args).map(|_| Outcome::Pass),
        Commands::List(args) => cli::classify::list(args, &config).map(|_| Outcome::Pass),
        Commands::Pattern(args) => cli::classify::pattern(args, &config).map(|_| Outcome::Pass),
        Commands::Levels => cli::classify::levels().map(|_| Outcome::Pass),
        Commands::Session(args) => cli::session::run(args, &config),
        Commands::Audit(args) => cli::audit::run(args, &config),
        Commands::Secrets(args) => cli::secrets::run(args, &config),
        Commands::Skills(args) => cli::skills::run(args, &config),
        Commands::Config(_) | Commands::Paths => Ok(Outcome::Pass),
    }?;

    Ok(outcome.into())
}

fn init_logging(verbose: bool, logging: Option<&LoggingConfig>) {
    let level = if verbose {
        "debug"
    } else {
        logging.map(|l| l.level.as_str()).unwrap_or("warn")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.is_some_and(|l| l.format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}
