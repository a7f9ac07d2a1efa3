//! CLI subcommand: `agentforge paths`
//!
//! Prints all resolved XDG-compliant paths for debugging and scripting.

use anyhow::Result;

use crate::paths::Paths;

pub fn run() -> Result<()> {
    let paths = Paths::resolve()?;

    println!("AgentForge Paths (XDG Base Directory)");
    println!("======================================");
    println!();
    println!("Config:     {}", paths.config_dir.display());
    println!("  config.toml:      {}", paths.config_file().display());
    println!();
    println!("Data:       {}", paths.data_dir.display());
    println!("  classifications:  {}", paths.classifications_file().display());
    println!("  secrets:          {}", paths.secrets_db().display());
    println!();
    println!("State:      {}", paths.state_dir.display());
    println!("  findings:         {}", paths.findings_log().display());
    println!("  violations:       {}", paths.violations_log().display());
    println!("  session state:    {}", paths.session_state_file().display());
    println!("  audit trail:      {}", paths.audit_db().display());
    println!();
    println!("Workspace:  {}", paths.workspace.display());
    println!();
    match paths.runtime_dir {
        Some(ref dir) => println!("Runtime:    {}", dir.display()),
        None => println!("Runtime:    (not available)"),
    }
    println!("  store locks:      {}", paths.lock_dir().display());

    Ok(())
}
