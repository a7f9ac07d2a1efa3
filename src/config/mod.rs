use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::paths::Paths;
use crate::security::{
    DEFAULT_FINDINGS_CAP, DEFAULT_SENSITIVE_FILES, DEFAULT_VIOLATIONS_CAP, EnforcementMode,
    SessionContext, SessionType,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolved XDG-compliant paths (not serialized)
    #[serde(skip)]
    pub paths: Paths,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub isolation: IsolationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// block | warn | log_only. Used when no session state has been saved.
    #[serde(default)]
    pub enforcement_mode: EnforcementMode,

    /// Session type assumed before `session set` is run.
    #[serde(default = "default_session")]
    pub default_session: SessionType,

    /// Treat Discord/Slack direct messages as main sessions (default: false)
    #[serde(default)]
    pub trust_direct_messages: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Findings kept in outbound_findings.jsonl
    #[serde(default = "default_findings_cap")]
    pub findings_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationConfig {
    /// Violations kept in isolation_violations.jsonl
    #[serde(default = "default_violations_cap")]
    pub violations_cap: usize,

    /// Workspace files `session verify` checks
    #[serde(default = "default_sensitive_files")]
    pub sensitive_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// text | json
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_session() -> SessionType {
    SessionType::Public
}

fn default_findings_cap() -> usize {
    DEFAULT_FINDINGS_CAP
}

fn default_violations_cap() -> usize {
    DEFAULT_VIOLATIONS_CAP
}

fn default_sensitive_files() -> Vec<String> {
    DEFAULT_SENSITIVE_FILES.iter().map(|s| s.to_string()).collect()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enforcement_mode: EnforcementMode::default(),
            default_session: default_session(),
            trust_direct_messages: false,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            findings_cap: default_findings_cap(),
        }
    }
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            violations_cap: default_violations_cap(),
            sensitive_files: default_sensitive_files(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Paths::resolve()?)
    }

    /// Load `config.toml` under `paths`, writing the template on first run.
    pub fn load_from(paths: Paths) -> Result<Self> {
        paths.ensure_dirs()?;

        let path = paths.config_file();

        if !path.exists() {
            let config = Config {
                paths,
                ..Config::default()
            };
            config.save_with_template()?;
            return Ok(config);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.paths = paths;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = self.paths.config_file();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;

        Ok(())
    }

    /// Save config with a helpful template (for first-time setup)
    pub fn save_with_template(&self) -> Result<()> {
        let path = self.paths.config_file();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        eprintln!("Created default config at {}", path.display());

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let paths = Paths::resolve()?;
        Ok(paths.config_file())
    }

    /// Session context used when nothing has been persisted yet.
    pub fn default_context(&self) -> SessionContext {
        SessionContext::new(self.security.default_session, self.security.enforcement_mode)
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["security", "enforcement_mode"] => Ok(self.security.enforcement_mode.to_string()),
            ["security", "default_session"] => Ok(self.security.default_session.to_string()),
            ["security", "trust_direct_messages"] => {
                Ok(self.security.trust_direct_messages.to_string())
            }
            ["scanner", "findings_cap"] => Ok(self.scanner.findings_cap.to_string()),
            ["isolation", "violations_cap"] => Ok(self.isolation.violations_cap.to_string()),
            ["isolation", "sensitive_files"] => Ok(self.isolation.sensitive_files.join(",")),
            ["logging", "level"] => Ok(self.logging.level.clone()),
            ["logging", "format"] => Ok(self.logging.format.clone()),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["security", "enforcement_mode"] => self.security.enforcement_mode = value.parse()?,
            ["security", "default_session"] => self.security.default_session = value.parse()?,
            ["security", "trust_direct_messages"] => {
                self.security.trust_direct_messages = value.parse()?
            }
            ["scanner", "findings_cap"] => self.scanner.findings_cap = value.parse()?,
            ["isolation", "violations_cap"] => self.isolation.violations_cap = value.parse()?,
            ["isolation", "sensitive_files"] => {
                self.isolation.sensitive_files = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
            ["logging", "level"] => self.logging.level = value.to_string(),
            ["logging", "format"] => match value {
                "text" | "json" => self.logging.format = value.to_string(),
                _ => anyhow::bail!("logging.format must be 'text' or 'json', got '{}'", value),
            },
            _ => anyhow::bail!("Unknown config key: {}", key),
        }

        Ok(())
    }
}

/// Default config template with helpful comments (used for first-time setup)
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# AgentForge Configuration
# Auto-created on first run. Edit as needed.

[security]
# What a policy denial does: block | warn | log_only
enforcement_mode = "block"
# Session assumed until `agentforge session set` runs: main | group_chat | public | sub_agent
default_session = "public"
# Treat Discord/Slack direct messages as main sessions
trust_direct_messages = false

[scanner]
# Findings kept in the outbound history
findings_cap = 1000

[isolation]
# Violations kept in the isolation history
violations_cap = 500
# Workspace files `session verify` checks for exposure
sensitive_files = ["MEMORY.md", "USER.md"]

[logging]
# Overridden by RUST_LOG and -v
level = "warn"
# text | json
format = "text"
"#;
