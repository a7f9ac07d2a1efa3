//! XDG Base Directory Specification compliant path resolution.
//!
//! Every directory is resolved through a three-level fallback:
//! 1. AgentForge-specific env var (AGENTFORGE_CONFIG_DIR, etc.)
//! 2. XDG env var (XDG_CONFIG_HOME, etc.) via `etcetera`
//! 3. Platform default (~/.config, etc.)
//!
//! All paths are absolute. Relative paths from env vars are ignored, as the
//! XDG Base Directory rules require.

use anyhow::{Context, Result};
#[cfg(unix)]
use libc::getuid;
use std::path::{Path, PathBuf};

/// Resolved directory paths for the entire application.
///
/// Created once at startup, threaded through Config.
/// All paths are absolute.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Config directory: config.toml lives here
    pub config_dir: PathBuf,

    /// Data directory: classification store, secret inventory
    pub data_dir: PathBuf,

    /// Workspace the agent operates on (MEMORY.md, USER.md, docs/, ...).
    /// Overridden independently via AGENTFORGE_WORKSPACE.
    pub workspace: PathBuf,

    /// State directory: findings, violations, audit trail, session state
    pub state_dir: PathBuf,

    /// Runtime directory: store lock files.
    /// None if no suitable runtime directory is available.
    pub runtime_dir: Option<PathBuf>,
}

impl Paths {
    /// Resolve all paths using real environment variables.
    pub fn resolve() -> Result<Self> {
        Self::resolve_with_env(|key| std::env::var(key))
    }

    /// Resolve paths with a custom env var lookup (for testing).
    pub fn resolve_with_env<F>(env_fn: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        use etcetera::BaseStrategy;

        let strategy = etcetera::choose_base_strategy()
            .map_err(|e| anyhow::anyhow!("Failed to determine base directories: {}", e))?;

        let config_dir = env_or(&env_fn, "AGENTFORGE_CONFIG_DIR", || {
            strategy.config_dir().join("agentforge")
        });

        let data_dir = env_or(&env_fn, "AGENTFORGE_DATA_DIR", || {
            strategy.data_dir().join("agentforge")
        });

        let state_dir = env_or(&env_fn, "AGENTFORGE_STATE_DIR", || {
            let base_state = strategy.state_dir().unwrap_or_else(|| strategy.data_dir());
            base_state.join("agentforge")
        });

        let workspace = resolve_workspace(&env_fn);
        let runtime_dir = resolve_runtime_dir(&env_fn);

        Ok(Self {
            config_dir,
            data_dir,
            workspace,
            state_dir,
            runtime_dir,
        })
    }

    /// Build a self-contained layout under one root (tests, embedding).
    pub fn rooted(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            workspace: root.join("workspace"),
            state_dir: root.join("state"),
            runtime_dir: Some(root.join("run")),
        }
    }

    // ── Convenience accessors for specific files ──

    /// Config file: config_dir/config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Classification overrides and patterns: data_dir/classifications.json
    pub fn classifications_file(&self) -> PathBuf {
        self.data_dir.join("classifications.json")
    }

    /// Secret rotation inventory: data_dir/secrets.sqlite
    pub fn secrets_db(&self) -> PathBuf {
        self.data_dir.join("secrets.sqlite")
    }

    /// Outbound findings history: state_dir/outbound_findings.jsonl
    pub fn findings_log(&self) -> PathBuf {
        self.state_dir.join("outbound_findings.jsonl")
    }

    /// Isolation violations history: state_dir/isolation_violations.jsonl
    pub fn violations_log(&self) -> PathBuf {
        self.state_dir.join("isolation_violations.jsonl")
    }

    /// Persisted session type and enforcement mode: state_dir/session_state.json
    pub fn session_state_file(&self) -> PathBuf {
        self.state_dir.join("session_state.json")
    }

    /// External action audit trail: state_dir/audit.sqlite
    pub fn audit_db(&self) -> PathBuf {
        self.state_dir.join("audit.sqlite")
    }

    /// Directory holding store lock files (runtime_dir, falls back to state_dir)
    pub fn lock_dir(&self) -> PathBuf {
        self.runtime_dir
            .as_ref()
            .unwrap_or(&self.state_dir)
            .join("locks")
    }

    /// Create all directories with appropriate permissions.
    pub fn ensure_dirs(&self) -> Result<()> {
        let dirs = [&self.config_dir, &self.data_dir, &self.state_dir];

        for dir in &dirs {
            create_dir_with_mode(dir)?;
        }

        if let Some(ref runtime) = self.runtime_dir {
            create_dir_with_mode(runtime)?;
        }
        create_dir_with_mode(&self.lock_dir())?;

        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::resolve().unwrap_or_else(|_| {
            // Only reached when no home directory can be determined
            let home = etcetera::home_dir().unwrap_or_else(|_| PathBuf::from("."));
            Self {
                config_dir: home.join(".config").join("agentforge"),
                data_dir: home.join(".local").join("share").join("agentforge"),
                workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
                state_dir: home.join(".local").join("state").join("agentforge"),
                runtime_dir: None,
            }
        })
    }
}

/// Resolve an env var with fallback. Empty and relative paths are ignored.
fn env_or<F>(env_fn: &F, var: &str, default: impl FnOnce() -> PathBuf) -> PathBuf
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    env_fn(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_absolute()) // XDG: relative paths are invalid
        .unwrap_or_else(default)
}

/// Resolve the workspace: AGENTFORGE_WORKSPACE, else the current directory.
fn resolve_workspace<F>(env_fn: &F) -> PathBuf
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    if let Ok(ws) = env_fn("AGENTFORGE_WORKSPACE") {
        let trimmed = ws.trim();
        if !trimmed.is_empty() {
            let expanded = shellexpand::tilde(trimmed);
            let path = PathBuf::from(expanded.to_string());
            if path.is_absolute() {
                return path;
            }
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolve runtime directory.
fn resolve_runtime_dir<F>(env_fn: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    if let Ok(dir) = env_fn("XDG_RUNTIME_DIR")
        && !dir.is_empty()
    {
        let path = PathBuf::from(&dir);
        if path.is_absolute() {
            return Some(path.join("agentforge"));
        }
    }

    // Fallback: $TMPDIR/agentforge-$UID on Unix
    #[cfg(unix)]
    {
        let uid = unsafe { getuid() };
        let tmpdir = env_fn("TMPDIR").unwrap_or_else(|_| "/tmp".to_string());
        Some(PathBuf::from(tmpdir).join(format!("agentforge-{}", uid)))
    }

    #[cfg(not(unix))]
    {
        env_fn("TEMP").ok().map(|t| {
            let user = env_fn("USERNAME").unwrap_or_else(|_| "user".into());
            PathBuf::from(t).join(format!("agentforge-{}", user))
        })
    }
}

/// Create a directory with mode 0700 per the XDG Base Directory rules.
fn create_dir_with_mode(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_env(
        map: HashMap<&str, &str>,
    ) -> impl Fn(&str) -> std::result::Result<String, std::env::VarError> {
        move |key: &str| {
            map.get(key)
                .map(|v| v.to_string())
                .ok_or(std::env::VarError::NotPresent)
        }
    }

    #[test]
    fn default_paths_are_xdg_compliant() {
        let paths = Paths::resolve_with_env(make_env(HashMap::new())).unwrap();

        assert!(paths.config_dir.ends_with("agentforge"));
        assert!(paths.data_dir.ends_with("agentforge"));
        assert!(paths.state_dir.ends_with("agentforge"));
    }

    #[test]
    fn agentforge_env_vars_override_xdg() {
        let mut env: HashMap<&str, &str> = HashMap::new();
        env.insert("AGENTFORGE_CONFIG_DIR", "/custom/config");
        env.insert("AGENTFORGE_DATA_DIR", "/custom/data");
        env.insert("AGENTFORGE_STATE_DIR", "/custom/state");

        let paths = Paths::resolve_with_env(make_env(env)).unwrap();
        assert_eq!(paths.config_dir, PathBuf::from("/custom/config"));
        assert_eq!(paths.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(paths.state_dir, PathBuf::from("/custom/state"));
    }

    #[test]
    fn relative_and_empty_overrides_are_ignored() {
        let mut env: HashMap<&str, &str> = HashMap::new();
        env.insert("AGENTFORGE_CONFIG_DIR", "relative/path");
        env.insert("AGENTFORGE_STATE_DIR", "");

        let paths = Paths::resolve_with_env(make_env(env)).unwrap();
        assert!(paths.config_dir.is_absolute());
        assert_ne!(paths.config_dir, PathBuf::from("relative/path"));
        assert!(paths.state_dir.ends_with("agentforge"));
    }

    #[test]
    fn workspace_override() {
        let mut env: HashMap<&str, &str> = HashMap::new();
        env.insert("AGENTFORGE_WORKSPACE", "/projects/agent");

        let paths = Paths::resolve_with_env(make_env(env)).unwrap();
        assert_eq!(paths.workspace, PathBuf::from("/projects/agent"));
    }

    #[test]
    fn convenience_accessors() {
        let paths = Paths::rooted(Path::new("/srv/af"));

        assert!(paths.config_file().ends_with("config/config.toml"));
        assert!(paths.classifications_file().ends_with("data/classifications.json"));
        assert!(paths.secrets_db().ends_with("secrets.sqlite"));
        assert!(paths.findings_log().ends_with("outbound_findings.jsonl"));
        assert!(paths.violations_log().ends_with("isolation_violations.jsonl"));
        assert!(paths.session_state_file().ends_with("session_state.json"));
        assert!(paths.audit_db().ends_with("state/audit.sqlite"));
        assert_eq!(paths.lock_dir(), PathBuf::from("/srv/af/run/locks"));
    }
}
