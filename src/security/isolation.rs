//! Session isolation.
//!
//! Maps a session descriptor to a [`SessionType`], evaluates that type's
//! file policy, and records violations. The current session and
//! enforcement mode travel in an explicit [`SessionContext`]; nothing here
//! reads process-wide state.
//!
//! Policy evaluation for a path, after folding `.` and `..` (a relative
//! path that climbs above its base is denied):
//!
//! 1. deny-list first. A wildcard deny (`*`) lets through only files on
//!    the allow-list; any other deny match is an immediate denial.
//! 2. allow-list. A wildcard allow admits everything not denied;
//!    otherwise the file must match an allow pattern.
//!
//! Unknown session names deny everything.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classifier::{SensitivityLevel, glob_matches};
use super::error::{GuardError, Result};
use super::pathnorm::{absolute, normalize, slash};
use super::patterns::Severity;
use super::store::{BoundedLog, JsonDocument};
use crate::concurrency::StoreLock;

/// Default number of violations kept.
pub const DEFAULT_VIOLATIONS_CAP: usize = 500;

/// Files whose presence in a restricted session is reported by
/// [`Isolator::verify_isolation`].
pub const DEFAULT_SENSITIVE_FILES: &[&str] = &["MEMORY.md", "USER.md"];

const MEMORY_FILES: &[&str] = &["MEMORY.md", "memory/*.md"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Main,
    GroupChat,
    Public,
    SubAgent,
}

/// File-access rules for one session type.
#[derive(Debug)]
pub struct SessionPolicy {
    pub description: &'static str,
    pub allowed_files: &'static [&'static str],
    pub blocked_files: &'static [&'static str],
    pub allowed_levels: &'static [SensitivityLevel],
    pub can_write_memory: bool,
}

static MAIN: SessionPolicy = SessionPolicy {
    description: "Direct chat with owner - full access",
    allowed_files: &["*"],
    blocked_files: &[],
    allowed_levels: &[
        SensitivityLevel::Secret,
        SensitivityLevel::Confidential,
        SensitivityLevel::Internal,
        SensitivityLevel::Public,
    ],
    can_write_memory: true,
};

static GROUP_CHAT: SessionPolicy = SessionPolicy {
    description: "Group chats (Discord, Slack) - restricted access",
    allowed_files: &["AGENTS.md", "SOUL.md", "TOOLS.md", "docs/*", "skills/*"],
    blocked_files: &[
        "MEMORY.md",
        "memory/*",
        "USER.md",
        "secrets/*",
        "*.env",
        "*.env.*",
        ".env*",
        "credentials.json",
        "oauth.json",
        "*.key",
        "*.pem",
        "*.bak",
        "*.backup",
        "id_rsa*",
        "id_ed25519*",
    ],
    allowed_levels: &[SensitivityLevel::Internal, SensitivityLevel::Public],
    can_write_memory: false,
};

static PUBLIC: SessionPolicy = SessionPolicy {
    description: "Public posts - minimal access",
    allowed_files: &["docs/*", "README.md"],
    blocked_files: &["*"],
    allowed_levels: &[SensitivityLevel::Public],
    can_write_memory: false,
};

static SUB_AGENT: SessionPolicy = SessionPolicy {
    description: "Spawned sub-agents - task-specific access",
    allowed_files: &["AGENTS.md", "TOOLS.md", "tools/*", "projects/*"],
    blocked_files: &[
        "MEMORY.md",
        "USER.md",
        "secrets/*",
        "*.env",
        "*.env.*",
        ".env*",
        "credentials.json",
        "oauth.json",
    ],
    allowed_levels: &[SensitivityLevel::Internal, SensitivityLevel::Public],
    can_write_memory: true,
};

impl SessionType {
    pub const ALL: [SessionType; 4] = [Self::Main, Self::GroupChat, Self::Public, Self::SubAgent];

    const NAMES: [&'static str; 4] = ["main", "group_chat", "public", "sub_agent"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::GroupChat => "group_chat",
            Self::Public => "public",
            Self::SubAgent => "sub_agent",
        }
    }

    pub fn policy(self) -> &'static SessionPolicy {
        match self {
            Self::Main => &MAIN,
            Self::GroupChat => &GROUP_CHAT,
            Self::Public => &PUBLIC,
            Self::SubAgent => &SUB_AGENT,
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "main" => Ok(Self::Main),
            "group_chat" => Ok(Self::GroupChat),
            "public" => Ok(Self::Public),
            "sub_agent" => Ok(Self::SubAgent),
            _ => Err(GuardError::configuration("session type", s, &Self::NAMES)),
        }
    }
}

/// What happens when a policy check fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    /// Deny and return `PolicyDenied`.
    #[default]
    Block,
    /// Log the violation, emit a warning, allow.
    Warn,
    /// Log the violation, allow.
    LogOnly,
}

impl EnforcementMode {
    const NAMES: [&'static str; 3] = ["block", "warn", "log_only"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Warn => "warn",
            Self::LogOnly => "log_only",
        }
    }
}

impl fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnforcementMode {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "block" => Ok(Self::Block),
            "warn" => Ok(Self::Warn),
            "log_only" => Ok(Self::LogOnly),
            _ => Err(GuardError::configuration("enforcement mode", s, &Self::NAMES)),
        }
    }
}

/// Session type and enforcement mode for the calls that follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(rename = "current_session")]
    pub session_type: SessionType,
    #[serde(rename = "enforcement_mode")]
    pub mode: EnforcementMode,
}

impl Default for SessionContext {
    /// Most restrictive: public session, block mode.
    fn default() -> Self {
        Self {
            session_type: SessionType::Public,
            mode: EnforcementMode::Block,
        }
    }
}

impl SessionContext {
    pub fn new(session_type: SessionType, mode: EnforcementMode) -> Self {
        Self { session_type, mode }
    }

    /// Strict: an unknown name leaves the context unchanged.
    pub fn set_session_type(&mut self, name: &str) -> Result<()> {
        self.session_type = name.parse()?;
        Ok(())
    }

    pub fn set_enforcement_mode(&mut self, name: &str) -> Result<()> {
        self.mode = name.parse()?;
        Ok(())
    }
}

/// Persisted session context for processes that need one between runs
/// (the CLI). Library callers hold their own [`SessionContext`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    doc: JsonDocument<SessionContext>,
}

impl SessionStore {
    pub fn open(store: &Path, lock_dir: Option<&Path>) -> Self {
        Self {
            doc: JsonDocument::new(store, StoreLock::for_store(store, lock_dir)),
        }
    }

    /// Stored context, or `defaults` when there is none or it is unreadable.
    pub fn load_or(&self, defaults: SessionContext) -> SessionContext {
        match self.doc.load() {
            Ok(Some(ctx)) => ctx,
            Ok(None) => defaults,
            Err(e) => {
                warn!("Session state unreadable, using defaults: {}", e);
                defaults
            }
        }
    }

    pub fn save(&self, ctx: &SessionContext) -> Result<()> {
        self.doc.save(ctx)
    }
}

/// Inputs to [`detect_session_type`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionHints {
    pub session_key: String,
    pub is_dm: bool,
}

impl SessionHints {
    /// Read `AGENTFORGE_SESSION_KEY`, and `AGENTFORGE_CHANNEL` for the
    /// direct-message flag.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key))
    }

    pub fn from_env_with<F>(env_fn: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        let session_key = env_fn("AGENTFORGE_SESSION_KEY").unwrap_or_default();
        let is_dm = env_fn("AGENTFORGE_CHANNEL")
            .map(|c| matches!(c.trim(), "dm" | "direct" | "direct_message"))
            .unwrap_or(false);
        Self { session_key, is_dm }
    }
}

/// Classify a session descriptor. Anything unrecognised is `Public`.
/// Direct messages stay `GroupChat` unless `trust_direct_messages`.
pub fn detect_session_type(hints: &SessionHints, trust_direct_messages: bool) -> SessionType {
    let key = hints.session_key.as_str();

    if key.contains("agent:main:main") {
        SessionType::Main
    } else if key.contains(":discord:") || key.contains(":slack:") {
        if hints.is_dm && trust_direct_messages {
            SessionType::Main
        } else {
            SessionType::GroupChat
        }
    } else if key.contains("sub-agent") || key.contains("spawn") {
        SessionType::SubAgent
    } else {
        SessionType::Public
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    #[default]
    Read,
    Write,
}

impl FileAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl FromStr for FileAction {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            _ => Err(GuardError::configuration("file action", s, &["read", "write"])),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: String,
    /// Resolved session type, or the unknown name as given.
    pub session_type: String,
}

impl AccessDecision {
    fn allow(reason: impl Into<String>, session_type: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            session_type: session_type.into(),
        }
    }

    fn deny(reason: impl Into<String>, session_type: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            session_type: session_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub file: String,
    pub session_type: String,
    pub action: FileAction,
    pub reason: String,
    /// Whether the access was actually refused.
    pub blocked: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsolationIssue {
    pub severity: Severity,
    pub file: String,
    pub issue: String,
    pub session_type: SessionType,
}

/// Policy enforcer with its violations history.
#[derive(Debug, Clone)]
pub struct Isolator {
    violations: BoundedLog<Violation>,
    workspace: PathBuf,
    sensitive_files: Vec<String>,
}

impl Isolator {
    pub fn new(violations: BoundedLog<Violation>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            violations,
            workspace: absolute(&workspace.into()),
            sensitive_files: DEFAULT_SENSITIVE_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Isolator backed by `store`, with its lock file in `lock_dir`.
    pub fn open(
        store: &Path,
        lock_dir: Option<&Path>,
        cap: usize,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            BoundedLog::new(store, StoreLock::for_store(store, lock_dir), cap),
            workspace,
        )
    }

    pub fn with_sensitive_files(mut self, files: Vec<String>) -> Self {
        self.sensitive_files = files;
        self
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Path forms the policy globs are tested against: as given, relative
    /// to the workspace, and the bare filename. `None` when the path climbs
    /// above its base with `..`.
    fn candidates(&self, path: &Path) -> Option<Vec<String>> {
        let path = normalize(path)?;
        let mut out = vec![slash(&path)];
        if path.is_absolute()
            && let Ok(rel) = path.strip_prefix(&self.workspace)
        {
            out.push(slash(rel));
        }
        if let Some(name) = path.file_name() {
            out.push(name.to_string_lossy().into_owned());
        }
        out.dedup();
        Some(out)
    }

    /// Pure policy decision. `session` overrides the context's session type;
    /// an unrecognised name is denied outright.
    pub fn can_access_file(
        &self,
        path: impl AsRef<Path>,
        session: Option<&str>,
        ctx: &SessionContext,
    ) -> AccessDecision {
        let session_type = match session {
            None => ctx.session_type,
            Some(name) => match name.parse::<SessionType>() {
                Ok(t) => t,
                Err(_) => {
                    return AccessDecision::deny("Unknown session type - access denied", name);
                }
            },
        };
        self.evaluate(path.as_ref(), session_type)
    }

    fn evaluate(&self, path: &Path, session_type: SessionType) -> AccessDecision {
        let policy = session_type.policy();
        let Some(candidates) = self.candidates(path) else {
            return AccessDecision::deny(
                "Path escapes its base directory - access denied",
                session_type.as_str(),
            );
        };
        let on_allowlist = || {
            policy
                .allowed_files
                .iter()
                .find(|p| glob_matches(p, &candidates))
        };

        for pattern in policy.blocked_files {
            if *pattern == "*" {
                if on_allowlist().is_none() {
                    return AccessDecision::deny(
                        format!("File blocked in {session_type} session (not in allowlist)"),
                        session_type.as_str(),
                    );
                }
            } else if glob_matches(pattern, &candidates) {
                return AccessDecision::deny(
                    format!("File matches blocked pattern: {pattern}"),
                    session_type.as_str(),
                );
            }
        }

        if policy.allowed_files.contains(&"*") {
            return AccessDecision::allow("All files allowed", session_type.as_str());
        }
        match on_allowlist() {
            Some(pattern) => AccessDecision::allow(
                format!("Matches allowed pattern: {pattern}"),
                session_type.as_str(),
            ),
            None => AccessDecision::deny(
                format!("File not in allowed list for {session_type}"),
                session_type.as_str(),
            ),
        }
    }

    fn is_memory_file(&self, path: &Path) -> bool {
        self.candidates(path)
            .is_none_or(|candidates| MEMORY_FILES.iter().any(|p| glob_matches(p, &candidates)))
    }

    /// Enforcing check. Every denial is recorded first; if it cannot be
    /// recorded the call fails whatever the mode. In block mode a denial
    /// is returned as `PolicyDenied`; otherwise the decision is returned
    /// and the caller may proceed.
    pub fn check_file_access(
        &self,
        path: impl AsRef<Path>,
        session: Option<&str>,
        action: FileAction,
        ctx: &SessionContext,
    ) -> Result<AccessDecision> {
        let path = path.as_ref();
        let mut decision = self.can_access_file(path, session, ctx);

        if decision.allowed
            && action == FileAction::Write
            && let Ok(t) = decision.session_type.parse::<SessionType>()
            && !t.policy().can_write_memory
            && self.is_memory_file(path)
        {
            decision = AccessDecision::deny(
                format!("{t} session cannot write long-term memory"),
                t.as_str(),
            );
        }

        self.enforce(path, action, decision, ctx)
    }

    /// Apply the enforcement mode to a decision: allowed decisions pass,
    /// denials are recorded and then blocked, warned or logged.
    pub(crate) fn enforce(
        &self,
        path: &Path,
        action: FileAction,
        decision: AccessDecision,
        ctx: &SessionContext,
    ) -> Result<AccessDecision> {
        if decision.allowed {
            debug!("{} access to {:?}: {}", action.as_str(), path, decision.reason);
            return Ok(decision);
        }

        let blocked = ctx.mode == EnforcementMode::Block;
        self.violations.append(&Violation {
            file: path.to_string_lossy().into_owned(),
            session_type: decision.session_type.clone(),
            action,
            reason: decision.reason.clone(),
            blocked,
            timestamp: Utc::now().to_rfc3339(),
        })?;

        match ctx.mode {
            EnforcementMode::Block => {
                warn!("BLOCKED {} of {:?}: {}", action.as_str(), path, decision.reason);
                Err(GuardError::PolicyDenied {
                    reason: decision.reason,
                    session_type: decision.session_type,
                })
            }
            EnforcementMode::Warn => {
                warn!(
                    "Policy violation allowed ({} session, {} of {:?}): {}",
                    decision.session_type,
                    action.as_str(),
                    path,
                    decision.reason
                );
                Ok(decision)
            }
            EnforcementMode::LogOnly => {
                debug!("Policy violation logged: {}", decision.reason);
                Ok(decision)
            }
        }
    }

    /// Cross-check a classified file: the path policy must allow it and the
    /// session must accept its sensitivity level.
    pub fn check_classified_access(
        &self,
        path: impl AsRef<Path>,
        level: SensitivityLevel,
        session: Option<&str>,
        ctx: &SessionContext,
    ) -> AccessDecision {
        let decision = self.can_access_file(path, session, ctx);
        if !decision.allowed {
            return decision;
        }
        match decision.session_type.parse::<SessionType>() {
            Ok(t) if t.policy().allowed_levels.contains(&level) => decision,
            Ok(t) => AccessDecision::deny(
                format!("{level} content not allowed in {t} session"),
                t.as_str(),
            ),
            Err(_) => AccessDecision::deny(
                "Unknown session type - access denied",
                decision.session_type,
            ),
        }
    }

    /// Proactive check: sensitive files present in the workspace that the
    /// current (non-main) session would be denied.
    pub fn verify_isolation(&self, ctx: &SessionContext) -> Vec<IsolationIssue> {
        if ctx.session_type == SessionType::Main {
            return Vec::new();
        }

        self.sensitive_files
            .iter()
            .filter(|name| self.workspace.join(name).exists())
            .filter(|name| !self.evaluate(Path::new(name), ctx.session_type).allowed)
            .map(|name| IsolationIssue {
                severity: Severity::High,
                file: name.clone(),
                issue: format!("{name} should not be loaded in {} sessions", ctx.session_type),
                session_type: ctx.session_type,
            })
            .collect()
    }

    /// Most recent violations, oldest first.
    pub fn violations(&self, limit: usize) -> Vec<Violation> {
        self.violations.recent(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn isolator_in(dir: &Path, cap: usize) -> Isolator {
        Isolator::open(&dir.join("violations.jsonl"), None, cap, dir.join("ws"))
    }

    fn ctx(session_type: SessionType, mode: EnforcementMode) -> SessionContext {
        SessionContext::new(session_type, mode)
    }

    #[test]
    fn block_mode_denies_memory_in_group_chat_and_records_once() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 500);
        let mut c = SessionContext::default();
        c.set_enforcement_mode("block").unwrap();

        let err = iso
            .check_file_access("MEMORY.md", Some("group_chat"), FileAction::Read, &c)
            .unwrap_err();
        assert!(err.is_policy_denied());
        assert!(err.to_string().contains("group_chat"));

        let violations = iso.violations(10);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].blocked);
        assert_eq!(violations[0].session_type, "group_chat");
        assert_eq!(violations[0].reason, "File matches blocked pattern: MEMORY.md");
    }

    #[test]
    fn unknown_descriptor_is_public_and_denies_memory() {
        let hints = SessionHints {
            session_key: "webhook:zapier:42".into(),
            is_dm: false,
        };
        let detected = detect_session_type(&hints, false);
        assert_eq!(detected, SessionType::Public);

        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);
        let decision =
            iso.can_access_file("MEMORY.md", Some(detected.as_str()), &SessionContext::default());
        assert!(!decision.allowed);
    }

    #[test]
    fn detection_table() {
        let detect = |key: &str, is_dm: bool, trust: bool| {
            detect_session_type(
                &SessionHints {
                    session_key: key.into(),
                    is_dm,
                },
                trust,
            )
        };
        assert_eq!(detect("agent:main:main", false, false), SessionType::Main);
        assert_eq!(detect("agent:x:discord:123", false, false), SessionType::GroupChat);
        assert_eq!(detect("agent:x:slack:dm", true, false), SessionType::GroupChat);
        assert_eq!(detect("agent:x:slack:dm", true, true), SessionType::Main);
        assert_eq!(detect("sub-agent:build", false, false), SessionType::SubAgent);
        assert_eq!(detect("spawn:42", false, false), SessionType::SubAgent);
        assert_eq!(detect("", false, false), SessionType::Public);
    }

    #[test]
    fn hints_from_env() {
        let hints = SessionHints::from_env_with(|k| match k {
            "AGENTFORGE_SESSION_KEY" => Ok("agent:a:discord:1".into()),
            "AGENTFORGE_CHANNEL" => Ok("dm".into()),
            _ => Err(std::env::VarError::NotPresent),
        });
        assert_eq!(hints.session_key, "agent:a:discord:1");
        assert!(hints.is_dm);
        let empty = SessionHints::from_env_with(|_| Err(std::env::VarError::NotPresent));
        assert_eq!(empty, SessionHints::default());
    }

    #[test]
    fn policy_evaluation() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);
        let c = SessionContext::default();
        let check = |path: &str, session: &str| iso.can_access_file(path, Some(session), &c);

        // public: wildcard deny, allow-list only
        assert!(check("docs/guide.md", "public").allowed);
        assert!(check("README.md", "public").allowed);
        let denied = check("AGENTS.md", "public");
        assert!(!denied.allowed);
        assert!(denied.reason.contains("not in allowlist"));

        // group_chat: deny list, then allow list
        assert!(check("AGENTS.md", "group_chat").allowed);
        assert!(!check("config/prod.env", "group_chat").allowed);
        assert!(!check("id_rsa.pub", "group_chat").allowed);
        let omitted = check("src/main.rs", "group_chat");
        assert!(!omitted.allowed);
        assert!(omitted.reason.contains("not in allowed list"));

        // sub_agent and main
        assert!(check("projects/x/plan.md", "sub_agent").allowed);
        assert!(!check("USER.md", "sub_agent").allowed);
        assert!(check("MEMORY.md", "main").allowed);
        assert!(check("secrets/token", "main").allowed);

        // unknown names fail closed
        let unknown = check("README.md", "admin");
        assert!(!unknown.allowed);
        assert_eq!(unknown.reason, "Unknown session type - access denied");
        assert_eq!(unknown.session_type, "admin");
    }

    #[test]
    fn absolute_paths_inside_workspace_match_relative_globs() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);
        let doc = iso.workspace().join("docs/guide.md");
        let c = ctx(SessionType::Public, EnforcementMode::Block);
        assert!(iso.can_access_file(&doc, None, &c).allowed);
    }

    #[test]
    fn dotdot_cannot_borrow_an_allow_pattern() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);
        let c = SessionContext::default();
        let check = |path: &str, session: &str| iso.can_access_file(path, Some(session), &c);

        assert!(!check("docs/../USER.md", "public").allowed);
        assert!(!check("docs/../MEMORY.md", "group_chat").allowed);
        assert!(!check("skills/../secrets/key", "group_chat").allowed);
        assert!(check("./docs/./guide.md", "public").allowed);
        assert!(check("docs/old/../guide.md", "public").allowed);

        let escaped = check("../USER.md", "main");
        assert!(!escaped.allowed);
        assert!(escaped.reason.contains("escapes"));
        assert!(!check("docs/../../ws/README.md", "public").allowed);

        let abs = iso.workspace().join("docs/../USER.md");
        assert!(!iso.can_access_file(&abs, Some("public"), &c).allowed);
    }

    #[test]
    fn dotdot_denial_is_blocked_and_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);
        let c = ctx(SessionType::Public, EnforcementMode::Block);

        let err = iso
            .check_file_access("docs/../USER.md", None, FileAction::Read, &c)
            .unwrap_err();
        assert!(err.is_policy_denied());

        let group = ctx(SessionType::GroupChat, EnforcementMode::Block);
        let memory = "docs/../memory/2026-01-01.md";
        assert!(iso.check_file_access(memory, None, FileAction::Write, &group).is_err());
        assert_eq!(iso.violations(10).len(), 2);
    }

    #[test]
    fn warn_and_log_only_allow_but_record() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);

        for mode in [EnforcementMode::Warn, EnforcementMode::LogOnly] {
            let c = ctx(SessionType::GroupChat, mode);
            let decision = iso
                .check_file_access("USER.md", None, FileAction::Read, &c)
                .unwrap();
            assert!(!decision.allowed);
        }

        let violations = iso.violations(10);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| !v.blocked));
    }

    #[test]
    fn mode_change_is_not_retroactive() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);
        let mut c = ctx(SessionType::Public, EnforcementMode::Warn);

        assert!(iso.check_file_access("MEMORY.md", None, FileAction::Read, &c).is_ok());
        c.set_enforcement_mode("block").unwrap();
        assert!(iso.check_file_access("MEMORY.md", None, FileAction::Read, &c).is_err());

        let v = iso.violations(10);
        assert_eq!(v.iter().map(|v| v.blocked).collect::<Vec<_>>(), vec![false, true]);
    }

    #[test]
    fn strict_setters() {
        let mut c = SessionContext::default();
        assert!(matches!(
            c.set_session_type("root"),
            Err(GuardError::Configuration { .. })
        ));
        assert!(c.set_enforcement_mode("loud").is_err());
        assert_eq!(c, SessionContext::default());

        c.set_session_type("sub_agent").unwrap();
        assert_eq!(c.session_type, SessionType::SubAgent);
    }

    #[test]
    fn memory_write_needs_permission() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);
        let main = ctx(SessionType::Main, EnforcementMode::Block);
        let d = iso
            .check_file_access("memory/2026-10-01.md", None, FileAction::Write, &main)
            .unwrap();
        assert!(d.allowed);

        // sub-agents may write memory but only inside their allow-list
        let sub = ctx(SessionType::SubAgent, EnforcementMode::Warn);
        let d = iso
            .check_file_access("memory/2026-10-01.md", None, FileAction::Write, &sub)
            .unwrap();
        assert!(!d.allowed);
    }

    #[test]
    fn classified_access_checks_levels() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);
        let c = ctx(SessionType::GroupChat, EnforcementMode::Block);

        assert!(
            iso.check_classified_access("AGENTS.md", SensitivityLevel::Internal, None, &c)
                .allowed
        );
        let d = iso.check_classified_access("AGENTS.md", SensitivityLevel::Confidential, None, &c);
        assert!(!d.allowed);
        assert!(d.reason.contains("CONFIDENTIAL"));
    }

    #[test]
    fn verify_isolation_reports_present_sensitive_files() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 10);
        fs::create_dir_all(iso.workspace()).unwrap();
        fs::write(iso.workspace().join("MEMORY.md"), "notes").unwrap();

        assert!(iso.verify_isolation(&ctx(SessionType::Main, EnforcementMode::Block)).is_empty());

        let issues = iso.verify_isolation(&ctx(SessionType::GroupChat, EnforcementMode::Block));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[0].file, "MEMORY.md");

        fs::write(iso.workspace().join("USER.md"), "me").unwrap();
        let sub = ctx(SessionType::SubAgent, EnforcementMode::Block);
        assert_eq!(iso.verify_isolation(&sub).len(), 2);
    }

    #[test]
    fn violations_are_capped() {
        let tmp = tempfile::tempdir().unwrap();
        let iso = isolator_in(tmp.path(), 4);
        let c = ctx(SessionType::Public, EnforcementMode::LogOnly);
        for i in 0..9 {
            iso.check_file_access(format!("file{i}.md"), None, FileAction::Read, &c).unwrap();
        }
        let v = iso.violations(100);
        assert_eq!(v.len(), 4);
        assert_eq!(v.last().unwrap().file, "file8.md");
    }

    #[test]
    fn unrecordable_violation_is_an_error_in_every_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let store = tmp.path().join("violations.jsonl");
        fs::create_dir_all(&store).unwrap();
        let iso = Isolator::open(&store, Some(tmp.path()), 10, tmp.path());

        let c = ctx(SessionType::Public, EnforcementMode::LogOnly);
        let err = iso.check_file_access("MEMORY.md", None, FileAction::Read, &c).unwrap_err();
        assert!(matches!(err, GuardError::Storage { .. }));
    }

    #[test]
    fn session_store_round_trip_and_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session_state.json");
        let store = SessionStore::open(&path, None);

        assert_eq!(store.load_or(SessionContext::default()), SessionContext::default());

        let c = ctx(SessionType::Main, EnforcementMode::Warn);
        store.save(&c).unwrap();
        assert_eq!(store.load_or(SessionContext::default()), c);

        fs::write(&path, "nope").unwrap();
        assert_eq!(store.load_or(SessionContext::default()), SessionContext::default());
    }
}
