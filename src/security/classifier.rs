//! Data classification.
//!
//! Every path resolves to exactly one [`SensitivityLevel`]:
//!
//! 1. explicit override for the absolute path
//! 2. first glob match, levels tried SECRET → CONFIDENTIAL → INTERNAL → PUBLIC
//! 3. INTERNAL
//!
//! Paths are normalized lexically first (`.` and `..` folded). Globs use
//! `fnmatch` semantics (`*` crosses `/`) and are tested against the
//! absolute path, the path relative to the workspace root, the path as
//! given and the bare filename.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::Utc;
use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{GuardError, Result};
use super::pathnorm::{absolute, normalize, slash};
use super::store::JsonDocument;
use super::walk::walk_files;
use crate::concurrency::StoreLock;

/// Four-tier sensitivity lattice. `Ord` puts `Secret` on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensitivityLevel {
    Public,
    Internal,
    Confidential,
    Secret,
}

/// Handling rule attached to a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlingRule {
    NeverShare,
    EncryptAtRest,
    NoLogs,
    NoGroupChats,
    NoPublicPosts,
    AuditAccess,
    SanitizeBeforeShare,
    CheckForSecrets,
}

impl HandlingRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NeverShare => "never_share",
            Self::EncryptAtRest => "encrypt_at_rest",
            Self::NoLogs => "no_logs",
            Self::NoGroupChats => "no_group_chats",
            Self::NoPublicPosts => "no_public_posts",
            Self::AuditAccess => "audit_access",
            Self::SanitizeBeforeShare => "sanitize_before_share",
            Self::CheckForSecrets => "check_for_secrets",
        }
    }
}

impl SensitivityLevel {
    /// Most sensitive first; also the glob evaluation order.
    pub const DESCENDING: [SensitivityLevel; 4] = [
        Self::Secret,
        Self::Confidential,
        Self::Internal,
        Self::Public,
    ];

    const NAMES: [&'static str; 4] = ["SECRET", "CONFIDENTIAL", "INTERNAL", "PUBLIC"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Secret => "SECRET",
            Self::Confidential => "CONFIDENTIAL",
            Self::Internal => "INTERNAL",
            Self::Public => "PUBLIC",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Secret => "Highly sensitive - API keys, passwords, credentials",
            Self::Confidential => "Personal/private - memory files, personal notes",
            Self::Internal => "Internal use - code, configs, project files",
            Self::Public => "Safe to share - public docs, open source",
        }
    }

    pub fn rules(self) -> &'static [HandlingRule] {
        use HandlingRule::*;
        match self {
            Self::Secret => &[NeverShare, EncryptAtRest, NoLogs],
            Self::Confidential => &[NoGroupChats, NoPublicPosts, AuditAccess],
            Self::Internal => &[SanitizeBeforeShare, CheckForSecrets],
            Self::Public => &[],
        }
    }

    pub fn has_rule(self, rule: HandlingRule) -> bool {
        self.rules().contains(&rule)
    }
}

impl fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensitivityLevel {
    type Err = GuardError;

    /// Strict: unknown names are a configuration error, never coerced.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SECRET" => Ok(Self::Secret),
            "CONFIDENTIAL" => Ok(Self::Confidential),
            "INTERNAL" => Ok(Self::Internal),
            "PUBLIC" => Ok(Self::Public),
            _ => Err(GuardError::configuration(
                "classification level",
                s,
                &Self::NAMES,
            )),
        }
    }
}

/// Destination a file is about to be shared to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareContext {
    Public,
    GroupChat,
    DirectMessage,
    Internal,
}

impl ShareContext {
    /// Lenient parse for destinations: anything unrecognised is `Public`.
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "group_chat" => Self::GroupChat,
            "direct_message" | "dm" => Self::DirectMessage,
            "internal" => Self::Internal,
            _ => Self::Public,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::GroupChat => "group_chat",
            Self::DirectMessage => "direct_message",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareDecision {
    pub allowed: bool,
    pub level: SensitivityLevel,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentAssessment {
    pub suggested: SensitivityLevel,
    /// 0–100.
    pub confidence: u8,
    pub indicators: BTreeMap<SensitivityLevel, u32>,
}

/// Persisted override for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub level: SensitivityLevel,
    pub set_date: String,
    #[serde(default)]
    pub auto: bool,
}

/// On-disk classification store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationStore {
    #[serde(default)]
    pub files: BTreeMap<String, Override>,
    #[serde(default = "default_patterns")]
    pub patterns: BTreeMap<SensitivityLevel, Vec<String>>,
}

impl Default for ClassificationStore {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            patterns: default_patterns(),
        }
    }
}

fn default_patterns() -> BTreeMap<SensitivityLevel, Vec<String>> {
    let table: [(SensitivityLevel, &[&str]); 4] = [
        (
            SensitivityLevel::Secret,
            &[
                "secrets/*",
                "*.env",
                ".env*",
                "**/oauth*.json",
                "**/credentials*.json",
                "**/api_key*",
                "**/*_secret*",
            ],
        ),
        (
            SensitivityLevel::Confidential,
            &[
                "MEMORY.md",
                "memory/*.md",
                "USER.md",
                "SOUL.md",
                "**/relationships*",
                "**/personal/*",
                "**/*private*",
            ],
        ),
        (
            SensitivityLevel::Internal,
            &[
                "AGENTS.md",
                "TOOLS.md",
                "HEARTBEAT.md",
                "tools/**",
                "projects/*",
                "*.py",
                "*.js",
                "*.ts",
            ],
        ),
        (
            SensitivityLevel::Public,
            &["README.md", "LICENSE*", "docs/*", "*.txt"],
        ),
    ];

    table
        .into_iter()
        .map(|(level, globs)| (level, globs.iter().map(|g| g.to_string()).collect()))
        .collect()
}

/// fnmatch options: `*` crosses `/`, leading dots are ordinary, case matters.
pub(crate) const FNMATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Whether `glob` matches any of `candidates`. Invalid globs match nothing.
pub(crate) fn glob_matches(glob: &str, candidates: &[String]) -> bool {
    match Pattern::new(glob) {
        Ok(pattern) => candidates
            .iter()
            .any(|c| pattern.matches_with(c, FNMATCH)),
        Err(e) => {
            warn!("Ignoring invalid glob '{}': {}", glob, e);
            false
        }
    }
}

struct Indicator {
    level: SensitivityLevel,
    weight: u32,
    patterns: Vec<Regex>,
}

static INDICATORS: LazyLock<Vec<Indicator>> = LazyLock::new(|| {
    let build = |level, weight, case_insensitive: bool, sources: &[&str]| Indicator {
        level,
        weight,
        patterns: sources
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(case_insensitive)
                    .build()
                    .expect("hardcoded regex must compile")
            })
            .collect(),
    };

    vec![
        build(
            SensitivityLevel::Secret,
            2,
            true,
            &[
                r"api[_-]?key",
                r"password",
                r"secret",
                r"token",
                r"sk-[a-zA-Z0-9]+",
                r"Bearer ",
                r"credential",
            ],
        ),
        build(
            SensitivityLevel::Confidential,
            1,
            true,
            &[
                r"personal",
                r"private",
                r"memory",
                r"diary",
                r"@[a-zA-Z]+\.(com|org|net)",
                r"phone",
                r"address",
            ],
        ),
        build(
            SensitivityLevel::Internal,
            1,
            false,
            &[
                r"TODO",
                r"FIXME",
                r"internal",
                r"def ",
                r"function",
                r"import ",
                r"require\(",
            ],
        ),
        build(
            SensitivityLevel::Public,
            1,
            true,
            &[
                r"MIT License",
                r"Apache License",
                r"public domain",
                r"documentation",
                r"README",
            ],
        ),
    ]
});

/// Score `text` against the content indicators. The highest score wins;
/// ties go to the more sensitive level; no score at all is INTERNAL with
/// zero confidence.
pub fn check_content(text: &str) -> ContentAssessment {
    let mut indicators = BTreeMap::new();
    for indicator in INDICATORS.iter() {
        let hits = indicator.patterns.iter().filter(|re| re.is_match(text)).count() as u32;
        indicators.insert(indicator.level, hits * indicator.weight);
    }

    let mut best = (SensitivityLevel::Internal, 0u32);
    for level in SensitivityLevel::DESCENDING {
        let score = indicators.get(&level).copied().unwrap_or(0);
        if score > best.1 {
            best = (level, score);
        }
    }

    ContentAssessment {
        suggested: best.0,
        confidence: (best.1 * 20).min(100) as u8,
        indicators,
    }
}

/// File classifier backed by the classification store.
#[derive(Debug, Clone)]
pub struct Classifier {
    store: JsonDocument<ClassificationStore>,
    root: Option<PathBuf>,
}

impl Classifier {
    pub fn new(store: JsonDocument<ClassificationStore>) -> Self {
        Self { store, root: None }
    }

    /// Classifier backed by `store`, with its lock file in `lock_dir`.
    pub fn open(store: &Path, lock_dir: Option<&Path>) -> Self {
        Self::new(JsonDocument::new(store, StoreLock::for_store(store, lock_dir)))
    }

    /// Also match globs against paths relative to `root` (the workspace).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(absolute(&root.into()));
        self
    }

    /// Current store contents, defaults when the store does not exist.
    pub fn load(&self) -> Result<ClassificationStore> {
        Ok(self.store.load()?.unwrap_or_default())
    }

    /// Resolve the level for `path`. An unreadable store classifies
    /// everything SECRET: an override it may hold cannot be ruled out.
    pub fn classify(&self, path: impl AsRef<Path>) -> SensitivityLevel {
        match self.load() {
            Ok(store) => self.resolve(&store, path.as_ref()),
            Err(e) => {
                warn!("Classification store unreadable, treating as SECRET: {}", e);
                SensitivityLevel::Secret
            }
        }
    }

    fn resolve(&self, store: &ClassificationStore, path: &Path) -> SensitivityLevel {
        let abs = absolute(path);
        let key = slash(&abs);

        if let Some(o) = store.files.get(&key) {
            debug!("{} classified {} by override", key, o.level);
            return o.level;
        }

        let candidates = self.candidates(path, &abs);
        for level in SensitivityLevel::DESCENDING {
            let Some(globs) = store.patterns.get(&level) else {
                continue;
            };
            if let Some(glob) = globs.iter().find(|g| glob_matches(g, &candidates)) {
                debug!("{} classified {} by pattern '{}'", key, level, glob);
                return level;
            }
        }

        SensitivityLevel::Internal
    }

    fn candidates(&self, given: &Path, abs: &Path) -> Vec<String> {
        let mut out = vec![slash(abs)];
        if let Some(root) = &self.root
            && let Ok(rel) = abs.strip_prefix(root)
        {
            out.push(slash(rel));
        }
        if let Some(given) = normalize(given) {
            out.push(slash(&given));
        }
        if let Some(name) = abs.file_name() {
            out.push(name.to_string_lossy().into_owned());
        }
        out.dedup();
        out
    }

    /// Persist an override for `path` and return the level.
    pub fn set_level(
        &self,
        path: impl AsRef<Path>,
        level: SensitivityLevel,
    ) -> Result<SensitivityLevel> {
        let key = slash(&absolute(path.as_ref()));
        self.store.update(ClassificationStore::default, |store| {
            store.files.insert(
                key.clone(),
                Override {
                    level,
                    set_date: Utc::now().to_rfc3339(),
                    auto: false,
                },
            );
        })?;
        info!("Classified {} as {}", key, level);
        Ok(level)
    }

    /// Register a glob under `level`. Returns `false` if it was already there.
    pub fn add_pattern(&self, level: SensitivityLevel, glob: &str) -> Result<bool> {
        if let Err(e) = Pattern::new(glob) {
            return Err(GuardError::Configuration {
                kind: "glob pattern",
                value: glob.to_string(),
                expected: e.msg.to_string(),
            });
        }

        let added = self.store.update(ClassificationStore::default, |store| {
            let globs = store.patterns.entry(level).or_default();
            if globs.iter().any(|g| g == glob) {
                false
            } else {
                globs.push(glob.to_string());
                true
            }
        })?;
        if added {
            info!("Added pattern '{}' to {}", glob, level);
        }
        Ok(added)
    }

    /// Whether `path` may be shared into `context`.
    pub fn can_share(&self, path: impl AsRef<Path>, context: ShareContext) -> ShareDecision {
        let level = self.classify(path);
        share_decision(level, context)
    }

    /// Classify every file under `dir`, keyed by level. Paths are relative
    /// to `dir`.
    pub fn list_by_level(
        &self,
        dir: &Path,
        filter: Option<SensitivityLevel>,
    ) -> Result<BTreeMap<SensitivityLevel, Vec<String>>> {
        let store = self.load()?;
        let mut out: BTreeMap<SensitivityLevel, Vec<String>> = BTreeMap::new();

        for file in walk_files(dir, &[]) {
            let level = self.resolve(&store, &file);
            if filter.is_some_and(|f| f != level) {
                continue;
            }
            let rel = file.strip_prefix(dir).unwrap_or(&file);
            out.entry(level).or_default().push(slash(rel));
        }
        Ok(out)
    }
}

/// Share table: rows are contexts, columns levels.
pub fn share_decision(level: SensitivityLevel, context: ShareContext) -> ShareDecision {
    let mut allowed = true;
    let mut warnings = Vec::new();

    match context {
        ShareContext::Public => {
            if level != SensitivityLevel::Public {
                allowed = false;
                warnings.push(format!("Cannot share {level} files publicly"));
            }
        }
        ShareContext::GroupChat => {
            if level.has_rule(HandlingRule::NeverShare) {
                allowed = false;
                warnings.push("SECRET files cannot be shared".to_string());
            } else if level.has_rule(HandlingRule::NoGroupChats) {
                allowed = false;
                warnings.push(format!("Cannot share {level} files in group chats"));
            } else if level.has_rule(HandlingRule::SanitizeBeforeShare) {
                warnings.push("Should sanitize before sharing".to_string());
            }
        }
        ShareContext::DirectMessage => {
            if level.has_rule(HandlingRule::NeverShare) {
                allowed = false;
                warnings.push("SECRET files should not be shared even in DMs".to_string());
            } else if level.has_rule(HandlingRule::AuditAccess) {
                warnings.push(format!("{level} file shared in a DM; access is audited"));
            } else if level.has_rule(HandlingRule::SanitizeBeforeShare) {
                warnings.push("Should sanitize before sharing".to_string());
            }
        }
        ShareContext::Internal => {}
    }

    ShareDecision {
        allowed,
        level,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn classifier_in(dir: &Path) -> Classifier {
        Classifier::open(&dir.join("classifications.json"), None)
    }

    #[test]
    fn memory_file_is_confidential_and_not_shareable_in_groups() {
        let tmp = tempfile::tempdir().unwrap();
        let c = classifier_in(tmp.path());

        assert_eq!(c.classify("MEMORY.md"), SensitivityLevel::Confidential);
        let decision = c.can_share("MEMORY.md", ShareContext::GroupChat);
        assert!(!decision.allowed);
        assert_eq!(decision.level, SensitivityLevel::Confidential);
        assert!(decision.warnings[0].contains("group chats"));
    }

    #[test]
    fn override_beats_patterns() {
        let tmp = tempfile::tempdir().unwrap();
        let c = classifier_in(tmp.path());
        let file = tmp.path().join("docs/README.md");

        assert_eq!(c.classify(&file), SensitivityLevel::Public);
        c.set_level(&file, SensitivityLevel::Secret).unwrap();
        for _ in 0..3 {
            assert_eq!(c.classify(&file), SensitivityLevel::Secret);
        }

        // A fresh handle on the same store sees the override
        assert_eq!(classifier_in(tmp.path()).classify(&file), SensitivityLevel::Secret);
    }

    #[test]
    fn most_sensitive_pattern_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let c = classifier_in(tmp.path()).with_root(tmp.path());

        // tools/** is INTERNAL but *.env is SECRET
        assert_eq!(
            c.classify(tmp.path().join("tools/deploy/prod.env")),
            SensitivityLevel::Secret
        );
        assert_eq!(c.classify(tmp.path().join("tools/run.sh")), SensitivityLevel::Internal);
        assert_eq!(c.classify(tmp.path().join("secrets/token.txt")), SensitivityLevel::Secret);
        assert_eq!(c.classify(tmp.path().join("notes.txt")), SensitivityLevel::Public);
        assert_eq!(c.classify(tmp.path().join("data.bin")), SensitivityLevel::Internal);
    }

    #[test]
    fn relative_form_is_a_candidate() {
        let tmp = tempfile::tempdir().unwrap();
        let c = classifier_in(tmp.path());
        assert_eq!(c.classify("memory/2026-01-01.md"), SensitivityLevel::Confidential);
        assert_eq!(c.classify("docs/guide.md"), SensitivityLevel::Public);
    }

    #[test]
    fn dotdot_spellings_resolve_to_the_real_file() {
        let tmp = tempfile::tempdir().unwrap();
        let c = classifier_in(tmp.path());

        assert_eq!(c.classify("docs/../secrets/api.key"), SensitivityLevel::Secret);
        assert!(!c.can_share("docs/../secrets/api.key", ShareContext::Public).allowed);
        assert_eq!(c.classify("./docs/./guide.md"), SensitivityLevel::Public);
        assert_eq!(c.classify("docs/../MEMORY.md"), SensitivityLevel::Confidential);
    }

    #[test]
    fn override_applies_to_every_spelling() {
        let tmp = tempfile::tempdir().unwrap();
        let c = classifier_in(tmp.path());

        c.set_level("notes/plan.md", SensitivityLevel::Secret).unwrap();
        assert_eq!(c.classify("notes/../notes/plan.md"), SensitivityLevel::Secret);
        assert_eq!(c.classify("./notes/plan.md"), SensitivityLevel::Secret);

        let abs = tmp.path().join("ws/docs/x.md");
        c.set_level(tmp.path().join("ws/./tmp/../docs/x.md"), SensitivityLevel::Confidential)
            .unwrap();
        assert_eq!(c.classify(&abs), SensitivityLevel::Confidential);
        assert_eq!(c.load().unwrap().files.len(), 2);
    }

    #[test]
    fn add_pattern_validates_and_dedups() {
        let tmp = tempfile::tempdir().unwrap();
        let c = classifier_in(tmp.path());

        assert!(c.add_pattern(SensitivityLevel::Secret, "*.vault").unwrap());
        assert!(!c.add_pattern(SensitivityLevel::Secret, "*.vault").unwrap());
        assert_eq!(c.classify("prod.vault"), SensitivityLevel::Secret);

        let err = c.add_pattern(SensitivityLevel::Public, "a/**b").unwrap_err();
        assert!(matches!(err, GuardError::Configuration { .. }));
    }

    #[test]
    fn corrupted_store_fails_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let c = classifier_in(tmp.path());
        fs::write(tmp.path().join("classifications.json"), "{broken").unwrap();

        assert_eq!(c.classify("README.md"), SensitivityLevel::Secret);
        assert!(c.set_level("README.md", SensitivityLevel::Public).is_err());
    }

    #[test]
    fn share_table() {
        use SensitivityLevel::*;
        use ShareContext as Ctx;

        let allowed = |level, ctx| share_decision(level, ctx).allowed;

        for level in [Secret, Confidential, Internal] {
            assert!(!allowed(level, Ctx::Public));
        }
        assert!(allowed(Public, Ctx::Public));

        assert!(!allowed(Secret, Ctx::GroupChat));
        assert!(!allowed(Confidential, Ctx::GroupChat));
        let internal_group = share_decision(Internal, Ctx::GroupChat);
        assert!(internal_group.allowed);
        assert_eq!(internal_group.warnings.len(), 1);

        assert!(!allowed(Secret, Ctx::DirectMessage));
        let conf_dm = share_decision(Confidential, Ctx::DirectMessage);
        assert!(conf_dm.allowed && !conf_dm.warnings.is_empty());
        assert!(share_decision(Public, Ctx::DirectMessage).warnings.is_empty());

        for level in SensitivityLevel::DESCENDING {
            assert!(allowed(level, Ctx::Internal));
        }
    }

    #[test]
    fn unknown_share_context_is_public() {
        assert_eq!(ShareContext::resolve("twitter"), ShareContext::Public);
        assert_eq!(ShareContext::resolve("group_chat"), ShareContext::GroupChat);
        assert_eq!(ShareContext::resolve("DM"), ShareContext::DirectMessage);
    }

    #[test]
    fn level_parse_is_strict() {
        assert_eq!("secret".parse::<SensitivityLevel>().unwrap(), SensitivityLevel::Secret);
        assert!("TOP_SECRET".parse::<SensitivityLevel>().is_err());
        assert!(SensitivityLevel::Secret > SensitivityLevel::Confidential);
        assert!(SensitivityLevel::Internal > SensitivityLevel::Public);
    }

    #[test]
    fn content_scoring() {
        let secret = check_content("password=hunter2 and the api_key");
        assert_eq!(secret.suggested, SensitivityLevel::Secret);
        assert_eq!(secret.confidence, 80);

        let nothing = check_content("the quick brown fox");
        assert_eq!(nothing.suggested, SensitivityLevel::Internal);
        assert_eq!(nothing.confidence, 0);

        // One CONFIDENTIAL hit and one PUBLIC hit tie; the more sensitive wins
        let tie = check_content("see the README for my diary");
        assert_eq!(tie.indicators[&SensitivityLevel::Confidential], 1);
        assert_eq!(tie.indicators[&SensitivityLevel::Public], 1);
        assert_eq!(tie.suggested, SensitivityLevel::Confidential);

        // INTERNAL indicators are case-sensitive
        assert_eq!(check_content("todo").indicators[&SensitivityLevel::Internal], 0);
    }

    #[test]
    fn list_by_level_groups_files() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = tmp.path().join("ws");
        fs::create_dir_all(ws.join("docs")).unwrap();
        fs::write(ws.join("MEMORY.md"), "x").unwrap();
        fs::write(ws.join("docs/guide.md"), "x").unwrap();
        fs::write(ws.join("main.py"), "x").unwrap();

        let c = classifier_in(tmp.path()).with_root(&ws);
        let all = c.list_by_level(&ws, None).unwrap();
        assert_eq!(all[&SensitivityLevel::Confidential], vec!["MEMORY.md"]);
        assert_eq!(all[&SensitivityLevel::Public], vec!["docs/guide.md"]);
        assert_eq!(all[&SensitivityLevel::Internal], vec!["main.py"]);

        let only = c.list_by_level(&ws, Some(SensitivityLevel::Public)).unwrap();
        assert_eq!(only.len(), 1);
    }
}
