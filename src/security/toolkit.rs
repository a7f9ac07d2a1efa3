use std::path::Path;

use tracing::debug;

use super::audit::AuditLog;
use super::classifier::Classifier;
use super::error::Result;
use super::isolation::{
    AccessDecision, FileAction, Isolator, SessionContext, SessionHints, SessionStore, SessionType,
    detect_session_type,
};
use super::scanner::OutboundFilter;
use super::secrets::SecretTracker;
use crate::config::Config;

/// Every store opened from one [`Config`], sharing its paths and lock dir.
pub struct Toolkit {
    pub filter: OutboundFilter,
    pub classifier: Classifier,
    pub isolator: Isolator,
    pub sessions: SessionStore,
    pub audit: AuditLog,
    pub secrets: SecretTracker,
    defaults: SessionContext,
    trust_direct_messages: bool,
}

impl Toolkit {
    /// JSON/JSONL stores open lazily; the SQLite stores are created here.
    pub fn open(config: &Config) -> Result<Self> {
        let paths = &config.paths;
        let lock_dir = paths.lock_dir();
        let lock_dir = Some(lock_dir.as_path());

        let toolkit = Self {
            filter: OutboundFilter::open(
                &paths.findings_log(),
                lock_dir,
                config.scanner.findings_cap,
            ),
            classifier: Classifier::open(&paths.classifications_file(), lock_dir)
                .with_root(&paths.workspace),
            isolator: Isolator::open(
                &paths.violations_log(),
                lock_dir,
                config.isolation.violations_cap,
                &paths.workspace,
            )
            .with_sensitive_files(config.isolation.sensitive_files.clone()),
            sessions: SessionStore::open(&paths.session_state_file(), lock_dir),
            audit: AuditLog::open(&paths.audit_db())?,
            secrets: SecretTracker::open(&paths.secrets_db())?,
            defaults: config.default_context(),
            trust_direct_messages: config.security.trust_direct_messages,
        };
        debug!("Opened stores under {}", paths.state_dir.display());
        Ok(toolkit)
    }

    /// Persisted session context, falling back to the configured defaults.
    pub fn context(&self) -> SessionContext {
        self.sessions.load_or(self.defaults)
    }

    pub fn save_context(&self, ctx: &SessionContext) -> Result<()> {
        self.sessions.save(ctx)
    }

    pub fn detect(&self, hints: &SessionHints) -> SessionType {
        detect_session_type(hints, self.trust_direct_messages)
    }

    /// Policy check followed by a cross-check of the file's classification
    /// against the levels the session may see. The first denial wins and
    /// is enforced like any other violation.
    pub fn check_access(
        &self,
        path: impl AsRef<Path>,
        session: Option<&str>,
        action: FileAction,
        ctx: &SessionContext,
    ) -> Result<AccessDecision> {
        let path = path.as_ref();
        let decision = self.isolator.check_file_access(path, session, action, ctx)?;
        if !decision.allowed {
            return Ok(decision);
        }
        let level = self.classifier.classify(path);
        let classified = self.isolator.check_classified_access(path, level, session, ctx);
        self.isolator.enforce(path, action, classified, ctx)
    }
}
