//! # AgentForge Security Module
//!
//! Outbound-content guard for an agent that talks to chat platforms and
//! external services. This file is the **front door**: every public
//! type, constant and function is re-exported here.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                agentforge.rs (you are here)                     │
//! │                Public API facade & documentation                │
//! ├──────────────┬───────────────┬────────────────┬─────────────────┤
//! │ scanner.rs   │ classifier.rs │ isolation.rs   │ audit.rs        │
//! │ Findings,    │ Sensitivity   │ Session types, │ Hash-only       │
//! │ redaction,   │ overrides,    │ file policy,   │ action log      │
//! │ history      │ globs, shares │ violations     │ + hash chain    │
//! ├──────────────┴───────────────┴────────────────┴─────────────────┤
//! │ patterns.rs: category regex tables and allowlist                │
//! ├────────────────────────────────┬────────────────────────────────┤
//! │ secrets.rs: rotation inventory │ skills.rs: static skill scan   │
//! ├────────────────────────────────┴────────────────────────────────┤
//! │ toolkit.rs: all stores opened from one Config                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Model
//!
//! 1. **Fail closed**: unknown session types deny, the default context
//!    is a public session in block mode, an unreadable classification
//!    store classifies everything SECRET, and a failed history write
//!    makes `check_before_send` return `false`.
//!
//! 2. **Token-level allowlist**: benign placeholders are exempted by the
//!    matched token only. A key in the query string of an
//!    `example.com` URL is still a finding.
//!
//! 3. **Most sensitive wins**: classification globs are tried
//!    SECRET → CONFIDENTIAL → INTERNAL → PUBLIC.
//!
//! 4. **No plaintext in the audit trail**: content becomes a SHA-256
//!    hash plus a hashed prefix, and rows are hash-chained so edits and
//!    deletions show up in `verify_chain`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agentforge::Config;
//! use agentforge::security::{FileAction, NewAction, Toolkit};
//!
//! let config = Config::load()?;
//! let kit = Toolkit::open(&config)?;
//! let ctx = kit.context();
//!
//! // Before loading a file into the prompt:
//! kit.check_access("MEMORY.md", None, FileAction::Read, &ctx)?;
//!
//! // Before sending a reply:
//! let safe = kit.filter.check_before_send(&reply, Some("discord"));
//! kit.audit
//!     .log_action(NewAction::new("message").target("discord").content(&reply).success(safe))?;
//! ```
//!
//! ## File Hierarchy
//!
//! ```text
//! $XDG_DATA_HOME/agentforge/
//! ├── classifications.json        # Overrides + glob table
//! └── secrets.sqlite              # Rotation inventory
//! $XDG_STATE_HOME/agentforge/
//! ├── outbound_findings.jsonl     # Last 1000 findings
//! ├── isolation_violations.jsonl  # Last 500 violations
//! ├── session_state.json          # CLI session context
//! └── audit.sqlite                # Action trail
//! ```
//!
//! ## Threat Model
//!
//! | Threat | Defense Layer |
//! |--------|--------------|
//! | Agent pastes an API key into a group chat | Scanner blocks CRITICAL findings |
//! | Group chat session reads `MEMORY.md` | Session policy deny list |
//! | Misconfigured or unknown session name | Fail-closed deny |
//! | `docs/../USER.md` borrowing an allow pattern | Paths normalized before matching |
//! | Confidential doc shared in a public channel | `can_share` decision table |
//! | Audit rows edited after the fact | Hash chain |
//! | Third-party skill exfiltrates data | Skill checker rules |

// ── Errors ──────────────────────────────────────────────────────────

pub use super::error::{GuardError, Result, StorageError};

// ── Pattern Library & Scanner ───────────────────────────────────────

pub use super::patterns::{Category, Severity, is_allowlisted};
pub use super::scanner::{
    DEFAULT_FINDINGS_CAP, Finding, FindingsReport, OutboundFilter, ScanResult, Scanner, Summary,
};

// ── Classifier ──────────────────────────────────────────────────────

pub use super::classifier::{
    ClassificationStore, Classifier, ContentAssessment, HandlingRule, Override, SensitivityLevel,
    ShareContext, ShareDecision, check_content, share_decision,
};

// ── Session Isolation ───────────────────────────────────────────────

pub use super::isolation::{
    AccessDecision, DEFAULT_SENSITIVE_FILES, DEFAULT_VIOLATIONS_CAP, EnforcementMode, FileAction,
    IsolationIssue, Isolator, SessionContext, SessionHints, SessionPolicy, SessionStore,
    SessionType, Violation, detect_session_type,
};

// ── Audit Trail ─────────────────────────────────────────────────────

pub use super::audit::{AuditEntry, AuditLog, AuditStats, GENESIS_HASH, NewAction};

// ── Secret Rotation ─────────────────────────────────────────────────

pub use super::secrets::{
    DEFAULT_WARNING_DAYS, DueItem, NewSecret, RotationRecord, RotationStatus, SecretTracker,
    SecretType, TrackedSecret,
};

// ── Skill Safety ────────────────────────────────────────────────────

pub use super::skills::{
    DEFAULT_MAX_FINDINGS, SkillFinding, SkillRule, count_by_severity, default_scan_paths, exceeds,
    scan_paths,
};

// ── Stores ──────────────────────────────────────────────────────────

pub use super::store::{BoundedLog, JsonDocument};
pub use super::toolkit::Toolkit;
