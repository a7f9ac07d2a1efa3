//! Static review of third-party skill directories.
//!
//! Line-oriented regex rules flag network exfiltration, dynamic
//! execution, destructive commands and embedded secret material. This is
//! a review aid, not a sandbox: a clean report proves nothing.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use super::patterns::Severity;
use super::walk::walk_files;

/// Default cap on reported findings.
pub const DEFAULT_MAX_FINDINGS: usize = 2000;

const SNIPPET_CHARS: usize = 300;

pub const SCAN_EXTENSIONS: &[&str] = &[
    "md", "py", "js", "ts", "json", "yaml", "yml", "ps1", "sh", "bat",
];

pub const IGNORE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    ".next",
    ".venv",
    "venv",
    "__pycache__",
];

pub struct SkillRule {
    pub id: &'static str,
    pub severity: Severity,
    pub message: &'static str,
    pub pattern: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillFinding {
    pub severity: Severity,
    pub rule_id: &'static str,
    pub message: String,
    pub path: String,
    pub line: Option<usize>,
    pub snippet: Option<String>,
}

impl SkillFinding {
    /// `path:line`, or just the path for file-level findings.
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.path, line),
            None => self.path.clone(),
        }
    }
}

fn rule(
    id: &'static str,
    severity: Severity,
    pattern: &str,
    case_insensitive: bool,
    message: &'static str,
) -> SkillRule {
    SkillRule {
        id,
        severity,
        message,
        pattern: RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .expect("hardcoded regex must compile"),
    }
}

pub static RULES: LazyLock<Vec<SkillRule>> = LazyLock::new(|| {
    use Severity::{High, Low, Medium};
    vec![
        // No look-behind in `regex`: the leading class rejects `obj.eval(`.
        rule(
            "EXEC_EVAL",
            High,
            r"(?:^|[^.])\b(?:eval|exec)\s*\(",
            true,
            "Dynamic code execution (eval/exec)",
        ),
        rule(
            "SUBPROCESS_SHELL",
            High,
            r"\b(?:subprocess\.(?:Popen|run|call)|os\.system)\b",
            true,
            "Shell execution (subprocess/os.system)",
        ),
        rule(
            "POWERSHELL_ENCODED",
            High,
            r"-EncodedCommand\b|-enc\b",
            true,
            "PowerShell encoded command flag",
        ),
        rule(
            "DESTRUCTIVE_CMD",
            High,
            r"\b(?:rm\s+-rf|del\s+/f|Remove-Item\s+-Recurse\s+-Force|diskpart\b|shutdown\b)\b",
            true,
            "Potentially destructive command",
        ),
        rule(
            "NETWORK_TOOL",
            Medium,
            r"\b(?:curl|wget|Invoke-WebRequest|iwr|Invoke-RestMethod|irm)\b",
            true,
            "Direct network tool usage",
        ),
        rule(
            "HTTP_LIB",
            Medium,
            r"\b(?:requests\.|httpx\.|urllib\.|fetch\(|axios\b)",
            false,
            "HTTP client usage",
        ),
        rule(
            "SECRET_BEARER",
            High,
            r"Bearer\s+[A-Za-z0-9\-_.=]{10,}",
            false,
            "Bearer token-like string present",
        ),
        rule(
            "SECRET_OPENAI",
            High,
            r"\bsk-[A-Za-z0-9]{10,}",
            false,
            "OpenAI-style API key pattern present",
        ),
        rule(
            "SECRET_PRIVATE_KEY",
            High,
            r"-----BEGIN (?:RSA|EC|OPENSSH|PRIVATE) KEY-----",
            false,
            "PEM private key material present",
        ),
        rule(
            "SECRET_DBURL",
            High,
            r"\bDATABASE_URL\b|postgres(?:ql)?://|mysql://|sqlite:///",
            false,
            "Database URL / DATABASE_URL reference",
        ),
        rule(
            "SUSPICIOUS_BASE64",
            Low,
            r"\bbase64\b",
            true,
            "Base64 usage (often used for obfuscation; review)",
        ),
    ]
});

static WINDOWS_ABS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[A-Za-z]:\\[^\s"']+"#).expect("hardcoded regex must compile")
});

/// `<workspace>/skills` plus an installed-skills directory, existing
/// directories only, deduplicated.
pub fn default_scan_paths(workspace: &Path, installed: Option<&Path>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    let candidates =
        std::iter::once(workspace.join("skills")).chain(installed.map(Path::to_path_buf));
    for p in candidates {
        let resolved = fs::canonicalize(&p).unwrap_or(p);
        if resolved.exists() && !out.contains(&resolved) {
            out.push(resolved);
        }
    }
    out
}

fn has_scan_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SCAN_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)))
}

/// Files under `paths` that the checker reads, in walk order.
pub fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for base in paths {
        if base.is_file() {
            if has_scan_extension(base) {
                files.push(base.clone());
            }
        } else if base.is_dir() {
            files.extend(
                walk_files(base, IGNORE_DIRS)
                    .into_iter()
                    .filter(|p| has_scan_extension(p)),
            );
        } else {
            debug!("Skipping missing scan path {}", base.display());
        }
    }
    files
}

fn snippet(line: &str) -> String {
    line.trim().chars().take(SNIPPET_CHARS).collect()
}

/// All findings for one file. Unreadable files yield a single READ_ERROR.
pub fn scan_file(path: &Path, workspace: &Path) -> Vec<SkillFinding> {
    let display = path.display().to_string();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return vec![SkillFinding {
                severity: Severity::Medium,
                rule_id: "READ_ERROR",
                message: format!("Could not read file: {}", e),
                path: display,
                line: None,
                snippet: None,
            }];
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let mut findings = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        for rule in RULES.iter() {
            if rule.pattern.is_match(line) {
                findings.push(SkillFinding {
                    severity: rule.severity,
                    rule_id: rule.id,
                    message: rule.message.to_string(),
                    path: display.clone(),
                    line: Some(idx + 1),
                    snippet: Some(snippet(line)),
                });
            }
        }
    }

    let workspace = workspace.to_string_lossy().to_lowercase();
    for (idx, line) in lines.iter().enumerate() {
        for m in WINDOWS_ABS_PATH.find_iter(line) {
            if !m.as_str().to_lowercase().contains(&workspace) {
                findings.push(SkillFinding {
                    severity: Severity::Low,
                    rule_id: "ABS_PATH_OUTSIDE_WORKSPACE",
                    message: "Absolute path appears outside current workspace; \
                              review for portability/safety"
                        .to_string(),
                    path: display.clone(),
                    line: Some(idx + 1),
                    snippet: Some(snippet(line)),
                });
            }
        }
    }

    findings
}

/// Scan every eligible file under `paths`, stopping once `max` findings
/// have been collected.
pub fn scan_paths(paths: &[PathBuf], workspace: &Path, max: usize) -> Vec<SkillFinding> {
    let mut findings = Vec::new();
    for file in collect_files(paths) {
        findings.extend(scan_file(&file, workspace));
        if findings.len() >= max {
            findings.truncate(max);
            break;
        }
    }
    debug!("Skill scan produced {} findings", findings.len());
    findings
}

/// Whether any finding is at or above `threshold`.
pub fn exceeds(findings: &[SkillFinding], threshold: Severity) -> bool {
    findings.iter().any(|f| f.severity >= threshold)
}

pub fn count_by_severity(findings: &[SkillFinding]) -> BTreeMap<Severity, usize> {
    let mut counts = BTreeMap::new();
    for f in findings {
        *counts.entry(f.severity).or_insert(0) += 1;
    }
    counts
}
