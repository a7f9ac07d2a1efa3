//! Pattern library for outbound content scanning.
//!
//! Each [`Category`] owns a fixed list of regular expressions and a fixed
//! [`Severity`]. Patterns deliberately overshoot: a blocked benign string
//! costs far less than a leaked credential.
//!
//! All patterns are compiled case-insensitively with the `regex` crate,
//! whose matcher runs in time linear in the input, so adversarial
//! payloads cannot trigger catastrophic backtracking.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::error::GuardError;

/// How bad it is for a finding to leave the trust boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Whether a finding of this severity makes a payload unsafe to send.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = GuardError;

    /// Case-insensitive: `high` and `HIGH` both parse.
    fn from_str(s: &str) -> Result<Self, GuardError> {
        [Self::Low, Self::Medium, Self::High, Self::Critical]
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                GuardError::configuration("severity", s, &["low", "medium", "high", "critical"])
            })
    }
}

/// Kind of sensitive data a pattern detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Credential-like tokens: API keys, bearer tokens, JWTs.
    ApiKey,
    /// User home directory paths on Windows, macOS, Linux and UNC shares.
    FilePath,
    /// Connection strings for databases and caches.
    DatabaseUrl,
    /// SSNs, card numbers, email addresses, phone numbers.
    PersonalInfo,
    /// References to the agent's own private files.
    InternalReference,
    /// RFC 1918 private addresses.
    IpAddress,
}

impl Category {
    /// Every category, in scan order.
    pub const ALL: [Category; 6] = [
        Self::ApiKey,
        Self::FilePath,
        Self::DatabaseUrl,
        Self::PersonalInfo,
        Self::InternalReference,
        Self::IpAddress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::FilePath => "file_path",
            Self::DatabaseUrl => "database_url",
            Self::PersonalInfo => "personal_info",
            Self::InternalReference => "internal_reference",
            Self::IpAddress => "ip_address",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::ApiKey | Self::DatabaseUrl => Severity::Critical,
            Self::FilePath | Self::PersonalInfo => Severity::High,
            Self::InternalReference => Severity::Medium,
            Self::IpAddress => Severity::Low,
        }
    }

    /// Replacement text for a redacted span, e.g. `[REDACTED-API_KEY]`.
    pub fn redaction_marker(self) -> String {
        format!("[REDACTED-{}]", self.as_str().to_uppercase())
    }

    /// Pattern sources, in the same order as [`Category::patterns`].
    pub fn pattern_sources(self) -> &'static [&'static str] {
        match self {
            Self::ApiKey => API_KEY_PATTERNS,
            Self::FilePath => FILE_PATH_PATTERNS,
            Self::DatabaseUrl => DATABASE_URL_PATTERNS,
            Self::PersonalInfo => PERSONAL_INFO_PATTERNS,
            Self::InternalReference => INTERNAL_REFERENCE_PATTERNS,
            Self::IpAddress => IP_ADDRESS_PATTERNS,
        }
    }

    /// Compiled patterns for this category.
    pub fn patterns(self) -> &'static [Regex] {
        &COMPILED[self as usize]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const API_KEY_PATTERNS: &[&str] = &[
    r"sk-[a-zA-Z0-9]{20,}",                                    // OpenAI
    r"sk_live_[a-zA-Z0-9]+",                                   // Stripe live
    r"sk_test_[a-zA-Z0-9]+",                                   // Stripe test
    r"ghp_[a-zA-Z0-9]{36}",                                    // GitHub PAT
    r"gho_[a-zA-Z0-9]{36}",                                    // GitHub OAuth
    r"xoxb-[a-zA-Z0-9-]+",                                     // Slack bot
    r"xoxp-[a-zA-Z0-9-]+",                                     // Slack user
    r"Bearer\s+[a-zA-Z0-9_\-.=]+",                             // Bearer / JWT
    r#"api[_-]?key["\s:=]+[a-zA-Z0-9_\-]{16,}"#,               // Generic API key
    r"ANTHROPIC[_-]?API[_-]?KEY",                              // Anthropic
    r"moltbook_sk_[a-zA-Z0-9_\-]+",                            // Moltbook
    r"AKIA[0-9A-Z]{16}",                                       // AWS access key id
    r"AIza[0-9A-Za-z\-_]{35}",                                 // Google Cloud
    r"[MN][A-Za-z\d]{23,}\.[A-Za-z\d_-]{6}\.[A-Za-z\d_-]{27}", // Discord
    r"npm_[A-Za-z0-9]{36}",                                    // npm
    r"SK[a-f0-9]{32}",                                         // Twilio
    r"SG\.[a-zA-Z0-9_-]{22}\.[a-zA-Z0-9_-]{43}",               // SendGrid
    r"eyJ[a-zA-Z0-9_-]*\.eyJ[a-zA-Z0-9_-]*\.[a-zA-Z0-9_-]*",   // JWT
];

const FILE_PATH_PATTERNS: &[&str] = &[
    r#"C:\\Users\\[a-zA-Z0-9_]+\\[^\s"']+"#, // Windows
    r#"/Users/[a-zA-Z0-9_]+/[^\s"']+"#,      // macOS
    r#"/home/[a-zA-Z0-9_]+/[^\s"']+"#,       // Linux
    r#"\\\\[a-zA-Z0-9]+\\[^\s"']+"#,         // UNC
];

const DATABASE_URL_PATTERNS: &[&str] = &[
    r#"postgres://[^\s"']+"#,
    r#"postgresql://[^\s"']+"#,
    r#"mysql://[^\s"']+"#,
    r#"mongodb://[^\s"']+"#,
    r#"redis://[^\s"']+"#,
];

const PERSONAL_INFO_PATTERNS: &[&str] = &[
    r"\b\d{3}-\d{2}-\d{4}\b",                           // SSN
    r"\b\d{9}\b",                                       // SSN without dashes
    r"\b\d{16}\b",                                      // Card, 16 digits
    r"\b\d{15}\b",                                      // Card, 15 digits (Amex)
    r"\b\d{4}[\s-]\d{4}[\s-]\d{4}[\s-]\d{4}\b",         // Card, grouped
    r"\b\d{4}[\s-]\d{6}[\s-]\d{5}\b",                   // Amex, grouped
    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b", // Email
    r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b",               // US phone
    r"\+\d{1,3}[-.\s]?\d{1,14}\b",                      // International phone
];

const INTERNAL_REFERENCE_PATTERNS: &[&str] = &[
    r"MEMORY\.md",
    r"memory/\d{4}-\d{2}-\d{2}\.md",
    r"secrets/",
    r"\.env",
    r"oauth\.json",
];

const IP_ADDRESS_PATTERNS: &[&str] =
    &[r"\b(?:192\.168|10\.\d{1,3}|172\.(?:1[6-9]|2[0-9]|3[01]))\.\d{1,3}\.\d{1,3}\b"];

/// Known-benign shapes. Applied to the matched token only, never to the
/// surrounding text: a real key in the query string of an `example.com`
/// URL is still a key.
const ALLOWLIST_PATTERNS: &[&str] = &[
    r"example\.com",
    r"placeholder",
    r"your-api-key-here",
    r"xxx+",
    r"\*{3,}",
];

static COMPILED: LazyLock<[Vec<Regex>; 6]> =
    LazyLock::new(|| Category::ALL.map(|category| compile_all(category.pattern_sources())));

static ALLOWLIST: LazyLock<Vec<Regex>> = LazyLock::new(|| compile_all(ALLOWLIST_PATTERNS));

fn compile_all(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("hardcoded regex must compile")
        })
        .collect()
}

/// Whether a matched token is a known placeholder or mask.
pub fn is_allowlisted(token: &str) -> bool {
    ALLOWLIST.iter().any(|re| re.is_match(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles() {
        for category in Category::ALL {
            assert_eq!(
                category.patterns().len(),
                category.pattern_sources().len(),
                "{category}"
            );
        }
        assert_eq!(ALLOWLIST.len(), ALLOWLIST_PATTERNS.len());
    }

    #[test]
    fn severity_table() {
        assert_eq!(Category::ApiKey.severity(), Severity::Critical);
        assert_eq!(Category::DatabaseUrl.severity(), Severity::Critical);
        assert_eq!(Category::FilePath.severity(), Severity::High);
        assert_eq!(Category::PersonalInfo.severity(), Severity::High);
        assert_eq!(Category::InternalReference.severity(), Severity::Medium);
        assert_eq!(Category::IpAddress.severity(), Severity::Low);
        assert!(Severity::Critical > Severity::High && Severity::Medium > Severity::Low);
    }

    #[test]
    fn markers_are_uppercase_category_names() {
        assert_eq!(Category::ApiKey.redaction_marker(), "[REDACTED-API_KEY]");
        assert_eq!(
            Category::InternalReference.redaction_marker(),
            "[REDACTED-INTERNAL_REFERENCE]"
        );
    }

    #[test]
    fn markers_do_not_match_any_pattern() {
        for marker_of in Category::ALL {
            let marker = marker_of.redaction_marker();
            for category in Category::ALL {
                assert!(
                    !category.patterns().iter().any(|re| re.is_match(&marker)),
                    "{marker} re-matches {category}"
                );
            }
        }
    }

    #[test]
    fn private_ranges_include_ten_slash_eight() {
        let re = &Category::IpAddress.patterns()[0];
        assert!(re.is_match("10.0.0.12"));
        assert!(re.is_match("192.168.1.20"));
        assert!(re.is_match("172.20.4.1"));
        assert!(!re.is_match("8.8.8.8"));
        assert!(!re.is_match("172.40.1.1"));
    }

    #[test]
    fn allowlist_only_sees_the_token() {
        assert!(is_allowlisted("sk-xxxxxxxxxxxxxxxxxxxxxxxx"));
        assert!(is_allowlisted("user@example.com"));
        assert!(is_allowlisted("****"));
        assert!(!is_allowlisted("sk-aaaaaaaaaaaaaaaaaaaaaaaa"));
    }
}
