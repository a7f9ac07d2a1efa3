//! AgentForge - outbound-content security for a chat-connected agent
//!
//! This crate provides:
//! - Outbound scanning with redaction and a bounded findings history
//! - File sensitivity classification and share decisions
//! - Session isolation with fail-closed file-access policies
//! - A hash-only, hash-chained audit trail of external actions
//! - Secret rotation tracking and static review of third-party skills

pub mod cli;
pub mod concurrency;
pub mod config;
pub mod paths;
pub mod security;

pub use config::Config;
