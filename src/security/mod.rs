//! Outbound-content security for AgentForge.
//!
//! See [`agentforge`] for the module overview, architecture diagram,
//! and public API documentation.

mod agentforge;
mod audit;
mod classifier;
mod db;
mod error;
mod isolation;
mod pathnorm;
mod patterns;
mod scanner;
mod secrets;
mod skills;
mod store;
mod toolkit;
mod walk;

// The agentforge.rs facade controls the entire public API surface.
pub use self::agentforge::*;
