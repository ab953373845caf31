//! Attribute Verifier
//!
//! Checks that declaration attributes are applied only where they are valid,
//! and verifies the diagnostics against expectations written inline in
//! fixture files.
//!
//! This library provides:
//! - A declaration model and a small fixture front-end that produces it
//! - Declarative per-attribute rule sets loaded from TOML
//! - Attribute validation into a diagnostic recorder
//! - Expectation parsing, reconciliation and reporting
//! - Configuration management and a watch-mode CLI
//!
//! Expectation payloads match diagnostic messages exactly by default;
//! [`runner::MatchMode::Substring`] accepts any payload contained in the
//! message.

pub mod cli;
pub mod config;
pub mod declaration;
pub mod expectation;
pub mod frontend;
pub mod rules;
pub mod runner;
pub mod validation;
pub mod watch;

// Re-exports for a compact public API
pub use config::Config;
pub use declaration::{AttributeInstance, Declaration};
pub use expectation::{Expectation, ExpectationParser, MarkerPolicy};
pub use rules::{RuleRegistry, RuleSet};
pub use runner::{Fixture, FixtureRunner, TestResult};
pub use validation::{AttributeValidator, Diagnostic, DiagnosticRecorder, Severity};
