//! Fixture Runner
//!
//! Drives one fixture end to end: expectations, declarations, validation,
//! reconciliation.

pub mod reconcile;
pub mod report;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::expectation::{ExpectationParser, MalformedExpectationError, MarkerPolicy};
use crate::frontend::Scanner;
use crate::rules::RuleRegistry;
use crate::validation::{AttributeValidator, DiagnosticRecorder};

pub use reconcile::{reconcile, reconcile_with, MatchMode, TestResult};
pub use report::OutputFormat;

/// Exit status when every fixture matched
pub const EXIT_PASS: u8 = 0;
/// Exit status on any mismatch or broken fixture
pub const EXIT_FAIL: u8 = 1;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("cannot read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed expectation at {0}")]
    Malformed(#[from] MalformedExpectationError),
}

/// Fixture source text plus a display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub name: String,
    pub source: String,
}

impl Fixture {
    pub fn from_source(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let source = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_source(path.display().to_string(), source))
    }
}

/// Result of running one fixture file
#[derive(Debug)]
pub struct FixtureOutcome {
    pub path: PathBuf,
    pub result: Result<TestResult, FixtureError>,
}

impl FixtureOutcome {
    pub fn passed(&self) -> bool {
        matches!(&self.result, Ok(result) if result.passed)
    }
}

/// Exit status for a batch of outcomes
pub fn exit_code(outcomes: &[FixtureOutcome]) -> u8 {
    if outcomes.iter().all(FixtureOutcome::passed) {
        EXIT_PASS
    } else {
        EXIT_FAIL
    }
}

/// Runs fixtures against a rule registry. Owns nothing mutable: every run
/// gets its own recorder.
#[derive(Debug, Clone)]
pub struct FixtureRunner<'r> {
    registry: &'r RuleRegistry,
    policy: MarkerPolicy,
    match_mode: MatchMode,
    scanner: Scanner,
}

impl<'r> FixtureRunner<'r> {
    pub fn new(registry: &'r RuleRegistry, policy: MarkerPolicy) -> Self {
        let scanner = Scanner::new().with_known_conformances(&registry.known_conformances());
        Self {
            registry,
            policy,
            match_mode: MatchMode::default(),
            scanner,
        }
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn run(&self, fixture: &Fixture) -> Result<TestResult, FixtureError> {
        let policy = MarkerPolicy::from_directive(&fixture.source).unwrap_or(self.policy);
        let expectations = ExpectationParser::new(policy).parse_all(&fixture.source)?;

        let scanned = self.scanner.scan(&fixture.source);
        log::debug!(
            "{}: {} expectation(s), {} declaration(s), {} attribute(s)",
            fixture.name,
            expectations.len(),
            scanned.declarations.len(),
            scanned.attributes.len()
        );

        let mut recorder = DiagnosticRecorder::new();
        AttributeValidator::new(self.registry).validate_all(&scanned.attributes, &mut recorder);

        let result = reconcile_with(recorder.drain(), expectations, self.match_mode);
        log::info!(
            "{}: {}",
            fixture.name,
            if result.passed { "passed" } else { "failed" }
        );
        Ok(result)
    }

    pub fn run_path(&self, path: &Path) -> FixtureOutcome {
        let result = Fixture::load(path).and_then(|fixture| self.run(&fixture));
        FixtureOutcome {
            path: path.to_path_buf(),
            result,
        }
    }

    /// Verify one fixture file, printing the report; returns the exit status
    pub fn run_fixture(&self, path: &Path) -> u8 {
        let outcome = self.run_path(path);
        print!("{}", report::render_text(std::slice::from_ref(&outcome)));
        exit_code(std::slice::from_ref(&outcome))
    }
}
