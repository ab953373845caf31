//! Matches recorded diagnostics against parsed expectations.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::expectation::Expectation;
use crate::validation::Diagnostic;

/// How an expectation's payload is compared with a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Payload must equal the message
    #[default]
    Exact,
    /// Payload must occur somewhere in the message
    Substring,
}

impl MatchMode {
    pub fn accepts(self, expected: &str, actual: &str) -> bool {
        match self {
            MatchMode::Exact => expected == actual,
            MatchMode::Substring => actual.contains(expected),
        }
    }
}

/// Outcome of one fixture run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub passed: bool,
    /// Diagnostics no expectation accounted for
    pub unexpected_diagnostics: Vec<Diagnostic>,
    /// Expectations left over; `count` holds how many were not produced
    pub unmatched_expectations: Vec<Expectation>,
}

/// Reconcile with exact message matching
pub fn reconcile(diagnostics: Vec<Diagnostic>, expectations: Vec<Expectation>) -> TestResult {
    reconcile_with(diagnostics, expectations, MatchMode::Exact)
}

/// Pair each diagnostic with an unconsumed expectation of the same line and
/// severity whose payload `mode` accepts. Exact payloads are preferred over
/// substring ones. Every expectation occurrence is consumed at most once;
/// whatever is left on either side is a mismatch.
pub fn reconcile_with(
    diagnostics: Vec<Diagnostic>,
    expectations: Vec<Expectation>,
    mode: MatchMode,
) -> TestResult {
    let mut remaining: Vec<usize> = expectations.iter().map(|e| e.count).collect();
    let mut unexpected_diagnostics = Vec::new();

    for diagnostic in diagnostics {
        let open = |i: &usize| remaining[*i] > 0 && located(&expectations[*i], &diagnostic);
        let slot = (0..expectations.len())
            .filter(open)
            .find(|&i| expectations[i].message == diagnostic.message)
            .or_else(|| {
                (0..expectations.len())
                    .filter(open)
                    .find(|&i| mode.accepts(&expectations[i].message, &diagnostic.message))
            });
        match slot {
            Some(i) => remaining[i] -= 1,
            None => unexpected_diagnostics.push(diagnostic),
        }
    }

    let unmatched_expectations: Vec<Expectation> = expectations
        .into_iter()
        .zip(remaining)
        .filter(|(_, left)| *left > 0)
        .map(|(mut expectation, left)| {
            expectation.count = left;
            expectation
        })
        .collect();

    TestResult {
        passed: unexpected_diagnostics.is_empty() && unmatched_expectations.is_empty(),
        unexpected_diagnostics,
        unmatched_expectations,
    }
}

fn located(expectation: &Expectation, diagnostic: &Diagnostic) -> bool {
    expectation.line == diagnostic.line() && expectation.severity == diagnostic.severity
}
