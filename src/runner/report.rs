//! Human and machine-readable reports of fixture outcomes.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Serialize;

use crate::expectation::Expectation;
use crate::runner::FixtureOutcome;
use crate::validation::Diagnostic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One line per passing fixture; failures list every mismatch with its location
pub fn render_text(outcomes: &[FixtureOutcome]) -> String {
    let mut out = String::new();

    for outcome in outcomes {
        let path = outcome.path.display();
        match &outcome.result {
            Ok(result) if result.passed => {
                let _ = writeln!(out, "PASS {path}");
            }
            Ok(result) => {
                let _ = writeln!(out, "FAIL {path}");
                for diagnostic in &result.unexpected_diagnostics {
                    let _ = writeln!(
                        out,
                        "  {path}:{}: unexpected {}: {}",
                        diagnostic.location, diagnostic.severity, diagnostic.message
                    );
                }
                for expectation in &result.unmatched_expectations {
                    let times = if expectation.count > 1 {
                        format!(" ({} more times)", expectation.count)
                    } else {
                        String::new()
                    };
                    let _ = writeln!(
                        out,
                        "  {path}:{}: expected {} not produced{times}: {}",
                        expectation.line, expectation.severity, expectation.message
                    );
                }
            }
            Err(e) => {
                let _ = writeln!(out, "ERROR {path}: {e}");
            }
        }
    }

    out
}

/// Pass/fail tally
pub fn summary(outcomes: &[FixtureOutcome]) -> String {
    let passed = outcomes.iter().filter(|o| o.passed()).count();
    format!(
        "{} fixture(s): {} passed, {} failed",
        outcomes.len(),
        passed,
        outcomes.len() - passed
    )
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    path: String,
    passed: bool,
    unexpected_diagnostics: &'a [Diagnostic],
    unmatched_expectations: &'a [Expectation],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn render_json(outcomes: &[FixtureOutcome]) -> serde_json::Result<String> {
    let entries: Vec<JsonOutcome<'_>> = outcomes
        .iter()
        .map(|outcome| {
            let path = outcome.path.display().to_string();
            match &outcome.result {
                Ok(result) => JsonOutcome {
                    path,
                    passed: result.passed,
                    unexpected_diagnostics: &result.unexpected_diagnostics,
                    unmatched_expectations: &result.unmatched_expectations,
                    error: None,
                },
                Err(e) => JsonOutcome {
                    path,
                    passed: false,
                    unexpected_diagnostics: &[],
                    unmatched_expectations: &[],
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    serde_json::to_string_pretty(&entries)
}
