//! Expectation Parser
//!
//! Pulls `expected-error {{...}}` / `expected-warning {{...}}` markers out of
//! fixture text, lazily, one line at a time.
//!
//! Marker syntax:
//!
//! ```text
//! expected-(error|warning)[@(+N|-N|N)][ COUNT] {{message}}
//! ```
//!
//! `@+N`/`@-N` move the expectation relative to the marker's line, `@N` names
//! an absolute line, and `COUNT` says how many identical diagnostics to expect.
//! Markers count only inside comments; string literals are code.

use std::collections::VecDeque;
use std::fmt;
use std::iter::Enumerate;
use std::str::Lines;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::declaration::Location;
use crate::frontend::Lexer;
use crate::validation::Severity;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexpected-(error|warning)(?:@([+-]?)(\d+))?(?:[ \t]+(\d+))?")
        .expect("marker pattern is valid")
});

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"verify-markers:[ \t]*(collapse|repeat)\b").expect("directive pattern is valid")
});

/// What to do with extra `}}` pairs written straight after a payload,
/// as in `{{message}}}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerPolicy {
    /// Ignore them; the marker counts once
    #[default]
    Collapse,
    /// Each extra pair expects the same diagnostic once more
    Repeat,
}

impl MarkerPolicy {
    /// Per-fixture override: a `verify-markers: repeat|collapse` comment
    pub fn from_directive(text: &str) -> Option<Self> {
        let caps = DIRECTIVE.captures(text)?;
        match &caps[1] {
            "repeat" => Some(MarkerPolicy::Repeat),
            _ => Some(MarkerPolicy::Collapse),
        }
    }
}

/// A diagnostic the fixture says must be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expectation {
    /// Line the diagnostic is expected on
    pub line: usize,
    pub severity: Severity,
    pub message: String,
    /// How many identical diagnostics are expected
    pub count: usize,
    /// Where the marker itself was written
    pub marker: Location,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: expected-{} {{{{{}}}}}",
            self.line, self.severity, self.message
        )?;
        if self.count > 1 {
            write!(f, " (x{})", self.count)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedExpectationError {
    #[error("line {line}: unterminated expectation, missing closing '}}}}'")]
    Unterminated { line: usize },
    #[error("line {line}: expectation marker has no '{{{{message}}}}' payload")]
    MissingPayload { line: usize },
    #[error("line {line}: expectation count '{count}' must be a positive integer")]
    InvalidCount { line: usize, count: String },
    #[error("line {line}: line offset '@{offset}' points outside the fixture's {lines} line(s)")]
    OffsetOutOfRange {
        line: usize,
        offset: String,
        lines: usize,
    },
}

impl MalformedExpectationError {
    /// Line of the offending marker
    pub fn line(&self) -> usize {
        match self {
            MalformedExpectationError::Unterminated { line }
            | MalformedExpectationError::MissingPayload { line }
            | MalformedExpectationError::InvalidCount { line, .. }
            | MalformedExpectationError::OffsetOutOfRange { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectationParser {
    policy: MarkerPolicy,
}

impl ExpectationParser {
    pub fn new(policy: MarkerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MarkerPolicy {
        self.policy
    }

    /// Lazily parse `text`; call again to start over
    pub fn parse<'a>(&self, text: &'a str) -> Expectations<'a> {
        Expectations {
            lines: text.lines().enumerate(),
            line_count: text.lines().count(),
            policy: self.policy,
            lexer: Lexer::new(),
            pending: VecDeque::new(),
        }
    }

    /// Parse everything, stopping at the first malformed marker
    pub fn parse_all(&self, text: &str) -> Result<Vec<Expectation>, MalformedExpectationError> {
        self.parse(text).collect()
    }
}

/// Lazy sequence of expectations in source order
#[derive(Debug, Clone)]
pub struct Expectations<'a> {
    lines: Enumerate<Lines<'a>>,
    line_count: usize,
    policy: MarkerPolicy,
    /// Tracks block comments across lines
    lexer: Lexer,
    pending: VecDeque<Result<Expectation, MalformedExpectationError>>,
}

impl Iterator for Expectations<'_> {
    type Item = Result<Expectation, MalformedExpectationError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            let (idx, line) = self.lines.next()?;
            let marker_line = MarkerLine {
                line_num: idx + 1,
                line_count: self.line_count,
                policy: self.policy,
            };
            for span in self.lexer.comment_spans(line) {
                let comment = &line[span.clone()];
                if !marker_line.parse_comment(comment, span.start, &mut self.pending) {
                    break;
                }
            }
        }
    }
}

/// Where the comment being parsed sits
struct MarkerLine {
    line_num: usize,
    line_count: usize,
    policy: MarkerPolicy,
}

impl MarkerLine {
    /// Parse every marker in `line`, the text of one comment starting at
    /// byte `offset`. Returns false after a malformed marker, which ends the
    /// line.
    fn parse_comment(
        &self,
        line: &str,
        offset: usize,
        out: &mut VecDeque<Result<Expectation, MalformedExpectationError>>,
    ) -> bool {
        let line_num = self.line_num;
        let mut pos = 0;

        while let Some(caps) = MARKER.captures_at(line, pos) {
            let Some(head) = caps.get(0) else {
                break;
            };

            let severity = match &caps[1] {
                "warning" => Severity::Warning,
                _ => Severity::Error,
            };

            let target_line = match (caps.get(2), caps.get(3)) {
                (Some(sign), Some(amount)) => {
                    let target =
                        resolve_offset(line_num, sign.as_str(), amount.as_str(), self.line_count);
                    match target {
                        Some(target) => target,
                        None => {
                            out.push_back(Err(MalformedExpectationError::OffsetOutOfRange {
                                line: line_num,
                                offset: format!("{}{}", sign.as_str(), amount.as_str()),
                                lines: self.line_count,
                            }));
                            return false;
                        }
                    }
                }
                _ => line_num,
            };

            let mut count = match caps.get(4) {
                Some(raw) => match raw.as_str().parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        out.push_back(Err(MalformedExpectationError::InvalidCount {
                            line: line_num,
                            count: raw.as_str().to_string(),
                        }));
                        return false;
                    }
                },
                None => 1,
            };

            let rest = &line[head.end()..];
            let payload_start = head.end() + (rest.len() - rest.trim_start().len());
            if !line[payload_start..].starts_with("{{") {
                out.push_back(Err(MalformedExpectationError::MissingPayload { line: line_num }));
                return false;
            }

            let body_start = payload_start + 2;
            let Some(body_len) = line[body_start..].find("}}") else {
                out.push_back(Err(MalformedExpectationError::Unterminated { line: line_num }));
                return false;
            };
            let message = line[body_start..body_start + body_len].to_string();
            pos = body_start + body_len + 2;

            let mut extra = 0;
            while line[pos..].starts_with("}}") {
                extra += 1;
                pos += 2;
            }
            if extra > 0 {
                match self.policy {
                    MarkerPolicy::Repeat => count += extra,
                    MarkerPolicy::Collapse => log::debug!(
                        "line {line_num}: ignoring {extra} extra '}}}}' after expectation payload"
                    ),
                }
            }

            out.push_back(Ok(Expectation {
                line: target_line,
                severity,
                message,
                count,
                marker: Location::new(line_num, offset + head.start() + 1),
            }));
        }
        true
    }
}

fn resolve_offset(
    line_num: usize,
    sign: &str,
    amount: &str,
    line_count: usize,
) -> Option<usize> {
    let amount: usize = amount.parse().ok()?;
    let target = match sign {
        "+" => line_num.checked_add(amount)?,
        "-" => line_num.checked_sub(amount)?,
        _ => amount,
    };
    (1..=line_count).contains(&target).then_some(target)
}

/// Parse with the default policy
pub fn parse(text: &str) -> Expectations<'_> {
    ExpectationParser::default().parse(text)
}
