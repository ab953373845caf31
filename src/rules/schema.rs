//! Rule Set Schema
//!
//! TOML shape of an attribute rule set, and the runtime form it converts to.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::declaration::{ContextKind, DeclKind};
use crate::rules::template::MessageTemplate;
use crate::validation::Severity;

/// Root rule set file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RuleSetFile {
    pub attribute: AttributeMeta,
    /// Conformances of types fixtures use but never declare
    #[serde(default)]
    pub known_conformances: HashMap<String, Vec<String>>,
    pub rules: Vec<RuleDef>,
}

/// Attribute metadata
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AttributeMeta {
    pub name: String,
    /// Capability protocol used by `conforms` rules
    pub capability: Option<String>,
    pub description: Option<String>,
}

/// One rule as written in TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RuleDef {
    pub name: String,
    pub check: CheckKind,
    #[serde(default)]
    pub severity: Severity,
    /// Stop evaluating later rules when this one fails
    #[serde(default)]
    pub gate: bool,
    pub message: String,
    pub kinds: Option<Vec<DeclKind>>,
    pub contexts: Option<Vec<ContextKind>>,
    pub capability: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    Target,
    Context,
    Mutable,
    Stored,
    Conforms,
}

/// Runtime predicate of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleCheck {
    /// Declaration kind is one of these
    Target(Vec<DeclKind>),
    /// Enclosing context is one of these
    Context(Vec<ContextKind>),
    Mutable,
    Stored,
    /// Unwrapped declared type conforms to this capability
    Conforms(String),
}

/// A validation rule: predicate plus the diagnostic it raises on failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub check: RuleCheck,
    pub severity: Severity,
    pub gate: bool,
    pub message: MessageTemplate,
}

/// Runtime rule set (ordered rules for one attribute)
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub attribute: String,
    pub capability: Option<String>,
    pub description: Option<String>,
    pub rules: Vec<Rule>,
    pub known_conformances: HashMap<String, Vec<String>>,
}

#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("failed to read rule set {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rule set: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("rule set for '{0}' has no rules")]
    Empty(String),
    #[error("rule '{rule}' uses unknown message slot '{{{slot}}}'")]
    UnknownSlot { rule: String, slot: String },
    #[error("rule '{rule}' is a '{check}' check but has no '{field}' list")]
    MissingField {
        rule: String,
        check: &'static str,
        field: &'static str,
    },
    #[error("rule '{rule}' checks conformance but no capability is declared")]
    MissingCapability { rule: String },
}

impl RuleSet {
    pub fn from_toml(content: &str) -> Result<Self, RuleSetError> {
        let file: RuleSetFile = toml::from_str(content)?;
        Self::try_from(file)
    }
}

impl TryFrom<RuleSetFile> for RuleSet {
    type Error = RuleSetError;

    fn try_from(file: RuleSetFile) -> Result<Self, Self::Error> {
        if file.rules.is_empty() {
            return Err(RuleSetError::Empty(file.attribute.name));
        }

        let capability = file.attribute.capability;
        let rules = file
            .rules
            .into_iter()
            .map(|def| def.into_rule(capability.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            attribute: file.attribute.name,
            capability,
            description: file.attribute.description,
            rules,
            known_conformances: file.known_conformances,
        })
    }
}

impl RuleDef {
    fn into_rule(self, default_capability: Option<&str>) -> Result<Rule, RuleSetError> {
        let check = match self.check {
            CheckKind::Target => RuleCheck::Target(self.kinds.ok_or_else(|| {
                RuleSetError::MissingField {
                    rule: self.name.clone(),
                    check: "target",
                    field: "kinds",
                }
            })?),
            CheckKind::Context => RuleCheck::Context(self.contexts.ok_or_else(|| {
                RuleSetError::MissingField {
                    rule: self.name.clone(),
                    check: "context",
                    field: "contexts",
                }
            })?),
            CheckKind::Mutable => RuleCheck::Mutable,
            CheckKind::Stored => RuleCheck::Stored,
            CheckKind::Conforms => {
                let capability = self
                    .capability
                    .or_else(|| default_capability.map(str::to_string))
                    .ok_or_else(|| RuleSetError::MissingCapability {
                        rule: self.name.clone(),
                    })?;
                RuleCheck::Conforms(capability)
            }
        };

        let message =
            MessageTemplate::parse(self.message).map_err(|slot| RuleSetError::UnknownSlot {
                rule: self.name.clone(),
                slot,
            })?;

        Ok(Rule {
            name: self.name,
            check,
            severity: self.severity,
            gate: self.gate,
            message,
        })
    }
}
