//! Attribute Validator
//!
//! Looks up an attribute's rule set by name and evaluates it.

use crate::declaration::AttributeInstance;
use crate::rules::RuleRegistry;
use crate::validation::diagnostics::{Diagnostic, DiagnosticRecorder};

#[derive(Debug, Clone, Copy)]
pub struct AttributeValidator<'r> {
    registry: &'r RuleRegistry,
}

impl<'r> AttributeValidator<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self { registry }
    }

    /// Validate one attribute instance. Attributes with no rule set are
    /// someone else's concern and produce nothing.
    pub fn validate(&self, attr: &AttributeInstance) -> Vec<Diagnostic> {
        match self.registry.get(attr.name()) {
            Some(rule_set) => rule_set.evaluate(attr),
            None => {
                log::debug!(
                    "No rules registered for @{} at {}; skipping",
                    attr.name(),
                    attr.location()
                );
                Vec::new()
            }
        }
    }

    /// Validate every instance in order, recording into `recorder`
    pub fn validate_all<'a, I>(&self, attrs: I, recorder: &mut DiagnosticRecorder)
    where
        I: IntoIterator<Item = &'a AttributeInstance>,
    {
        for attr in attrs {
            recorder.extend(self.validate(attr));
        }
    }
}
