//! Message Templates
//!
//! Diagnostic messages with `{slot}` substitutions, checked when a rule set
//! is loaded so rendering never fails.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::declaration::Declaration;

static SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("slot pattern is valid"));

/// Slots a template may reference
pub const SLOTS: &[&str] = &["attribute", "capability", "name", "kind", "context"];

/// Values substituted into a template
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub attribute: &'a str,
    pub capability: &'a str,
    pub declaration: &'a Declaration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    source: String,
}

impl MessageTemplate {
    /// Parse a template, returning the first unknown slot name on failure
    pub fn parse(source: impl Into<String>) -> Result<Self, String> {
        let source = source.into();
        if let Some(unknown) = SLOT
            .captures_iter(&source)
            .map(|caps| caps[1].to_string())
            .find(|slot| !SLOTS.contains(&slot.as_str()))
        {
            return Err(unknown);
        }
        Ok(Self { source })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render(&self, ctx: &TemplateContext<'_>) -> String {
        SLOT.replace_all(&self.source, |caps: &Captures<'_>| match &caps[1] {
            "attribute" => ctx.attribute.to_string(),
            "capability" => ctx.capability.to_string(),
            "name" => ctx.declaration.name().to_string(),
            "kind" => ctx.declaration.kind().describe().to_string(),
            "context" => ctx.declaration.enclosing_context().describe().to_string(),
            other => format!("{{{other}}}"),
        })
        .into_owned()
    }
}
