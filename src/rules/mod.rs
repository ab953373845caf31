//! Attribute Rules
//!
//! Declarative rule sets per attribute, their registry, and evaluation.

pub mod engine;
pub mod registry;
pub mod schema;
pub mod template;

pub use registry::{LoadedRuleSet, RuleRegistry, RuleSetPriority, NSCOPYING_RULES};
pub use schema::{Rule, RuleCheck, RuleSet, RuleSetError, RuleSetFile};
pub use template::MessageTemplate;
