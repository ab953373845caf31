//! Rule Engine
//!
//! Evaluates an attribute's ordered rule set against the declaration it
//! decorates. Rule failures are data: they come back as diagnostics.

use crate::declaration::{AttributeInstance, Declaration, StorageKind};
use crate::rules::schema::{Rule, RuleCheck, RuleSet};
use crate::rules::template::TemplateContext;
use crate::validation::Diagnostic;

impl RuleCheck {
    /// Does `decl` satisfy this check?
    pub fn holds(&self, decl: &Declaration) -> bool {
        match self {
            RuleCheck::Target(kinds) => kinds.contains(&decl.kind()),
            RuleCheck::Context(contexts) => contexts.contains(&decl.enclosing_context()),
            RuleCheck::Mutable => decl.is_mutable(),
            RuleCheck::Stored => decl.storage_kind() == StorageKind::Stored,
            RuleCheck::Conforms(capability) => match decl.declared_type() {
                Some(ty) => ty.conforms_to(capability),
                None => {
                    // Inferred types are the type checker's business
                    log::debug!(
                        "'{}' has no type annotation; assuming it conforms to {capability}",
                        decl.name()
                    );
                    true
                }
            },
        }
    }
}

impl Rule {
    /// Run this rule, producing a diagnostic if the attribute violates it
    pub fn apply(&self, attr: &AttributeInstance, set: &RuleSet) -> Option<Diagnostic> {
        let decl = attr.target();
        if self.check.holds(decl) {
            return None;
        }

        let capability = match &self.check {
            RuleCheck::Conforms(capability) => capability.as_str(),
            _ => set.capability.as_deref().unwrap_or_default(),
        };
        let ctx = TemplateContext {
            attribute: attr.name(),
            capability,
            declaration: decl,
        };

        Some(
            Diagnostic::new(self.severity, self.message.render(&ctx), attr.location())
                .with_rule(&self.name),
        )
    }
}

impl RuleSet {
    /// Evaluate every rule in registration order.
    ///
    /// Rules are independent except that a failing gate rule ends evaluation,
    /// so a misplaced attribute reports one diagnostic rather than a cascade.
    pub fn evaluate(&self, attr: &AttributeInstance) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for rule in &self.rules {
            if let Some(diagnostic) = rule.apply(attr, self) {
                log::debug!(
                    "@{} on '{}': rule '{}' failed",
                    attr.name(),
                    attr.target().name(),
                    rule.name
                );
                diagnostics.push(diagnostic);
                if rule.gate {
                    break;
                }
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{ContextKind, Location, TypeRef, Wrapper};
    use crate::rules::registry::NSCOPYING_RULES;

    fn nscopying() -> RuleSet {
        RuleSet::from_toml(NSCOPYING_RULES).unwrap()
    }

    fn copyable() -> TypeRef {
        TypeRef::new("CopyableClass").with_conformance("NSCopying")
    }

    fn attr(decl: Declaration) -> AttributeInstance {
        AttributeInstance::new("NSCopying", decl.location(), decl)
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_valid_property_under_every_wrapper() {
        let set = nscopying();
        for wrapper in [
            Wrapper::Plain,
            Wrapper::Optional,
            Wrapper::Unwrapped,
            Wrapper::Weak,
        ] {
            let decl = Declaration::variable("p1", Location::new(1, 1))
                .context(ContextKind::Class)
                .typed(copyable(), wrapper)
                .build();
            assert!(set.evaluate(&attr(decl)).is_empty(), "{wrapper:?}");
        }
    }

    #[test]
    fn test_gate_stops_evaluation() {
        let set = nscopying();
        // Would also fail context, mutability and storage if evaluated
        let decl = Declaration::function("copyFunction", Location::new(11, 1)).build();
        let diagnostics = set.evaluate(&attr(decl));
        assert_eq!(
            messages(&diagnostics),
            vec!["'NSCopying' may only be used on 'var' declarations"]
        );
        assert_eq!(diagnostics[0].rule.as_deref(), Some("target-kind"));
    }

    #[test]
    fn test_independent_rules_all_report() {
        let set = nscopying();
        let decl = Declaration::variable("bad", Location::new(2, 3))
            .context(ContextKind::Struct)
            .immutable()
            .computed()
            .typed(TypeRef::new("Int"), Wrapper::Plain)
            .build();
        let diagnostics = set.evaluate(&attr(decl));
        assert_eq!(
            messages(&diagnostics),
            vec![
                "'NSCopying' attribute may only be used on properties in classes",
                "'NSCopying' attribute requires property to be mutable",
                "'NSCopying' attribute is only valid on stored properties",
                "'NSCopying' attribute is only valid with types that conform to the NSCopying protocol",
            ]
        );
        assert!(diagnostics.iter().all(|d| d.location == Location::new(2, 3)));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let set = nscopying();
        let decl = Declaration::variable("x", Location::new(5, 1))
            .context(ContextKind::Class)
            .typed(TypeRef::new("NotCopyable"), Wrapper::Plain)
            .build();
        let instance = attr(decl);
        assert_eq!(set.evaluate(&instance), set.evaluate(&instance));
    }

    #[test]
    fn test_untyped_property_passes_capability() {
        assert!(RuleCheck::Conforms("NSCopying".into())
            .holds(&Declaration::variable("x", Location::new(1, 1)).build()));
    }
}
