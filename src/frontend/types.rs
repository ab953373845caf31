//! Type Table
//!
//! Maps nominal type names to their declared supertypes and conformances, and
//! resolves the transitive capability set of a name.

use std::collections::{BTreeSet, HashMap};

use crate::declaration::TypeRef;

#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    inherits: HashMap<String, Vec<String>>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `name` directly inherits from or conforms to each of `supertypes`
    pub fn declare<I, S>(&mut self, name: &str, supertypes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inherits
            .entry(name.to_string())
            .or_default()
            .extend(supertypes.into_iter().map(Into::into));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inherits.contains_key(name)
    }

    /// Everything `name` conforms to, following supertypes transitively
    pub fn conformances_of(&self, name: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = vec![name];

        while let Some(current) = stack.pop() {
            if let Some(supers) = self.inherits.get(current) {
                for sup in supers {
                    if seen.insert(sup.clone()) {
                        stack.push(sup);
                    }
                }
            }
        }

        // A cyclic declaration must not make a type conform to itself
        seen.remove(name);
        seen
    }

    pub fn resolve(&self, name: &str) -> TypeRef {
        TypeRef::new(name).with_conformances(self.conformances_of(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_conformance() {
        let mut table = TypeTable::new();
        table.declare("CopyableClass", ["NSCopying"]);
        assert!(table.resolve("CopyableClass").conforms_to("NSCopying"));
        assert!(!table.resolve("Int").conforms_to("NSCopying"));
    }

    #[test]
    fn test_inherited_conformance() {
        let mut table = TypeTable::new();
        table.declare("Base", ["NSObject", "NSCopying"]);
        table.declare("Derived", ["Base"]);
        let derived = table.resolve("Derived");
        assert!(derived.conforms_to("NSCopying"));
        assert!(derived.conforms_to("Base"));
    }

    #[test]
    fn test_extension_adds_conformance() {
        let mut table = TypeTable::new();
        table.declare("Point", Vec::<String>::new());
        table.declare("Point", ["NSCopying"]);
        assert!(table.resolve("Point").conforms_to("NSCopying"));
    }

    #[test]
    fn test_cycle_terminates() {
        let mut table = TypeTable::new();
        table.declare("A", ["B"]);
        table.declare("B", ["A"]);
        let a = table.conformances_of("A");
        assert!(a.contains("B"));
        assert!(!a.contains("A"));
    }
}
