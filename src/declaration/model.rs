//! Declaration records
//!
//! Plain data describing a declaration as the front-end saw it. No parsing or
//! validation logic lives here.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A 1-based line/column position in fixture text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What sort of thing was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    /// `var` or `let`, whether stored or computed
    Variable,
    Function,
    Initializer,
    /// `class`, `struct`, `enum` or `protocol`
    Type,
    /// Enum cases, type aliases, associated types, operators, imports
    Other,
}

impl DeclKind {
    pub fn describe(&self) -> &'static str {
        match self {
            DeclKind::Variable => "variable",
            DeclKind::Function => "function",
            DeclKind::Initializer => "initializer",
            DeclKind::Type => "type",
            DeclKind::Other => "declaration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Mutable,
    Immutable,
}

/// The declaration context a declaration lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextKind {
    Class,
    Struct,
    Enum,
    Protocol,
    /// Inside a function, method or initializer body
    Function,
    TopLevel,
}

impl ContextKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ContextKind::Class => "class",
            ContextKind::Struct => "struct",
            ContextKind::Enum => "enum",
            ContextKind::Protocol => "protocol",
            ContextKind::Function => "function",
            ContextKind::TopLevel => "top level",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Stored,
    Computed,
}

/// Wrapper around a declared base type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrapper {
    Plain,
    /// `T?`
    Optional,
    /// `T!`
    Unwrapped,
    /// `weak var x: T?`
    Weak,
}

/// A resolved type reference: the base name plus every capability it
/// conforms to, directly or through its supertypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    name: String,
    conformances: BTreeSet<String>,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conformances: BTreeSet::new(),
        }
    }

    pub fn with_conformance(mut self, capability: impl Into<String>) -> Self {
        self.conformances.insert(capability.into());
        self
    }

    pub fn with_conformances<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conformances
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conforms_to(&self, capability: &str) -> bool {
        self.conformances.contains(capability)
    }

    pub fn conformances(&self) -> impl Iterator<Item = &str> {
        self.conformances.iter().map(String::as_str)
    }
}

/// A type annotation: base type plus its wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    base: TypeRef,
    wrapper: Wrapper,
}

impl DeclaredType {
    pub fn new(base: TypeRef, wrapper: Wrapper) -> Self {
        Self { base, wrapper }
    }

    /// The base type with any optional/unwrapped/weak wrapper stripped
    pub fn unwrapped(&self) -> &TypeRef {
        &self.base
    }

    pub fn wrapper(&self) -> Wrapper {
        self.wrapper
    }

    pub fn conforms_to(&self, capability: &str) -> bool {
        self.base.conforms_to(capability)
    }
}

/// A declaration, immutable once built.
///
/// Functions, initializers and types carry no declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    name: String,
    kind: DeclKind,
    mutability: Mutability,
    context: ContextKind,
    declared_type: Option<DeclaredType>,
    storage: StorageKind,
    location: Location,
}

impl Declaration {
    pub fn variable(name: impl Into<String>, location: Location) -> DeclarationBuilder {
        DeclarationBuilder::new(name, DeclKind::Variable, location)
    }

    pub fn function(name: impl Into<String>, location: Location) -> DeclarationBuilder {
        DeclarationBuilder::new(name, DeclKind::Function, location)
    }

    pub fn initializer(location: Location) -> DeclarationBuilder {
        DeclarationBuilder::new("init", DeclKind::Initializer, location)
    }

    pub fn type_decl(name: impl Into<String>, location: Location) -> DeclarationBuilder {
        DeclarationBuilder::new(name, DeclKind::Type, location)
    }

    /// Any other declaration an attribute can be written on
    pub fn other(name: impl Into<String>, location: Location) -> DeclarationBuilder {
        DeclarationBuilder::new(name, DeclKind::Other, location)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeclKind {
        self.kind
    }

    pub fn is_mutable(&self) -> bool {
        self.mutability == Mutability::Mutable
    }

    pub fn enclosing_context(&self) -> ContextKind {
        self.context
    }

    pub fn declared_type(&self) -> Option<&DeclaredType> {
        self.declared_type.as_ref()
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage
    }

    pub fn wrapper_kind(&self) -> Wrapper {
        self.declared_type
            .as_ref()
            .map(DeclaredType::wrapper)
            .unwrap_or(Wrapper::Plain)
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

/// Builder for [`Declaration`]; defaults to a mutable, stored, top-level
/// declaration with no type annotation.
#[derive(Debug, Clone)]
pub struct DeclarationBuilder {
    decl: Declaration,
}

impl DeclarationBuilder {
    fn new(name: impl Into<String>, kind: DeclKind, location: Location) -> Self {
        Self {
            decl: Declaration {
                name: name.into(),
                kind,
                mutability: Mutability::Mutable,
                context: ContextKind::TopLevel,
                declared_type: None,
                storage: StorageKind::Stored,
                location,
            },
        }
    }

    pub fn mutability(mut self, mutability: Mutability) -> Self {
        self.decl.mutability = mutability;
        self
    }

    pub fn immutable(self) -> Self {
        self.mutability(Mutability::Immutable)
    }

    pub fn context(mut self, context: ContextKind) -> Self {
        self.decl.context = context;
        self
    }

    pub fn storage(mut self, storage: StorageKind) -> Self {
        self.decl.storage = storage;
        self
    }

    pub fn computed(self) -> Self {
        self.storage(StorageKind::Computed)
    }

    pub fn typed(mut self, base: TypeRef, wrapper: Wrapper) -> Self {
        self.decl.declared_type = Some(DeclaredType::new(base, wrapper));
        self
    }

    pub fn build(self) -> Declaration {
        self.decl
    }
}

/// An attribute written on a declaration, e.g. `@NSCopying var x: T`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInstance {
    name: String,
    location: Location,
    target: Declaration,
}

impl AttributeInstance {
    pub fn new(name: impl Into<String>, location: Location, target: Declaration) -> Self {
        Self {
            name: name.into(),
            location,
            target,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the `@` token; diagnostics are anchored here
    pub fn location(&self) -> Location {
        self.location
    }

    pub fn target(&self) -> &Declaration {
        &self.target
    }
}
