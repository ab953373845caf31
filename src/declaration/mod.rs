//! Declaration Model
//!
//! The shape of a declaration as consumed by attribute validation.

pub mod model;

pub use model::{
    AttributeInstance, ContextKind, DeclKind, Declaration, DeclarationBuilder, DeclaredType,
    Location, Mutability, StorageKind, TypeRef, Wrapper,
};
