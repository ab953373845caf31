//! NSCopying placement scenarios, checked both on hand-built declarations and
//! on scanned fixture text
use attr_verify::declaration::{
    AttributeInstance, ContextKind, Declaration, Location, TypeRef, Wrapper,
};
use attr_verify::frontend::Scanner;
use attr_verify::{AttributeValidator, Diagnostic, RuleRegistry};

const MUTABLE: &str = "'NSCopying' attribute requires property to be mutable";
const STORED: &str = "'NSCopying' attribute is only valid on stored properties";
const CONFORMS: &str =
    "'NSCopying' attribute is only valid with types that conform to the NSCopying protocol";
const VAR_ONLY: &str = "'NSCopying' may only be used on 'var' declarations";
const CLASS_ONLY: &str = "'NSCopying' attribute may only be used on properties in classes";

fn copyable() -> TypeRef {
    TypeRef::new("CopyableClass").with_conformance("NSCopying")
}

fn at(line: usize) -> Location {
    Location::new(line, 3)
}

fn validate(decl: Declaration) -> Vec<Diagnostic> {
    let registry = RuleRegistry::with_builtin().expect("built-in rule sets");
    let attr = AttributeInstance::new("NSCopying", decl.location(), decl);
    AttributeValidator::new(&registry).validate(&attr)
}

fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.message.as_str()).collect()
}

fn class_var(name: &str) -> attr_verify::declaration::DeclarationBuilder {
    Declaration::variable(name, at(1)).context(ContextKind::Class)
}

#[test]
fn scenario_1_valid_property() {
    let decl = class_var("p1").typed(copyable(), Wrapper::Plain).build();
    assert!(validate(decl).is_empty());
}

#[test]
fn valid_property_under_every_wrapper() {
    for wrapper in [Wrapper::Plain, Wrapper::Optional, Wrapper::Unwrapped, Wrapper::Weak] {
        let decl = class_var("p").typed(copyable(), wrapper).build();
        assert!(validate(decl).is_empty(), "{wrapper:?}");
    }
}

#[test]
fn scenario_2_immutable() {
    let decl = class_var("invalidLet")
        .immutable()
        .typed(copyable(), Wrapper::Plain)
        .build();
    assert_eq!(messages(&validate(decl)), vec![MUTABLE]);
}

#[test]
fn scenario_3_computed() {
    let decl = class_var("computed")
        .computed()
        .typed(copyable(), Wrapper::Plain)
        .build();
    assert_eq!(messages(&validate(decl)), vec![STORED]);
}

#[test]
fn scenario_4_non_conforming_type() {
    let decl = class_var("notClass")
        .typed(TypeRef::new("Int"), Wrapper::Plain)
        .build();
    assert_eq!(messages(&validate(decl)), vec![CONFORMS]);
}

#[test]
fn scenario_5_function_stops_after_gate() {
    let decl = Declaration::function("copyFunction", at(12))
        .context(ContextKind::TopLevel)
        .build();
    assert_eq!(messages(&validate(decl)), vec![VAR_ONLY]);
}

#[test]
fn non_variable_targets_yield_exactly_one_diagnostic() {
    let targets = [
        Declaration::function("f", at(1)).context(ContextKind::Class).build(),
        Declaration::initializer(at(1)).context(ContextKind::Class).build(),
        Declaration::type_decl("S", at(1)).build(),
    ];
    for decl in targets {
        assert_eq!(messages(&validate(decl)), vec![VAR_ONLY]);
    }
}

#[test]
fn scenario_6_struct_and_its_property() {
    let source = "class CopyableClass : NSCopying {}\n\
                  @NSCopying\n\
                  struct CopyingStruct {\n\
                    @NSCopying var x : CopyableClass\n\
                  }\n";
    let registry = RuleRegistry::with_builtin().expect("built-in rule sets");
    let scanned = Scanner::new().scan(source);
    assert_eq!(scanned.attributes.len(), 2);

    let validator = AttributeValidator::new(&registry);
    let on_struct = validator.validate(&scanned.attributes[0]);
    let on_property = validator.validate(&scanned.attributes[1]);

    assert_eq!(messages(&on_struct), vec![VAR_ONLY]);
    assert_eq!(on_struct[0].line(), 2);
    assert_eq!(messages(&on_property), vec![CLASS_ONLY]);
    assert_eq!(on_property[0].line(), 4);
}

#[test]
fn evaluation_is_idempotent() {
    let decl = Declaration::variable("bad", at(9))
        .context(ContextKind::Struct)
        .immutable()
        .computed()
        .typed(TypeRef::new("Int"), Wrapper::Optional)
        .build();
    let first = validate(decl.clone());
    let second = validate(decl);
    assert_eq!(first, second);
    assert_eq!(messages(&first), vec![CLASS_ONLY, MUTABLE, STORED, CONFORMS]);
}
