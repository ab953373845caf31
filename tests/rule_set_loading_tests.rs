//! Loading rule sets from disk: priorities, overrides and bad files
use std::fs;

use attr_verify::declaration::{AttributeInstance, ContextKind, Declaration, Location};
use attr_verify::expectation::MarkerPolicy;
use attr_verify::rules::{RuleRegistry, RuleSetPriority};
use attr_verify::runner::{Fixture, FixtureRunner};
use attr_verify::AttributeValidator;

const IBOUTLET: &str = r#"
[attribute]
name = "IBOutlet"
capability = "AnyObject"

[[rules]]
name = "target-kind"
check = "target"
kinds = ["variable"]
gate = true
message = "only instance properties can be declared '{attribute}'"

[[rules]]
name = "class-context"
check = "context"
contexts = ["class"]
severity = "warning"
message = "'{attribute}' property '{name}' belongs in a class, not a {context}"
"#;

const NSCOPYING_OVERRIDE: &str = r#"
[attribute]
name = "NSCopying"
capability = "NSCopying"

[[rules]]
name = "target-kind"
check = "target"
kinds = ["variable"]
message = "overridden"
"#;

#[test]
fn test_project_rule_set_adds_attribute() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("iboutlet.attr.toml"), IBOUTLET).expect("write");

    let mut registry = RuleRegistry::with_builtin().expect("built-in rule sets");
    let loaded = registry
        .load_directory(dir.path(), RuleSetPriority::Project)
        .expect("load directory");
    assert_eq!(loaded, 1);
    assert_eq!(registry.attribute_names(), vec!["IBOutlet", "NSCopying"]);

    let decl = Declaration::variable("label", Location::new(3, 14))
        .context(ContextKind::Struct)
        .build();
    let attr = AttributeInstance::new("IBOutlet", Location::new(3, 3), decl);
    let diagnostics = AttributeValidator::new(&registry).validate(&attr);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].to_string(),
        "3:3: warning: 'IBOutlet' property 'label' belongs in a class, not a struct"
    );
}

#[test]
fn test_higher_priority_overrides_builtin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nscopying.attr.toml");
    fs::write(&path, NSCOPYING_OVERRIDE).expect("write");

    let mut registry = RuleRegistry::with_builtin().expect("built-in rule sets");
    registry
        .load_directory(dir.path(), RuleSetPriority::UserGlobal)
        .expect("load directory");

    let loaded = registry.get_loaded("NSCopying").expect("registered");
    assert_eq!(loaded.priority, RuleSetPriority::UserGlobal);
    assert_eq!(loaded.source_path.as_deref(), Some(path.as_path()));
    assert_eq!(loaded.rule_set.rules.len(), 1);
}

#[test]
fn test_lower_priority_does_not_replace() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("nscopying.attr.toml"), NSCOPYING_OVERRIDE).expect("write");

    let mut registry = RuleRegistry::with_builtin().expect("built-in rule sets");
    registry
        .load_directory(dir.path(), RuleSetPriority::Project)
        .expect("load directory");
    let mut again = registry.clone();
    assert!(!again.add(
        attr_verify::RuleSet::from_toml(attr_verify::rules::NSCOPYING_RULES).expect("parse"),
        RuleSetPriority::BuiltIn,
        None,
    ));
    assert_eq!(again.get("NSCopying").expect("registered").rules.len(), 1);
}

#[test]
fn test_bad_files_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("broken.toml"), "[attribute\nname = ").expect("write");
    fs::write(
        dir.path().join("slot.toml"),
        "[attribute]\nname = \"X\"\n[[rules]]\nname = \"r\"\ncheck = \"mutable\"\nmessage = \"{nope}\"\n",
    )
    .expect("write");
    fs::write(dir.path().join("iboutlet.toml"), IBOUTLET).expect("write");
    fs::write(dir.path().join("README.md"), "not a rule set").expect("write");

    let mut registry = RuleRegistry::new();
    let loaded = registry
        .load_directory(dir.path(), RuleSetPriority::Project)
        .expect("load directory");
    assert_eq!(loaded, 1);
    assert_eq!(registry.attribute_names(), vec!["IBOutlet"]);
}

#[test]
fn test_missing_directory_loads_nothing() {
    let mut registry = RuleRegistry::new();
    let loaded = registry
        .load_directory(std::path::Path::new("/nonexistent/attributes"), RuleSetPriority::Project)
        .expect("missing directory is fine");
    assert_eq!(loaded, 0);
}

#[test]
fn test_custom_rule_set_drives_fixture() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("iboutlet.toml"), IBOUTLET).expect("write");
    let mut registry = RuleRegistry::with_builtin().expect("built-in rule sets");
    registry
        .load_directory(dir.path(), RuleSetPriority::Project)
        .expect("load directory");

    let source = "\
struct View {
  @IBOutlet var label : Label  // expected-warning {{'IBOutlet' property 'label' belongs in a class, not a struct}}
}
@IBOutlet func wire() {}  // expected-error {{only instance properties can be declared 'IBOutlet'}}
";
    let runner = FixtureRunner::new(&registry, MarkerPolicy::Collapse);
    let result = runner
        .run(&Fixture::from_source("custom", source))
        .expect("fixture runs");
    assert!(result.passed, "{result:#?}");
}
