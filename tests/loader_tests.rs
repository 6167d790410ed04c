use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use extension_bridge::{load_extension, Context, FunctionFn, LoadError, Registry};
use serde_json::{json, Value};

#[test]
fn test_missing_extension_is_fatal() {
    let err = load_extension(&PathBuf::from("/definitely/not/here.so")).unwrap_err();

    assert!(matches!(err, LoadError::NotFound(_)));
    assert!(err.to_string().contains("/definitely/not/here.so"));
}

#[test]
fn test_unloadable_extension_surfaces_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.so");
    fs::write(&path, b"this is a text file, not a shared object").unwrap();

    let err = load_extension(&path).unwrap_err();

    assert!(matches!(err, LoadError::Open { .. }));
    assert!(err.to_string().contains("broken.so"));
}

#[test]
fn test_explicit_registration_then_table_merge_precedence() {
    // Mirrors the loader's order: entry-point registrations first, then the
    // declarative tables merged over them.
    let mut registry = Registry::new();
    registry.register_function("shared", "from entry point", |_args, _ctx| {
        Ok(json!("explicit"))
    });
    registry.register_function("only_explicit", "", |_args, _ctx| Ok(json!(1)));

    let mut table: HashMap<String, FunctionFn> = HashMap::new();
    table.insert(
        "shared".to_string(),
        Box::new(|_args: Value, _ctx: &mut Context| Ok(json!("declarative"))),
    );
    table.insert(
        "only_table".to_string(),
        Box::new(|_args: Value, _ctx: &mut Context| Ok(json!(2))),
    );
    registry.merge_functions(table);

    let mut ctx = Context::new();
    let shared = registry.function("shared").unwrap()(Value::Null, &mut ctx).unwrap();
    assert_eq!(shared, json!("declarative"));
    assert!(registry.function("only_explicit").is_some());
    assert!(registry.function("only_table").is_some());
}

#[test]
fn test_empty_tables_are_fine() {
    let mut registry = Registry::new();
    registry.merge_functions(HashMap::new());
    registry.merge_assertions(HashMap::new());
    registry.merge_hooks(HashMap::new());

    assert!(registry.function_names().is_empty());
    assert!(registry.assertion_names().is_empty());
    assert!(registry.hook_names().is_empty());
}
