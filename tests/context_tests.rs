use std::collections::HashMap;

use extension_bridge::Context;
use serde_json::{json, Value};

fn context_with_keys(keys: &[&str]) -> Context {
    let mut ctx = Context::new();
    for key in keys {
        ctx.set(key, json!(1));
    }
    ctx
}

#[test]
fn test_set_then_get_returns_value() {
    let mut ctx = Context::new();
    ctx.set("num", json!(5));
    ctx.set("obj", json!({ "nested": [1, 2, 3] }));

    assert_eq!(ctx.get("num"), Some(&json!(5)));
    assert_eq!(ctx.get("obj"), Some(&json!({ "nested": [1, 2, 3] })));
}

#[test]
fn test_clear_star_removes_all_and_counts() {
    let mut ctx = context_with_keys(&["a", "b", "c", "d"]);

    assert_eq!(ctx.clear("*"), 4);
    for key in ["a", "b", "c", "d"] {
        assert_eq!(ctx.get(key), None);
    }
    assert_eq!(ctx.clear("*"), 0);
}

#[test]
fn test_clear_prefix_only() {
    let mut ctx = context_with_keys(&["foo_a", "foo_b", "bar_a"]);

    assert_eq!(ctx.clear("foo*"), 2);
    assert_eq!(ctx.get("foo_a"), None);
    assert!(ctx.get("bar_a").is_some());
}

#[test]
fn test_clear_suffix_only() {
    let mut ctx = context_with_keys(&["a_bar", "b_bar", "a_baz"]);

    assert_eq!(ctx.clear("*bar"), 2);
    assert!(ctx.get("a_baz").is_some());
}

#[test]
fn test_clear_contains_only() {
    let mut ctx = context_with_keys(&["x_mid_y", "midway", "nothing"]);

    assert_eq!(ctx.clear("*mid*"), 2);
    assert!(ctx.get("nothing").is_some());
}

#[test]
fn test_clear_exact_literal() {
    let mut ctx = context_with_keys(&["exact", "exact_not"]);

    assert_eq!(ctx.clear("exact"), 1);
    assert!(ctx.get("exact_not").is_some());

    // No matches is not an error.
    assert_eq!(ctx.clear("never_set"), 0);
    assert!(ctx.get("exact_not").is_some());
}

#[test]
fn test_absent_key_differs_from_stored_null() {
    let mut ctx = Context::new();
    ctx.set("null_value", Value::Null);

    assert_eq!(ctx.get("null_value"), Some(&Value::Null));
    assert_eq!(ctx.get("never_set"), None);
}

#[test]
fn test_step_outputs_union_of_disjoint_syncs() {
    let mut ctx = Context::new();

    let mut first = HashMap::new();
    first.insert("alpha".to_string(), "1".to_string());
    first.insert("beta".to_string(), "2".to_string());
    ctx.sync_step_outputs("build", first);

    let mut second = HashMap::new();
    second.insert("gamma".to_string(), "3".to_string());
    ctx.sync_step_outputs("build", second);

    let outputs = ctx.get_step_outputs("build").unwrap();
    assert_eq!(outputs.len(), 3);
    assert_eq!(ctx.get_step_output("build", "alpha"), Some(&"1".to_string()));
    assert_eq!(ctx.get_step_output("build", "gamma"), Some(&"3".to_string()));
}

#[test]
fn test_step_outputs_are_per_step() {
    let mut ctx = Context::new();

    let mut outputs = HashMap::new();
    outputs.insert("result".to_string(), "ok".to_string());
    ctx.sync_step_outputs("one", outputs);

    assert!(ctx.get_step_outputs("two").is_none());
    assert_eq!(ctx.get_step_output("two", "result"), None);
}

#[test]
fn test_remove_reports_existence() {
    let mut ctx = Context::new();
    ctx.set("gone", json!("soon"));

    assert!(ctx.remove("gone"));
    assert!(!ctx.remove("gone"));
    assert!(!ctx.remove("never_there"));
}

#[test]
fn test_virtual_clock_over_wall_clock() {
    let mut ctx = Context::new();
    assert!(!ctx.is_clock_mocked());

    ctx.set_clock(Some(1700000000000), None, true);
    assert!(ctx.is_clock_mocked());
    assert_eq!(ctx.now().timestamp_millis(), 1700000000000);

    // Clearing the virtual time falls back to wall clock.
    ctx.set_clock(None, None, false);
    assert!(!ctx.is_clock_mocked());
}
