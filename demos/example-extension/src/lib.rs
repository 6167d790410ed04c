//! Example extension library
//!
//! Demonstrates both registration shapes the bridge loader understands: the
//! `bridge_register` entry point for explicit registration, and the
//! declarative `bridge_functions` / `bridge_assertions` / `bridge_hooks`
//! tables, which are merged afterwards.
//!
//! Build as a cdylib and hand the artifact to the bridge:
//!
//! ```text
//! extension-bridge --extension target/debug/libexample_extension.so
//! ```

use std::collections::HashMap;

use extension_bridge::{AssertionFn, Context, FunctionFn, HookFn, Registry};
use serde_json::{json, Value};

#[no_mangle]
#[allow(improper_ctypes_definitions)]
pub unsafe extern "C" fn bridge_register(registry: &mut Registry) {
    registry.register_function("add_numbers", "Add two numbers together", |args, _ctx| {
        let a = args.get("a").and_then(Value::as_f64).unwrap_or(0.0);
        let b = args.get("b").and_then(Value::as_f64).unwrap_or(0.0);
        Ok(json!(a + b))
    });

    registry.register_function("greet", "Generate a greeting message", |args, _ctx| {
        let name = args.get("name").and_then(Value::as_str).unwrap_or("World");
        Ok(json!(format!("Hello, {}!", name)))
    });

    registry.register_function(
        "store_and_retrieve",
        "Store a value in context and return it",
        |args, ctx| {
            let key = args
                .get("key")
                .and_then(Value::as_str)
                .ok_or("'key' is required")?;
            let value = args.get("value").cloned().unwrap_or(Value::Null);
            ctx.set(key, value);
            Ok(ctx.get(key).cloned().unwrap_or(Value::Null))
        },
    );

    registry.register_assertion("equals", "Assert two values are equal", |params, _ctx| {
        let actual = params.get("actual").cloned().unwrap_or(Value::Null);
        let expected = params.get("expected").cloned().unwrap_or(Value::Null);
        Ok(json!({
            "success": actual == expected,
            "actual": actual,
            "expected": expected,
        }))
    });

    registry.register_hook("before_all", |ctx| {
        ctx.set("setup_complete", json!(true));
        Ok(())
    });
}

#[no_mangle]
#[allow(improper_ctypes_definitions)]
pub unsafe extern "C" fn bridge_functions() -> HashMap<String, FunctionFn> {
    let mut functions: HashMap<String, FunctionFn> = HashMap::new();
    functions.insert(
        "multiply".to_string(),
        Box::new(|args: Value, _ctx: &mut Context| {
            let a = args.get("a").and_then(Value::as_f64).unwrap_or(0.0);
            let b = args.get("b").and_then(Value::as_f64).unwrap_or(0.0);
            Ok(json!(a * b))
        }),
    );
    functions
}

#[no_mangle]
#[allow(improper_ctypes_definitions)]
pub unsafe extern "C" fn bridge_assertions() -> HashMap<String, AssertionFn> {
    let mut assertions: HashMap<String, AssertionFn> = HashMap::new();
    assertions.insert(
        "is_positive".to_string(),
        Box::new(|params: Value, _ctx: &Context| {
            let value = params.get("value").and_then(Value::as_f64).unwrap_or(0.0);
            Ok(json!({
                "success": value > 0.0,
                "message": "Value must be positive",
                "actual": value,
                "expected": "> 0",
            }))
        }),
    );
    assertions
}

#[no_mangle]
#[allow(improper_ctypes_definitions)]
pub unsafe extern "C" fn bridge_hooks() -> HashMap<String, HookFn> {
    let mut hooks: HashMap<String, HookFn> = HashMap::new();
    hooks.insert(
        "after_all".to_string(),
        Box::new(|ctx: &mut Context| {
            ctx.clear("*");
            Ok(())
        }),
    );
    hooks
}
