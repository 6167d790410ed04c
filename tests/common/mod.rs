#![allow(dead_code)]

use extension_bridge::{Registry, RpcServer};
use serde_json::Value;

/// Build a registry with a representative set of callables.
pub fn test_registry() -> Registry {
    use serde_json::json;

    let mut registry = Registry::new();

    registry.register_function("add", "Add two numbers", |args, _ctx| {
        let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
        let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
        Ok(json!(a + b))
    });

    registry.register_function("remember", "Store a value under a key", |args, ctx| {
        let key = args
            .get("key")
            .and_then(Value::as_str)
            .ok_or("'key' is required")?;
        ctx.set(key, args.get("value").cloned().unwrap_or(Value::Null));
        Ok(json!({ "stored": true }))
    });

    registry.register_function("step_output", "Read a synced step output", |args, ctx| {
        let step_id = args
            .get("stepId")
            .and_then(Value::as_str)
            .ok_or("'stepId' is required")?;
        let name = args
            .get("name")
            .and_then(Value::as_str)
            .ok_or("'name' is required")?;
        Ok(match ctx.get_step_output(step_id, name) {
            Some(value) => json!(value),
            None => Value::Null,
        })
    });

    registry.register_function("clock_info", "Report the clock as callables see it", |_args, ctx| {
        Ok(json!({
            "mocked": ctx.is_clock_mocked(),
            "now_ms": ctx.now().timestamp_millis(),
        }))
    });

    registry.register_function("whoami", "Report the execution identity", |_args, ctx| {
        Ok(json!({
            "runId": ctx.run_id(),
            "jobName": ctx.job_name(),
            "stepName": ctx.step_name(),
        }))
    });

    registry.register_function("explode", "Always fails", |_args, _ctx| {
        Err("boom".to_string())
    });

    registry.register_assertion("equals", "Assert two values are equal", |params, _ctx| {
        Ok(json!({
            "success": params.get("actual") == params.get("expected"),
            "actual": params.get("actual").cloned().unwrap_or(Value::Null),
            "expected": params.get("expected").cloned().unwrap_or(Value::Null),
        }))
    });

    registry.register_assertion("truthy", "Return the raw param for normalization", |params, _ctx| {
        Ok(params.get("value").cloned().unwrap_or(Value::Null))
    });

    registry.register_assertion("broken", "Always raises", |_params, _ctx| {
        Err("assertion blew up".to_string())
    });

    registry.register_hook("before_all", |ctx| {
        ctx.set("hook_ran", serde_json::json!(true));
        Ok(())
    });

    registry.register_hook("bad_hook", |_ctx| Err("hook failure".to_string()));

    registry
}

/// Run request lines through a fresh server and collect the response values.
pub fn run_lines(registry: Registry, input: &str) -> Vec<Value> {
    let mut output = Vec::new();
    let mut server = RpcServer::new(registry);
    server.run(input.as_bytes(), &mut output);

    String::from_utf8(output)
        .expect("responses are valid UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("responses are valid JSON"))
        .collect()
}
