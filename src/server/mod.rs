//! Dispatcher and protocol loop
//!
//! Reads one request line at a time, dispatches it against the fixed method
//! table, and writes exactly one response line. Processing is strictly
//! sequential: a request runs to completion, including any user callable it
//! invokes, before the next line is read. Empty lines are skipped; a line
//! that does not parse as a request produces a parse-error response with a
//! null id.

mod rpc;

pub use rpc::{error_codes, RpcError, RpcRequest, RpcResponse};

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::context::Context;
use crate::registry::{AssertionResult, Registry};

/// Serve the line protocol on stdin/stdout until the input stream closes
pub fn serve(registry: Registry) {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut server = RpcServer::new(registry);
    server.run(stdin.lock(), stdout.lock());
}

/// The bridge server: registry, context, and the dispatch table
pub struct RpcServer {
    registry: Registry,
    context: Context,
}

impl RpcServer {
    /// Create a server with a fresh execution context
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            context: Context::new(),
        }
    }

    /// Process request lines from `reader` until EOF, writing one response
    /// line per request to `writer`
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) {
        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!(error = %e, "failed to read request line, shutting down");
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line);
            let json = serde_json::to_string(&response).unwrap();
            if writeln!(writer, "{}", json).is_err() {
                break;
            }
            if writer.flush().is_err() {
                break;
            }
        }
    }

    /// Turn one non-empty input line into exactly one response
    pub fn handle_line(&mut self, line: &str) -> RpcResponse {
        match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.handle_request(request),
            Err(e) => RpcResponse::error(
                Value::Null,
                error_codes::PARSE_ERROR,
                format!("Parse error: {}", e),
            ),
        }
    }

    fn handle_request(&mut self, req: RpcRequest) -> RpcResponse {
        debug!(method = %req.method, "dispatching");
        match req.method.as_str() {
            "fn.call" => self.handle_fn_call(req.id, req.params),
            "ctx.get" => self.handle_ctx_get(req.id, req.params),
            "ctx.set" => self.handle_ctx_set(req.id, req.params),
            "ctx.clear" => self.handle_ctx_clear(req.id, req.params),
            "ctx.setExecutionInfo" => self.handle_set_execution_info(req.id, req.params),
            "ctx.syncStepOutputs" => self.handle_sync_step_outputs(req.id, req.params),
            "hook.call" => self.handle_hook_call(req.id, req.params),
            "assert.custom" => self.handle_assert_custom(req.id, req.params),
            "list_functions" => self.handle_list_functions(req.id),
            "list_assertions" => self.handle_list_assertions(req.id),
            "clock.sync" => self.handle_clock_sync(req.id, req.params),
            other => RpcResponse::error(
                req.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        }
    }

    fn handle_fn_call(&mut self, id: Value, params: Value) -> RpcResponse {
        let name = match params.get("name").and_then(Value::as_str) {
            Some(n) => n,
            None => {
                return RpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing 'name' param")
            }
        };
        let args = params.get("args").cloned().unwrap_or(Value::Null);

        let function = match self.registry.function(name) {
            Some(f) => f,
            None => {
                return RpcResponse::error(
                    id,
                    error_codes::HANDLER_ERROR,
                    format!(
                        "Function not found: {}. Available: {}",
                        name,
                        self.registry.function_names().join(", ")
                    ),
                );
            }
        };

        match function(args, &mut self.context) {
            Ok(result) => RpcResponse::success(id, json!({ "result": result })),
            Err(e) => RpcResponse::error(id, error_codes::HANDLER_ERROR, e),
        }
    }

    fn handle_ctx_get(&self, id: Value, params: Value) -> RpcResponse {
        let key = match params.get("key").and_then(Value::as_str) {
            Some(k) => k,
            None => {
                return RpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing 'key' param")
            }
        };

        // Absent keys serialize as null; see DESIGN.md.
        let value = self.context.get(key).cloned().unwrap_or(Value::Null);
        RpcResponse::success(id, json!({ "value": value }))
    }

    fn handle_ctx_set(&mut self, id: Value, params: Value) -> RpcResponse {
        let key = match params.get("key").and_then(Value::as_str) {
            Some(k) => k,
            None => {
                return RpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing 'key' param")
            }
        };

        let value = params.get("value").cloned().unwrap_or(Value::Null);
        self.context.set(key, value);
        RpcResponse::success(id, json!({}))
    }

    fn handle_ctx_clear(&mut self, id: Value, params: Value) -> RpcResponse {
        let pattern = params
            .get("pattern")
            .and_then(Value::as_str)
            .unwrap_or("*");

        let cleared = self.context.clear(pattern);
        RpcResponse::success(id, json!({ "cleared": cleared }))
    }

    fn handle_set_execution_info(&mut self, id: Value, params: Value) -> RpcResponse {
        let run_id = params.get("runId").and_then(Value::as_str).unwrap_or("");
        let job_name = params.get("jobName").and_then(Value::as_str).unwrap_or("");
        let step_name = params
            .get("stepName")
            .and_then(Value::as_str)
            .unwrap_or("");

        self.context.set_execution_info(run_id, job_name, step_name);
        RpcResponse::success(id, json!({}))
    }

    fn handle_sync_step_outputs(&mut self, id: Value, params: Value) -> RpcResponse {
        let step_id = match params.get("stepId").and_then(Value::as_str) {
            Some(s) => s,
            None => {
                return RpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing 'stepId' param",
                )
            }
        };

        let outputs: HashMap<String, String> = params
            .get("outputs")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        self.context.sync_step_outputs(step_id, outputs);
        RpcResponse::success(id, json!({}))
    }

    fn handle_hook_call(&mut self, id: Value, params: Value) -> RpcResponse {
        let name = match params.get("hook").and_then(Value::as_str) {
            Some(h) => h,
            None => {
                return RpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing 'hook' param")
            }
        };

        // An unregistered hook is a silent no-op, not an error.
        match self.registry.hook(name) {
            Some(hook) => match hook(&mut self.context) {
                Ok(()) => RpcResponse::success(id, json!({})),
                Err(e) => RpcResponse::error(id, error_codes::HANDLER_ERROR, e),
            },
            None => RpcResponse::success(id, json!({})),
        }
    }

    fn handle_assert_custom(&self, id: Value, params: Value) -> RpcResponse {
        let name = match params.get("name").and_then(Value::as_str) {
            Some(n) => n,
            None => {
                return RpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing 'name' param")
            }
        };
        let assertion_params = params.get("params").cloned().unwrap_or(Value::Null);

        // Assertion failure is data, never a protocol error: unknown names
        // and failing callables both come back as a failed result payload.
        let result = match self.registry.assertion(name) {
            Some(assertion) => match assertion(assertion_params, &self.context) {
                Ok(value) => AssertionResult::from_return(value),
                Err(message) => AssertionResult::fail(message),
            },
            None => AssertionResult::fail(format!(
                "Assertion not found: {}. Available: {}",
                name,
                self.registry.assertion_names().join(", ")
            )),
        };

        RpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    fn handle_list_functions(&self, id: Value) -> RpcResponse {
        RpcResponse::success(id, json!({ "functions": self.registry.list_functions() }))
    }

    fn handle_list_assertions(&self, id: Value) -> RpcResponse {
        RpcResponse::success(id, json!({ "assertions": self.registry.list_assertions() }))
    }

    fn handle_clock_sync(&mut self, id: Value, params: Value) -> RpcResponse {
        let virtual_time_ms = params.get("virtual_time_ms").and_then(Value::as_i64);
        let virtual_time_iso = params
            .get("virtual_time_iso")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        let frozen = params
            .get("frozen")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        self.context
            .set_clock(virtual_time_ms, virtual_time_iso, frozen);
        RpcResponse::success(id, json!({}))
    }
}
