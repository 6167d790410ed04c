//! # extension-bridge
//!
//! A subprocess bridge that exposes user-defined functions, custom
//! assertions, and lifecycle hooks from a dynamically loaded extension
//! library over newline-delimited JSON-RPC on stdin/stdout.
//!
//! An orchestrator (a workflow or test runner) spawns the bridge, streams
//! request envelopes on stdin, and reads correlated response envelopes on
//! stdout. stderr carries diagnostics only.
//!
//! ## Pieces
//!
//! - [`Context`] - state shared by every dispatched call: a key-value
//!   store, step outputs, execution identity, and an optional virtual clock
//! - [`Registry`] - name tables for functions, assertions, and hooks,
//!   populated while loading the extension
//! - [`load_extension`] - loads a cdylib extension and harvests its
//!   callables into a registry
//! - [`RpcServer`] / [`serve`] - the dispatcher and the synchronous
//!   line loop
//!
//! ## Quick start
//!
//! An extension is usually a separate cdylib (see `demos/example-extension`),
//! but a registry can also be built in process and served directly:
//!
//! ```rust,no_run
//! use extension_bridge::{serve, Registry};
//! use serde_json::{json, Value};
//!
//! fn main() {
//!     let mut registry = Registry::new();
//!     registry.register_function("add", "Add two numbers", |args, _ctx| {
//!         let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
//!         let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
//!         Ok(json!(a + b))
//!     });
//!     serve(registry);
//! }
//! ```

pub mod context;
pub mod extension;
pub mod registry;
pub mod server;

// Re-export main types
pub use context::{ClockState, Context};
pub use extension::{load_extension, LoadError};
pub use registry::{
    AssertionFn, AssertionResult, FunctionFn, FunctionInfo, HookFn, Registry,
};
pub use server::{error_codes, serve, RpcError, RpcRequest, RpcResponse, RpcServer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{ClockState, Context};
    pub use crate::extension::{load_extension, LoadError};
    pub use crate::registry::{AssertionResult, FunctionInfo, Registry};
    pub use crate::server::{serve, RpcServer};
}
