//! Extension library loading
//!
//! An extension is a compiled dynamic library (cdylib) built against this
//! crate. It contributes callables through conventionally named exported
//! symbols, all of which are optional:
//!
//! - [`REGISTER_SYMBOL`]: an entry point handed a mutable [`Registry`] to
//!   populate with explicit `register_*` calls.
//! - [`FUNCTIONS_SYMBOL`], [`ASSERTIONS_SYMBOL`], [`HOOKS_SYMBOL`]:
//!   declarative name-to-callable tables, merged after the entry point has
//!   run. A table entry for an already registered name overwrites it.
//!
//! An absent symbol simply contributes no entries of that kind. A path that
//! does not exist or a library that cannot be loaded is a fatal load error;
//! the bridge must not start serving after one.
//!
//! The symbols carry Rust types across the boundary, so extension and bridge
//! must be built with the same toolchain.

use std::collections::HashMap;
use std::path::Path;

use libloading::Library;
use tracing::debug;

use crate::registry::{AssertionFn, FunctionFn, HookFn, Registry};

/// Entry point the module may export for explicit registration
pub const REGISTER_SYMBOL: &[u8] = b"bridge_register";
/// Declarative function table symbol
pub const FUNCTIONS_SYMBOL: &[u8] = b"bridge_functions";
/// Declarative assertion table symbol
pub const ASSERTIONS_SYMBOL: &[u8] = b"bridge_assertions";
/// Declarative hook table symbol
pub const HOOKS_SYMBOL: &[u8] = b"bridge_hooks";

/// Signature of [`REGISTER_SYMBOL`]
pub type RegisterFn = unsafe extern "C" fn(&mut Registry);
/// Signature of [`FUNCTIONS_SYMBOL`]
pub type FunctionTableFn = unsafe extern "C" fn() -> HashMap<String, FunctionFn>;
/// Signature of [`ASSERTIONS_SYMBOL`]
pub type AssertionTableFn = unsafe extern "C" fn() -> HashMap<String, AssertionFn>;
/// Signature of [`HOOKS_SYMBOL`]
pub type HookTableFn = unsafe extern "C" fn() -> HashMap<String, HookFn>;

/// Errors from the load phase; all of them abort startup
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Extension library not found: {0}")]
    NotFound(String),

    #[error("Failed to load extension library {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: libloading::Error,
    },
}

/// Load an extension library and build its registry
///
/// Runs the explicit registration entry point first, then merges the
/// declarative tables over it. The loaded library is kept alive inside the
/// returned registry so the harvested callables stay valid.
pub fn load_extension(path: &Path) -> Result<Registry, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.display().to_string()));
    }

    let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let mut registry = Registry::new();

    // Symbol signatures are trusted; same-toolchain contract.
    unsafe {
        match library.get::<RegisterFn>(REGISTER_SYMBOL) {
            Ok(register) => register(&mut registry),
            Err(_) => debug!("extension exports no registration entry point"),
        }
        if let Ok(table) = library.get::<FunctionTableFn>(FUNCTIONS_SYMBOL) {
            registry.merge_functions(table());
        }
        if let Ok(table) = library.get::<AssertionTableFn>(ASSERTIONS_SYMBOL) {
            registry.merge_assertions(table());
        }
        if let Ok(table) = library.get::<HookTableFn>(HOOKS_SYMBOL) {
            registry.merge_hooks(table());
        }
    }

    debug!(
        functions = registry.function_names().len(),
        assertions = registry.assertion_names().len(),
        hooks = registry.hook_names().len(),
        "extension loaded"
    );

    registry.attach_library(library);
    Ok(registry)
}
