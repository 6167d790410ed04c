//! Callable registry populated from a loaded extension
//!
//! The registry holds three independent name tables: functions, assertions,
//! and hooks. The same name may appear in more than one table with unrelated
//! meaning. Registration happens during the load phase; the dispatcher only
//! reads afterwards.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;

/// A registered function: arguments plus the shared context in, value out
pub type FunctionFn = Box<dyn Fn(Value, &mut Context) -> Result<Value, String> + Send + Sync>;

/// A registered assertion: parameters in, raw outcome out
///
/// The returned value is normalized by [`AssertionResult::from_return`];
/// an `Err` counts as a failed assertion, not a protocol error.
pub type AssertionFn = Box<dyn Fn(Value, &Context) -> Result<Value, String> + Send + Sync>;

/// A lifecycle hook: context only, return value discarded
pub type HookFn = Box<dyn Fn(&mut Context) -> Result<(), String> + Send + Sync>;

/// Information about a registered function or assertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Name the callable was registered under
    pub name: String,
    /// Human-readable description, empty if none was given
    pub description: String,
}

impl FunctionInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Outcome of a custom assertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub success: bool,
    /// Optional message (usually set on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Actual value that was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    /// Expected value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

impl AssertionResult {
    /// Create a passing result
    pub fn pass() -> Self {
        Self {
            success: true,
            message: None,
            actual: None,
            expected: None,
        }
    }

    /// Create a failing result
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            actual: None,
            expected: None,
        }
    }

    /// Create a failing result with the values that were compared
    pub fn fail_with_values(message: impl Into<String>, actual: Value, expected: Value) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            actual: Some(actual),
            expected: Some(expected),
        }
    }

    /// Normalize whatever an assertion callable returned
    ///
    /// An object is read field-wise with `success` defaulting to true; a
    /// bare boolean is the success flag; anything else is judged by its
    /// truthiness (null, zero, and empty values fail).
    pub fn from_return(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                success: map.get("success").map(truthy).unwrap_or(true),
                message: map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(String::from),
                actual: map.get("actual").filter(|v| !v.is_null()).cloned(),
                expected: map.get("expected").filter(|v| !v.is_null()).cloned(),
            },
            Value::Bool(success) => Self {
                success,
                message: None,
                actual: None,
                expected: None,
            },
            other => Self {
                success: truthy(&other),
                message: None,
                actual: None,
                expected: None,
            },
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

struct Entry<T> {
    description: String,
    callable: T,
}

/// Name tables for functions, assertions, and hooks
///
/// Last registration for a name wins within each table.
#[derive(Default)]
pub struct Registry {
    functions: HashMap<String, Entry<FunctionFn>>,
    assertions: HashMap<String, Entry<AssertionFn>>,
    hooks: HashMap<String, HookFn>,

    // Callables above may point into this library's code; it must be the
    // last field so it drops after them.
    library: Option<libloading::Library>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under a name, replacing any previous entry
    pub fn register_function<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        f: F,
    ) where
        F: Fn(Value, &mut Context) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.functions.insert(
            name.into(),
            Entry {
                description: description.into(),
                callable: Box::new(f),
            },
        );
    }

    /// Register an assertion under a name, replacing any previous entry
    pub fn register_assertion<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        f: F,
    ) where
        F: Fn(Value, &Context) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.assertions.insert(
            name.into(),
            Entry {
                description: description.into(),
                callable: Box::new(f),
            },
        );
    }

    /// Register a lifecycle hook under a name, replacing any previous entry
    pub fn register_hook<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut Context) -> Result<(), String> + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Box::new(f));
    }

    /// Merge a declarative function table; entries carry no description
    pub fn merge_functions(&mut self, table: impl IntoIterator<Item = (String, FunctionFn)>) {
        for (name, callable) in table {
            self.functions.insert(
                name,
                Entry {
                    description: String::new(),
                    callable,
                },
            );
        }
    }

    /// Merge a declarative assertion table; entries carry no description
    pub fn merge_assertions(&mut self, table: impl IntoIterator<Item = (String, AssertionFn)>) {
        for (name, callable) in table {
            self.assertions.insert(
                name,
                Entry {
                    description: String::new(),
                    callable,
                },
            );
        }
    }

    /// Merge a declarative hook table
    pub fn merge_hooks(&mut self, table: impl IntoIterator<Item = (String, HookFn)>) {
        for (name, callable) in table {
            self.hooks.insert(name, callable);
        }
    }

    /// Look up a function by name
    pub fn function(&self, name: &str) -> Option<&FunctionFn> {
        self.functions.get(name).map(|e| &e.callable)
    }

    /// Look up an assertion by name
    pub fn assertion(&self, name: &str) -> Option<&AssertionFn> {
        self.assertions.get(name).map(|e| &e.callable)
    }

    /// Look up a hook by name
    pub fn hook(&self, name: &str) -> Option<&HookFn> {
        self.hooks.get(name)
    }

    /// Registered function names, sorted
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered assertion names, sorted
    pub fn assertion_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.assertions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered hook names, sorted
    pub fn hook_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.hooks.keys().cloned().collect();
        names.sort();
        names
    }

    /// Functions with descriptions for introspection, sorted by name
    pub fn list_functions(&self) -> Vec<FunctionInfo> {
        let mut infos: Vec<FunctionInfo> = self
            .functions
            .iter()
            .map(|(name, entry)| FunctionInfo::new(name.clone(), entry.description.clone()))
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Assertions with descriptions for introspection, sorted by name
    pub fn list_assertions(&self) -> Vec<FunctionInfo> {
        let mut infos: Vec<FunctionInfo> = self
            .assertions
            .iter()
            .map(|(name, entry)| FunctionInfo::new(name.clone(), entry.description.clone()))
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Keep the library the callables came from alive with the registry
    pub(crate) fn attach_library(&mut self, library: libloading::Library) {
        self.library = Some(library);
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.function_names())
            .field("assertions", &self.assertion_names())
            .field("hooks", &self.hook_names())
            .finish()
    }
}
