//! Shared execution context for dispatched calls
//!
//! One `Context` lives for the whole bridge process. Every function,
//! assertion, and hook dispatched over the protocol sees the same instance,
//! so values stored by one call are visible to every later call.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Virtual clock override synced from the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockState {
    /// Virtual time in milliseconds since the Unix epoch
    pub virtual_time_ms: Option<i64>,
    /// Virtual time as an ISO 8601 string
    pub virtual_time_iso: Option<String>,
    /// Whether time is frozen
    pub frozen: bool,
}

/// State shared by all calls dispatched during one bridge lifetime
///
/// Holds the key-value store, step outputs synced from the orchestrator,
/// the current execution identity, and an optional virtual clock.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Arbitrary key-value data store
    data: HashMap<String, Value>,

    /// Step outputs (step id -> output name -> value)
    step_outputs: HashMap<String, HashMap<String, String>>,

    /// Current run ID
    run_id: String,

    /// Current job name
    job_name: String,

    /// Current step name
    step_name: String,

    /// Virtual clock override, if any
    clock: Option<ClockState>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value from the data store
    ///
    /// Returns `None` for keys that were never set. A stored JSON `null` is
    /// still `Some`, so callers can tell the two apart.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set a value in the data store, creating the key if new
    pub fn set(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    /// Remove a key from the data store
    ///
    /// Returns true if the key existed and was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Clear keys matching a pattern, returning how many were removed
    ///
    /// Pattern forms:
    /// - `*` matches every key
    /// - `*substr*` matches keys containing `substr`
    /// - `*suffix` matches keys ending with `suffix`
    /// - `prefix*` matches keys starting with `prefix`
    /// - anything else matches only the exact key
    ///
    /// Zero matches is not an error; the count is simply 0.
    pub fn clear(&mut self, pattern: &str) -> u64 {
        if pattern == "*" {
            let count = self.data.len() as u64;
            self.data.clear();
            return count;
        }

        let keys_to_remove: Vec<String> = self
            .data
            .keys()
            .filter(|k| Self::matches_pattern(k, pattern))
            .cloned()
            .collect();

        for key in &keys_to_remove {
            self.data.remove(key);
        }
        keys_to_remove.len() as u64
    }

    fn matches_pattern(key: &str, pattern: &str) -> bool {
        if pattern == "*" {
            return true;
        }
        if pattern.len() >= 2 && pattern.starts_with('*') && pattern.ends_with('*') {
            return key.contains(&pattern[1..pattern.len() - 1]);
        }
        if let Some(suffix) = pattern.strip_prefix('*') {
            return key.ends_with(suffix);
        }
        if let Some(prefix) = pattern.strip_suffix('*') {
            return key.starts_with(prefix);
        }
        key == pattern
    }

    /// Get all data in the context
    pub fn data(&self) -> &HashMap<String, Value> {
        &self.data
    }

    /// Get one output of a previous step
    pub fn get_step_output(&self, step_id: &str, output_name: &str) -> Option<&String> {
        self.step_outputs.get(step_id)?.get(output_name)
    }

    /// Get all outputs synced for a step
    pub fn get_step_outputs(&self, step_id: &str) -> Option<&HashMap<String, String>> {
        self.step_outputs.get(step_id)
    }

    /// Merge outputs into a step's output map
    ///
    /// Earlier outputs for the same step are kept; an output name that
    /// appears again is overwritten.
    pub fn sync_step_outputs(&mut self, step_id: &str, outputs: HashMap<String, String>) {
        self.step_outputs
            .entry(step_id.to_string())
            .or_default()
            .extend(outputs);
    }

    /// Get the current run ID
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the current job name
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Get the current step name
    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    /// Overwrite the execution identity wholesale
    pub fn set_execution_info(&mut self, run_id: &str, job_name: &str, step_name: &str) {
        self.run_id = run_id.to_string();
        self.job_name = job_name.to_string();
        self.step_name = step_name.to_string();
    }

    /// Replace the virtual clock override wholesale
    pub fn set_clock(
        &mut self,
        virtual_time_ms: Option<i64>,
        virtual_time_iso: Option<String>,
        frozen: bool,
    ) {
        self.clock = Some(ClockState {
            virtual_time_ms,
            virtual_time_iso,
            frozen,
        });
    }

    /// Get the virtual clock override, if one was synced
    pub fn clock(&self) -> Option<&ClockState> {
        self.clock.as_ref()
    }

    /// Whether a virtual clock with a set virtual time is active
    pub fn is_clock_mocked(&self) -> bool {
        self.clock
            .as_ref()
            .map(|c| c.virtual_time_ms.is_some())
            .unwrap_or(false)
    }

    /// Current time: virtual time when the clock is mocked, wall clock otherwise
    pub fn now(&self) -> DateTime<Utc> {
        if let Some(clock) = &self.clock {
            if let Some(ms) = clock.virtual_time_ms {
                if let Some(t) = DateTime::from_timestamp_millis(ms) {
                    return t;
                }
            }
        }
        Utc::now()
    }
}
