//! Hooks dispatcher
//!
//! A hook is a named interception point in front of a core editing operation.
//! The host (and hook-provider extensions) supply functions keyed by name; the
//! core resolves them fresh on every dispatch, so swapping the table between
//! renders takes effect immediately.
//!
//! A hook answers with a [`HookOutcome`]:
//! - `Veto` cancels the operation,
//! - `Override(value)` substitutes the payload if `value` has the payload's shape,
//! - `Continue` (or an override of the wrong shape) runs the operation unchanged.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub const TOGGLE_TEXT_COLOR: &str = "toggle-text-color";
pub const TOGGLE_TEXT_BACKGROUND_COLOR: &str = "toggle-text-background-color";
pub const INSERT_EMOTICON: &str = "insert-emoticon";
pub const INSERT_HORIZONTAL_LINE: &str = "insert-horizontal-line";
pub const REMOVE_BLOCK: &str = "remove-block";
pub const CLEAR_EDITOR_CONTENT: &str = "clear-editor-content";

#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    Veto,
    Override(Value),
    Continue,
}

pub type HookFn = Arc<dyn Fn(&Value) -> HookOutcome + Send + Sync>;

/// Wraps a closure as a [`HookFn`]
pub fn hook_fn<F>(f: F) -> HookFn
where
    F: Fn(&Value) -> HookOutcome + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Hook table keyed by hook name
#[derive(Clone, Default)]
pub struct Hooks {
    table: HashMap<String, HookFn>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.table.keys().collect();
        names.sort();
        f.debug_struct("Hooks").field("names", &names).finish()
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Value) -> HookOutcome + Send + Sync + 'static,
    {
        self.insert(name, Arc::new(hook));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, hook: HookFn) {
        self.table.insert(name.into(), hook);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The registered hook for `name`, or one that always answers `default`
    pub fn resolve(&self, name: &str, default: HookOutcome) -> HookFn {
        match self.table.get(name) {
            Some(hook) => Arc::clone(hook),
            None => Arc::new(move |_: &Value| default.clone()),
        }
    }

    /// Adds hooks for names this table does not define yet
    pub fn fill_from<'a>(&mut self, hooks: impl IntoIterator<Item = &'a (String, HookFn)>) {
        for (name, hook) in hooks {
            self.table
                .entry(name.clone())
                .or_insert_with(|| Arc::clone(hook));
        }
    }

    /// Runs hook `name` against `payload`.
    ///
    /// Returns `None` when the hook vetoes the operation, otherwise the payload
    /// to proceed with (substituted or unchanged).
    pub fn apply<T>(&self, name: &str, payload: T) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
    {
        if !self.contains(name) {
            return Some(payload);
        }

        let value = match serde_json::to_value(&payload) {
            Ok(value) => value,
            Err(_) => return Some(payload),
        };

        match self.resolve(name, HookOutcome::Continue)(&value) {
            HookOutcome::Veto => {
                debug!(hook = name, "operation vetoed by hook");
                None
            }
            HookOutcome::Override(replacement) => match serde_json::from_value::<T>(replacement) {
                Ok(substituted) => {
                    debug!(hook = name, "payload substituted by hook");
                    Some(substituted)
                }
                Err(_) => {
                    debug!(hook = name, "ignoring hook override of unexpected shape");
                    Some(payload)
                }
            },
            HookOutcome::Continue => Some(payload),
        }
    }
}
