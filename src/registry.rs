//! Per-instance extension registry
//!
//! The registry is an explicit object shared (via `Arc`) by every editor that
//! should see the same extension table. Entries are bucketed by instance id;
//! an instance without an id uses the shared [`GLOBAL_INSTANCE`] bucket.
//!
//! Within a bucket, an extension is identified by its (type, name) pair. The
//! first registration of a pair stands and later ones are ignored, so
//! declaring the same extensions again on every render is harmless.
//! Registration order is kept as a FIFO and is the order every consumer sees.
//!
//! # Examples
//!
//! ```ignore
//! let registry = ExtensionRegistry::new();
//! registry.register(Some("editor-1"), emoticon::extension(Default::default()));
//!
//! let active = registry.resolve_for(Some("editor-1"));
//! ```

use crate::controls::Control;
use crate::extension::{DecoratorStrategy, Extension, ExtensionKind, PropInterceptor};
use crate::hooks::HookFn;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Bucket used when no instance id is given
pub const GLOBAL_INSTANCE: &str = "global";

/// Normalizes an optional instance id to its bucket key
pub fn instance_key(instance_id: Option<&str>) -> &str {
    match instance_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => GLOBAL_INSTANCE,
    }
}

#[derive(Debug, Default)]
struct Bucket {
    extensions: Vec<Extension>,
    revision: u64,
}

#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    buckets: RwLock<HashMap<String, Bucket>>,
    /// Registry-wide, never reused; bucket revisions are drawn from it
    generation: AtomicU64,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Bucket>> {
        self.buckets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Bucket>> {
        self.buckets.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_revision(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Appends `extension` to the instance's bucket.
    ///
    /// Returns `false` (and leaves the bucket untouched) when an extension of
    /// the same type and name is already registered for the instance.
    pub fn register(&self, instance_id: Option<&str>, extension: Extension) -> bool {
        let key = instance_key(instance_id);
        let mut buckets = self.write();
        let bucket = buckets.entry(key.to_string()).or_default();

        let kind = extension.extension_type();
        if bucket
            .extensions
            .iter()
            .any(|existing| existing.extension_type() == kind && existing.name == extension.name)
        {
            debug!(instance = key, kind = %kind, name = %extension.name, "extension already registered; ignoring");
            return false;
        }

        info!(instance = key, kind = %kind, name = %extension.name, "registered extension");
        bucket.extensions.push(extension);
        bucket.revision = self.next_revision();
        true
    }

    /// Registers each extension for each instance id; no ids means the global bucket
    pub fn use_extension(&self, extensions: impl IntoIterator<Item = Extension>, instance_ids: &[&str]) {
        let extensions: Vec<Extension> = extensions.into_iter().collect();
        if instance_ids.is_empty() {
            for extension in extensions {
                self.register(None, extension);
            }
            return;
        }
        for id in instance_ids {
            for extension in &extensions {
                self.register(Some(id), extension.clone());
            }
        }
    }

    /// Extensions that apply to the instance, in registration order.
    ///
    /// Each extension's own include/exclude lists are checked against the
    /// instance id.
    pub fn resolve_for(&self, instance_id: Option<&str>) -> Vec<Extension> {
        let key = instance_key(instance_id);
        let buckets = self.read();
        buckets
            .get(key)
            .map(|bucket| {
                bucket
                    .extensions
                    .iter()
                    .filter(|extension| extension.scope.applies_to(key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Changes on every successful registration or removal and never repeats a
    /// value seen before for the id; 0 for unknown ids
    pub fn revision(&self, instance_id: Option<&str>) -> u64 {
        self.read()
            .get(instance_key(instance_id))
            .map(|bucket| bucket.revision)
            .unwrap_or(0)
    }

    /// Drops the instance's bucket. Returns whether one existed.
    pub fn unregister(&self, instance_id: Option<&str>) -> bool {
        let key = instance_key(instance_id);
        let removed = self.write().remove(key).is_some();
        if removed {
            self.next_revision();
            info!(instance = key, "unregistered instance");
        }
        removed
    }

    pub fn instance_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn prop_interceptors(&self, instance_id: Option<&str>) -> Vec<PropInterceptor> {
        self.resolve_for(instance_id)
            .into_iter()
            .filter_map(|extension| match extension.kind {
                ExtensionKind::PropInterceptor(interceptor) => Some(interceptor),
                _ => None,
            })
            .collect()
    }

    pub fn decorators(&self, instance_id: Option<&str>) -> Vec<(String, DecoratorStrategy)> {
        self.resolve_for(instance_id)
            .into_iter()
            .filter_map(|extension| match extension.kind {
                ExtensionKind::Decorator(strategy) => Some((extension.name, strategy)),
                _ => None,
            })
            .collect()
    }

    /// Controls contributed by the instance's extensions, in registration order
    pub fn controls(&self, instance_id: Option<&str>) -> Vec<Control> {
        self.resolve_for(instance_id)
            .iter()
            .filter_map(|extension| extension.contributed_control().cloned())
            .collect()
    }

    /// Hooks provided by hook-provider extensions; earlier providers come first
    pub fn hook_providers(&self, instance_id: Option<&str>) -> Vec<(String, HookFn)> {
        self.resolve_for(instance_id)
            .into_iter()
            .filter_map(|extension| match extension.kind {
                ExtensionKind::Hooks(hooks) => Some(hooks),
                _ => None,
            })
            .flatten()
            .collect()
    }
}
