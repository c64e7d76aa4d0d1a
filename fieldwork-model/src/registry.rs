//! Process-wide table of field adapters keyed by kind tag.
//!
//! The table is seeded with the built-in scalar kinds on first access and
//! is append-only afterwards. Writes take the lock exclusively; reads share
//! it. Fields copy the function pointer out at declaration time, so
//! adaptation itself never touches the lock.

use crate::error::{ModelError, ModelResult};
use crate::kind::{BUILTIN_KINDS, FieldKind};
use crate::Value;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};
use tracing::{debug, warn};

/// A pure coercion from a raw value to a kind's canonical value.
///
/// `Err` carries a human-readable rejection reason.
pub type AdaptFn = fn(&Value) -> Result<Value, String>;

static GLOBAL: OnceLock<AdapterRegistry> = OnceLock::new();

/// Maps kind tags to their adapters.
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<String, AdaptFn>>,
}

impl AdapterRegistry {
    /// Creates a registry holding only the built-in scalar kinds.
    #[must_use]
    pub fn new() -> Self {
        let adapters = BUILTIN_KINDS
            .iter()
            .filter_map(|tag| {
                let adapt = FieldKind::builtin(tag)?.scalar_adapter()?;
                Some(((*tag).to_owned(), adapt))
            })
            .collect();
        Self {
            adapters: RwLock::new(adapters),
        }
    }

    /// The process-wide registry consulted by `FieldKind::from_tag`.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Registers `adapt` under `kind`.
    ///
    /// Registering the same function twice is a no-op; registering a
    /// different function for a taken tag fails with `ConflictingAdapter`.
    pub fn register(&self, kind: &str, adapt: AdaptFn) -> ModelResult<()> {
        let mut adapters = self.adapters.write().unwrap_or_else(PoisonError::into_inner);
        match adapters.get(kind) {
            Some(existing) if std::ptr::fn_addr_eq(*existing, adapt) => Ok(()),
            Some(_) => {
                warn!(kind = %kind, "Rejected conflicting adapter registration");
                Err(ModelError::ConflictingAdapter {
                    kind: kind.to_owned(),
                })
            }
            None => {
                adapters.insert(kind.to_owned(), adapt);
                debug!(kind = %kind, "Registered field adapter");
                Ok(())
            }
        }
    }

    /// Looks up the adapter for `kind`.
    pub fn lookup(&self, kind: &str) -> ModelResult<AdaptFn> {
        let adapters = self.adapters.read().unwrap_or_else(PoisonError::into_inner);
        adapters
            .get(kind)
            .copied()
            .ok_or_else(|| ModelError::UnknownKind {
                kind: kind.to_owned(),
            })
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        let adapters = self.adapters.read().unwrap_or_else(PoisonError::into_inner);
        adapters.contains_key(kind)
    }

    /// All registered tags, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<String> {
        let adapters = self.adapters.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<String> = adapters.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Adapts `raw` with the adapter registered for `kind`. Errors carry the
    /// tag as their path.
    pub fn adapt(&self, kind: &str, raw: &Value) -> ModelResult<Value> {
        let adapt = self.lookup(kind)?;
        adapt(raw).map_err(|reason| ModelError::adaptation(kind, raw, reason))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
