//! Per-(unit, context) resources shared by host functions.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

use crate::{HostError, LOG_TARGET, UnitId};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`Context`](crate::Context) instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn fresh() -> Self {
        ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ResourceKey {
    unit: UnitId,
    context: ContextId,
}

type Resource = Arc<dyn Any + Send + Sync>;

/// Lazily built resources, one per (unit, context) pair. Entries live as
/// long as the cache.
#[derive(Default)]
pub struct ResourceCache {
    entries: DashMap<ResourceKey, Resource>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accessor scoped to one unit of one context.
    pub fn scoped(&self, unit: UnitId, context: ContextId) -> Resources<'_> {
        Resources {
            cache: self,
            key: ResourceKey { unit, context },
        }
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// A unit's view of the resource cache, handed to host functions.
#[derive(Clone, Copy)]
pub struct Resources<'a> {
    cache: &'a ResourceCache,
    key: ResourceKey,
}

impl Resources<'_> {
    pub fn unit(&self) -> UnitId {
        self.key.unit
    }

    /// The unit's resource, built by `init` on first use.
    ///
    /// Construction is single-flight: racing callers all observe the one
    /// instance that won. `init` must not touch the cache itself.
    pub fn get_or_init<T, F>(&self, init: F) -> Result<Arc<T>, HostError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let resource = self
            .cache
            .entries
            .entry(self.key)
            .or_insert_with(|| {
                debug!(target: LOG_TARGET, unit = ?self.key.unit, resource = type_name::<T>(), "creating resource");
                Arc::new(init()) as Resource
            })
            .value()
            .clone();

        resource.downcast::<T>().map_err(|_| {
            HostError::failed(format!(
                "resource for {:?} is not a {}",
                self.key.unit,
                type_name::<T>()
            ))
        })
    }

    /// The unit's resource if it was already built.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let resource = self.cache.entries.get(&self.key)?.value().clone();
        resource.downcast::<T>().ok()
    }
}

impl fmt::Debug for Resources<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resources").field("unit", &self.key.unit).finish()
    }
}
