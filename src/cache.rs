//! Singleton instance cache.

use std::any::TypeId;

use crate::error::{DiError, DiResult};
use crate::key::TypeInfo;
use crate::registration::{AnyArc, Map};

/// Type → wired singleton.
///
/// Single assignment: once a type has an entry, it is never constructed or
/// replaced again, and every requester shares that one instance.
#[derive(Default)]
pub(crate) struct InstanceCache {
    instances: Map<TypeId, AnyArc>,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn get(&self, id: TypeId) -> Option<AnyArc> {
        self.instances.get(&id).cloned()
    }

    #[inline]
    pub(crate) fn contains(&self, id: TypeId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Stores the first instance of `info`.
    pub(crate) fn insert(&mut self, info: TypeInfo, instance: AnyArc) -> DiResult<()> {
        if self.instances.contains_key(&info.id()) {
            return Err(DiError::AlreadyInstantiated(info.name()));
        }
        self.instances.insert(info.id(), instance);
        Ok(())
    }

    /// Drops the entry for `id`. Only valid before the first build pass
    /// starts, while nothing has been wired against the old instance.
    pub(crate) fn remove(&mut self, id: TypeId) -> Option<AnyArc> {
        self.instances.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.instances.len()
    }
}
