//! Resolution of registered components against the shared container state.
//!
//! This module holds everything the resolver touches while a container lock
//! is held: the registry, the instance cache and the build state. The
//! [`ResolverContext`] walks the dependency graph over that state, and
//! [`Fields`] is the handle field wiring receives.

use crate::cache::InstanceCache;
use crate::error::DiError;
use crate::registration::Registry;

pub mod context;
pub mod fields;

pub use context::ResolverContext;
pub use fields::Fields;

/// Lifecycle of the one-shot build pass.
///
/// `Unbuilt → Building → Built`, never back. A pass that fails lands in
/// `Failed` and every later entry point reports it.
#[derive(Debug, Clone)]
pub(crate) enum BuildState {
    Unbuilt,
    Building,
    Built,
    Failed(DiError),
}

impl BuildState {
    /// Whether the build pass has started, successfully or not.
    pub(crate) fn has_started(&self) -> bool {
        !matches!(self, BuildState::Unbuilt)
    }
}

/// Mutable container state, guarded by the container lock.
pub(crate) struct State {
    pub(crate) registry: Registry,
    pub(crate) cache: InstanceCache,
    pub(crate) build: BuildState,
}

impl State {
    pub(crate) fn new() -> Self {
        Self {
            registry: Registry::new(),
            cache: InstanceCache::new(),
            build: BuildState::Unbuilt,
        }
    }
}
