//! Resolver context: the graph walk behind every lookup, hook and entry point.

use std::any::TypeId;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::ConstructionStack;
use crate::key::TypeInfo;
use crate::provider::{BuildState, State};
use crate::registration::{AnyArc, BuildFn, InitFn, Recipe};
use crate::traits::{Component, Dependency, Interface};
use crate::Container;

/// A ready instance paired with its post-wiring hook.
pub(crate) type ReadyHook = (AnyArc, InitFn);

/// Context handed to wiring code for resolving dependencies.
///
/// A context exists only while the container lock is held. It owns mutable
/// access to the registry, the instance cache and the interface bindings,
/// plus the stack of types currently under construction.
///
/// Most code never touches it directly: [`Dependency`] implementations,
/// [`Fields`](crate::Fields) and the generated `Resolvable` impls drive it.
/// A hand-written [`Injectable`](crate::Injectable) may call
/// [`resolve`](Self::resolve) for a dependency that is not a plain field.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{Component, Container, DiResult, Fields, Injectable, Wired};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Clock;
/// impl Component for Clock {}
/// ferrous_wire::injectable!(Clock {});
///
/// #[derive(Default)]
/// struct Report {
///     clock: Wired<Arc<Clock>>,
///     title: String,
/// }
/// impl Component for Report {}
///
/// impl Injectable for Report {
///     fn inject(&mut self, fields: &mut Fields<'_, '_>) -> DiResult<()> {
///         fields.wire("clock", &mut self.clock)?;
///         self.title = "daily".to_string();
///         Ok(())
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register(ferrous_wire::Blueprint::injected::<Clock>())
///     .register(ferrous_wire::Blueprint::injected::<Report>());
/// assert_eq!(container.load::<Report>().title, "daily");
/// ```
pub struct ResolverContext<'a> {
    container: &'a Container,
    state: &'a mut State,
    stack: &'a ConstructionStack,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(
        container: &'a Container,
        state: &'a mut State,
        stack: &'a ConstructionStack,
    ) -> Self {
        Self {
            container,
            state,
            stack,
        }
    }

    /// The container this context resolves against.
    pub fn container(&self) -> &Container {
        self.container
    }

    /// Resolves any dependency shape on behalf of the container itself.
    pub fn resolve<D: Dependency>(&mut self) -> DiResult<D> {
        D::resolve(self, TypeInfo::of::<Container>())
    }

    /// Resolves a concrete component, constructing it on first use.
    pub fn resolve_component<T: Component>(&mut self, requester: TypeInfo) -> DiResult<Arc<T>> {
        let info = TypeInfo::of::<T>();
        self.resolve_registered(info, requester)?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(info.name()))
    }

    /// Resolves an interface through its bound implementor, binding one
    /// on first use.
    pub fn resolve_interface<I>(&mut self, requester: TypeInfo) -> DiResult<Arc<I>>
    where
        I: ?Sized + Interface,
    {
        let interface = TypeInfo::of::<I>();
        let implementor = self.find_implementor::<I>(interface, requester)?;
        let instance = self.resolve_registered(implementor, requester)?;
        I::upcast(instance).map_err(|_| DiError::TypeMismatch(interface.name()))
    }

    /// Cache-only lookup of a concrete component.
    pub fn lookup_component<T: Component>(&self) -> Option<Arc<T>> {
        self.lookup_registered(TypeInfo::of::<T>())?
            .downcast::<T>()
            .ok()
    }

    /// Cache-only lookup through the current binding of an interface.
    pub fn lookup_interface<I: ?Sized + Interface>(&self) -> Option<Arc<I>> {
        let binding = self.state.registry.binding(TypeId::of::<I>())?;
        I::upcast(self.lookup_registered(binding.implementor)?).ok()
    }

    /// Runs the build pass unless it already ran.
    ///
    /// Returns the post-wiring hooks of ready instances still owed by this
    /// pass. The caller runs them once the container lock is released.
    pub(crate) fn ensure_built(&mut self) -> DiResult<Vec<ReadyHook>> {
        match &self.state.build {
            BuildState::Built => return Ok(Vec::new()),
            BuildState::Failed(error) => return Err(DiError::BuildFailed(error.to_string())),
            // Only reachable when a hook panicked mid-pass; hooks cannot
            // re-enter the container while it is building.
            BuildState::Building => {
                return Err(DiError::BuildFailed(
                    "build pass was interrupted by a panic".to_string(),
                ))
            }
            BuildState::Unbuilt => {}
        }

        self.state.build = BuildState::Building;
        match self.build_pass() {
            Ok(ready) => {
                self.state.build = BuildState::Built;
                Ok(ready)
            }
            Err(error) => {
                self.state.build = BuildState::Failed(error.clone());
                Err(error)
            }
        }
    }

    /// Constructs every pending component, fewest constructor parameters
    /// first, and collects the post-wiring hook of every ready instance.
    fn build_pass(&mut self) -> DiResult<Vec<ReadyHook>> {
        let span = tracing::debug_span!("build_pass");
        let _entered = span.enter();

        let mut pending: Vec<(usize, TypeInfo)> = self
            .state
            .registry
            .iter()
            .filter_map(|registration| {
                registration
                    .build_order()
                    .map(|order| (order, registration.info))
            })
            .collect();
        // Stable: equal orders keep registration order
        pending.sort_by_key(|(order, _)| *order);
        tracing::debug!(pending = pending.len(), "build pass started");

        let requester = TypeInfo::of::<Container>();
        let cached_before = self.state.cache.len();
        for (_, info) in pending {
            if self.state.cache.contains(info.id()) {
                tracing::trace!(component = %info, "already wired");
                continue;
            }
            self.resolve_registered(info, requester)?;
        }
        let constructed = self.state.cache.len() - cached_before;

        let ready: Vec<ReadyHook> = self
            .state
            .registry
            .iter()
            .filter_map(|registration| match &registration.recipe {
                Recipe::Instance { instance, init } => Some((Arc::clone(instance), *init)),
                _ => None,
            })
            .collect();

        tracing::info!(
            registered = self.state.registry.len(),
            constructed,
            instances = ready.len(),
            "build pass complete"
        );
        Ok(ready)
    }

    /// Picks the component that satisfies `I`.
    ///
    /// An existing binding wins unless its target is under construction. In
    /// that case the first registered implementor not under construction
    /// serves this request only; the binding itself stays.
    fn find_implementor<I>(&mut self, interface: TypeInfo, requester: TypeInfo) -> DiResult<TypeInfo>
    where
        I: ?Sized + Interface,
    {
        let stack = self.stack;

        if let Some(binding) = self.state.registry.binding(interface.id()) {
            if !stack.contains(binding.implementor) {
                return Ok(binding.implementor);
            }
            tracing::debug!(
                interface = %interface,
                implementor = %binding.implementor,
                pinned = binding.pinned,
                "bound implementor is under construction, looking for another"
            );
        }

        let candidate = self
            .state
            .registry
            .first_implementor::<I, _>(|info| !stack.contains(info));

        match candidate {
            Some(implementor) => {
                if self.state.registry.bind_if_unbound(interface, implementor) {
                    tracing::debug!(interface = %interface, implementor = %implementor, "interface bound");
                }
                Ok(implementor)
            }
            None => Err(DiError::MissingImplementor {
                interface: interface.name(),
                requester: requester.name(),
            }),
        }
    }

    /// Returns the cached instance of a registered type, constructing it
    /// first if needed.
    fn resolve_registered(&mut self, info: TypeInfo, requester: TypeInfo) -> DiResult<AnyArc> {
        if info.id() == TypeId::of::<Container>() {
            return Ok(self.container_handle());
        }

        if let Some(instance) = self.state.cache.get(info.id()) {
            tracing::trace!(component = %info, "cache hit");
            return Ok(instance);
        }

        let build = match self.state.registry.get(info.id()).map(|r| &r.recipe) {
            Some(Recipe::Build { build, .. }) => *build,
            Some(Recipe::Instance { instance, .. }) => return Ok(Arc::clone(instance)),
            Some(Recipe::SelfReference) => return Ok(self.container_handle()),
            None => {
                return Err(DiError::NotRegistered {
                    component: info.name(),
                    requester: requester.name(),
                })
            }
        };

        self.construct(info, build)
    }

    fn construct(&mut self, info: TypeInfo, build: BuildFn) -> DiResult<AnyArc> {
        let stack = self.stack;
        let _guard = stack.enter(info)?;

        let span = tracing::debug_span!("construct", component = info.name());
        let _entered = span.enter();

        let instance = build(self)?;
        self.state.cache.insert(info, Arc::clone(&instance))?;
        tracing::debug!(depth = stack.depth(), "component wired");
        Ok(instance)
    }

    fn lookup_registered(&self, info: TypeInfo) -> Option<AnyArc> {
        if info.id() == TypeId::of::<Container>() {
            return Some(self.container_handle());
        }
        self.state.cache.get(info.id())
    }

    fn container_handle(&self) -> AnyArc {
        Arc::new(self.container.clone())
    }
}
