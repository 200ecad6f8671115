//! Component registrations, blueprints and interface bindings.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::TypeInfo;
use crate::provider::{Fields, ResolverContext};
use crate::traits::{Component, Constructible, Dependencies, Injectable, Interface};

#[cfg(feature = "ahash")]
pub(crate) type Map<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

/// Type-erased shared instance, as stored in the instance cache.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type BuildFn = fn(&mut ResolverContext<'_>) -> DiResult<AnyArc>;
pub(crate) type InitFn = fn(&AnyArc);

/// How a registered component comes into existence
pub(crate) enum Recipe {
    /// Built from its zero value by the resolver
    Build {
        /// Wiring hook parameter count; `None` for field wiring
        arity: Option<usize>,
        build: BuildFn,
    },
    /// Handed over ready-made; only the post-wiring hook applies
    Instance { instance: AnyArc, init: InitFn },
    /// The container itself
    SelfReference,
}

/// Description of a component to register: either a type the container will
/// build, or a ready instance it will share as-is.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{injectable, Blueprint, Component, Container};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Settings { verbose: bool }
/// impl Component for Settings {}
/// injectable!(Settings {});
///
/// let built = Blueprint::injected::<Settings>();
/// assert_eq!(built.constructor_arity(), None);
///
/// let ready: Blueprint = Arc::new(Settings { verbose: true }).into();
/// assert!(ready.is_instance());
/// ```
pub struct Blueprint {
    info: TypeInfo,
    recipe: Recipe,
}

impl Blueprint {
    /// A component built through its wiring hook.
    pub fn constructed<T>() -> Self
    where
        T: Component + Constructible + Default,
    {
        Blueprint {
            info: TypeInfo::of::<T>(),
            recipe: Recipe::Build {
                arity: Some(T::Deps::COUNT),
                build: build_constructed::<T>,
            },
        }
    }

    /// A component built by wiring its fields.
    pub fn injected<T>() -> Self
    where
        T: Component + Injectable + Default,
    {
        Blueprint {
            info: TypeInfo::of::<T>(),
            recipe: Recipe::Build {
                arity: None,
                build: build_injected::<T>,
            },
        }
    }

    /// A ready instance, shared with every requester and never rebuilt.
    pub fn instance<T: Component>(instance: Arc<T>) -> Self {
        Blueprint {
            info: TypeInfo::of::<T>(),
            recipe: Recipe::Instance {
                instance,
                init: init_instance::<T>,
            },
        }
    }

    pub(crate) fn self_reference<T: 'static>() -> Self {
        Blueprint {
            info: TypeInfo::of::<T>(),
            recipe: Recipe::SelfReference,
        }
    }

    pub fn type_info(&self) -> TypeInfo {
        self.info
    }

    pub fn is_instance(&self) -> bool {
        matches!(self.recipe, Recipe::Instance { .. })
    }

    /// Wiring hook parameter count, `None` for field-wired components and
    /// ready instances.
    pub fn constructor_arity(&self) -> Option<usize> {
        match self.recipe {
            Recipe::Build { arity, .. } => arity,
            _ => None,
        }
    }

    pub(crate) fn into_parts(self) -> (TypeInfo, Recipe) {
        (self.info, self.recipe)
    }
}

impl<T: Component> From<Arc<T>> for Blueprint {
    fn from(instance: Arc<T>) -> Self {
        Blueprint::instance(instance)
    }
}

fn build_constructed<T>(ctx: &mut ResolverContext<'_>) -> DiResult<AnyArc>
where
    T: Component + Constructible + Default,
{
    let requester = TypeInfo::of::<T>();
    let mut component = T::default();
    let deps = T::Deps::resolve_all(ctx, requester)?;
    component.construct(deps);
    component.init();
    Ok(Arc::new(component))
}

fn build_injected<T>(ctx: &mut ResolverContext<'_>) -> DiResult<AnyArc>
where
    T: Component + Injectable + Default,
{
    let mut component = T::default();
    component.inject(&mut Fields::new(ctx, TypeInfo::of::<T>()))?;
    component.init();
    Ok(Arc::new(component))
}

fn init_instance<T: Component>(instance: &AnyArc) {
    if let Some(component) = (**instance).downcast_ref::<T>() {
        component.init();
    }
}

/// A registered component type
pub(crate) struct Registration {
    pub(crate) info: TypeInfo,
    pub(crate) recipe: Recipe,
}

impl Registration {
    /// Sort key for the build pass: field-wired first, then by parameter count.
    pub(crate) fn build_order(&self) -> Option<usize> {
        match self.recipe {
            Recipe::Build { arity: None, .. } => Some(0),
            Recipe::Build { arity: Some(n), .. } => Some(n + 1),
            _ => None,
        }
    }
}

/// Binding of an interface to the component chosen to satisfy it
#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding {
    pub(crate) implementor: TypeInfo,
    /// Set by `register_as`, as opposed to the first successful match
    pub(crate) pinned: bool,
}

/// Every registered component type, in registration order, plus the
/// interface bindings.
pub(crate) struct Registry {
    entries: Vec<Registration>,
    index: Map<TypeId, usize>,
    bindings: Map<TypeId, Binding>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: Map::default(),
            bindings: Map::default(),
        }
    }

    /// Records a registration; re-registering a type replaces it in place.
    pub(crate) fn insert(&mut self, info: TypeInfo, recipe: Recipe) {
        let registration = Registration { info, recipe };
        match self.index.get(&info.id()) {
            Some(&pos) => self.entries[pos] = registration,
            None => {
                self.index.insert(info.id(), self.entries.len());
                self.entries.push(registration);
            }
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: TypeId) -> Option<&Registration> {
        self.index.get(&id).map(|&pos| &self.entries[pos])
    }

    /// Registrations in registration order
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// First registered type, in registration order, that implements `I`
    /// and passes `available`.
    pub(crate) fn first_implementor<I, F>(&self, available: F) -> Option<TypeInfo>
    where
        I: ?Sized + Interface,
        F: Fn(TypeInfo) -> bool,
    {
        self.entries
            .iter()
            .map(|registration| registration.info)
            .find(|info| I::implemented_by(info.id()) && available(*info))
    }

    pub(crate) fn binding(&self, interface: TypeId) -> Option<Binding> {
        self.bindings.get(&interface).copied()
    }

    /// Pins `interface` to `implementor`, replacing any earlier binding.
    pub(crate) fn pin(&mut self, interface: TypeInfo, implementor: TypeInfo) {
        self.bindings.insert(
            interface.id(),
            Binding {
                implementor,
                pinned: true,
            },
        );
    }

    /// Binds `interface` on first match only; an existing binding is kept.
    pub(crate) fn bind_if_unbound(&mut self, interface: TypeInfo, implementor: TypeInfo) -> bool {
        if self.bindings.contains_key(&interface.id()) {
            return false;
        }
        self.bindings.insert(
            interface.id(),
            Binding {
                implementor,
                pinned: false,
            },
        );
        true
    }
}
