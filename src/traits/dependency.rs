//! Requestable dependency shapes.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::{Key, TypeInfo};
use crate::provider::ResolverContext;
use crate::traits::Component;
use crate::Container;

/// A type that can be handed out behind an `Arc`: every [`Component`], plus
/// every `dyn Trait` declared with [`interface!`](crate::interface).
pub trait Resolvable: Send + Sync + 'static {
    /// Shape of this type when requested directly.
    fn key() -> Key;

    /// Finds or builds the instance, recursing into its own dependencies.
    fn resolve(ctx: &mut ResolverContext<'_>, requester: TypeInfo) -> DiResult<Arc<Self>>;

    /// Cache-only lookup; never constructs or binds anything.
    fn lookup(ctx: &ResolverContext<'_>) -> Option<Arc<Self>>;
}

impl<T: Component> Resolvable for T {
    fn key() -> Key {
        Key::Concrete(TypeInfo::of::<T>())
    }

    fn resolve(ctx: &mut ResolverContext<'_>, requester: TypeInfo) -> DiResult<Arc<Self>> {
        ctx.resolve_component::<T>(requester)
    }

    fn lookup(ctx: &ResolverContext<'_>) -> Option<Arc<Self>> {
        ctx.lookup_component::<T>()
    }
}

/// A single injectable parameter or field.
///
/// Implemented for:
/// - `Arc<T>` / `Arc<dyn Trait>`: the shared singleton
/// - [`Value<T>`]: a clone of the singleton
/// - `Option<D>`: `None` when `D` itself is not registered or has no
///   implementor; failures while wiring `D` still propagate
/// - [`Container`]: a handle to the resolving container
pub trait Dependency: Sized {
    fn key() -> Key;

    fn resolve(ctx: &mut ResolverContext<'_>, requester: TypeInfo) -> DiResult<Self>;
}

impl<S: ?Sized + Resolvable> Dependency for Arc<S> {
    fn key() -> Key {
        S::key().as_pointer()
    }

    fn resolve(ctx: &mut ResolverContext<'_>, requester: TypeInfo) -> DiResult<Self> {
        S::resolve(ctx, requester)
    }
}

impl<D: Dependency> Dependency for Option<D> {
    fn key() -> Key {
        D::key()
    }

    fn resolve(ctx: &mut ResolverContext<'_>, requester: TypeInfo) -> DiResult<Self> {
        match D::resolve(ctx, requester) {
            Ok(dependency) => Ok(Some(dependency)),
            // Only a miss of `D` itself; a broken graph below `D` stays fatal
            Err(error) if error.missing_type() == Some(D::key().display_name()) => {
                tracing::trace!(dependency = %D::key(), %requester, "optional dependency absent");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

impl Dependency for Container {
    fn key() -> Key {
        Key::Concrete(TypeInfo::of::<Container>())
    }

    fn resolve(ctx: &mut ResolverContext<'_>, _requester: TypeInfo) -> DiResult<Self> {
        Ok(ctx.container().clone())
    }
}

/// Value form of a concrete dependency: a clone of the wired singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value<T>(pub T);

impl<T> Value<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Value<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Component + Clone> Dependency for Value<T> {
    fn key() -> Key {
        Key::Concrete(TypeInfo::of::<T>())
    }

    fn resolve(ctx: &mut ResolverContext<'_>, requester: TypeInfo) -> DiResult<Self> {
        let shared = ctx.resolve_component::<T>(requester)?;
        Ok(Value(T::clone(&shared)))
    }
}

/// Slot for a dependency that is filled during wiring.
///
/// Starts empty (the zero value), is filled once by the wiring hook or by
/// field wiring, then dereferences to the dependency.
pub struct Wired<D>(Option<D>);

impl<D> Wired<D> {
    pub fn set(&mut self, dependency: D) {
        self.0 = Some(dependency);
    }

    /// The dependency, or `None` while unwired.
    pub fn as_option(&self) -> Option<&D> {
        self.0.as_ref()
    }

    pub fn is_wired(&self) -> bool {
        self.0.is_some()
    }
}

impl<D> Default for Wired<D> {
    fn default() -> Self {
        Wired(None)
    }
}

impl<D> From<D> for Wired<D> {
    fn from(dependency: D) -> Self {
        Wired(Some(dependency))
    }
}

impl<D> Deref for Wired<D> {
    type Target = D;

    #[track_caller]
    fn deref(&self) -> &D {
        match &self.0 {
            Some(dependency) => dependency,
            None => panic!(
                "{} used before it was wired",
                std::any::type_name::<D>()
            ),
        }
    }
}

impl<D: Clone> Clone for Wired<D> {
    fn clone(&self) -> Self {
        Wired(self.0.clone())
    }
}

impl<D> fmt::Debug for Wired<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "Wired({})", std::any::type_name::<D>()),
            None => write!(f, "Wired(<unwired {}>)", std::any::type_name::<D>()),
        }
    }
}

/// An ordered list of dependencies: the parameter list of a wiring hook or of
/// an entry-point function.
pub trait Dependencies: Sized {
    /// Number of parameters; orders the build pass.
    const COUNT: usize;

    fn resolve_all(ctx: &mut ResolverContext<'_>, requester: TypeInfo) -> DiResult<Self>;
}

macro_rules! impl_dependencies {
    () => {
        impl_dependencies!(@impl 0;);
    };
    ($first:ident $(, $rest:ident)*) => {
        impl_dependencies!(@impl impl_dependencies!(@count $first $($rest)*); $first $(, $rest)*);
        impl_dependencies!($($rest),*);
    };
    (@count) => { 0 };
    (@count $head:ident $($tail:ident)*) => { 1 + impl_dependencies!(@count $($tail)*) };
    (@impl $count:expr; $($type_name:ident),*) => {
        impl<$($type_name: Dependency),*> Dependencies for ($($type_name,)*) {
            const COUNT: usize = $count;

            #[allow(unused_variables)]
            fn resolve_all(ctx: &mut ResolverContext<'_>, requester: TypeInfo) -> DiResult<Self> {
                Ok(($(
                    {
                        tracing::trace!(dependency = %$type_name::key(), %requester, "resolving parameter");
                        $type_name::resolve(ctx, requester)?
                    },
                )*))
            }
        }
    };
}

impl_dependencies!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
