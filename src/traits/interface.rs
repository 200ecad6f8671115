//! Interface declarations.

use std::any::TypeId;
use std::sync::Arc;

use crate::registration::AnyArc;
use crate::traits::Resolvable;

/// A `dyn Trait` the container can bind to a registered component.
///
/// Rust has no runtime "does type X implement trait Y" query, so each
/// interface carries an explicit table of the concrete types that implement
/// it. The [`interface!`](crate::interface) macro writes that table; the
/// registry scans it when looking for an implementor.
pub trait Interface: Resolvable {
    /// Whether the concrete type `type_id` implements this interface.
    fn implemented_by(type_id: TypeId) -> bool;

    /// Views a type-erased instance through this interface, handing the
    /// instance back when its type is not one of the implementors.
    fn upcast(instance: AnyArc) -> Result<Arc<Self>, AnyArc>;
}

/// Declares a trait as an interface and lists the types implementing it.
///
/// The trait needs `Send + Sync` supertraits. Attributes such as `#[cfg]`
/// are allowed on each implementor.
///
/// # Example
///
/// ```rust
/// use ferrous_wire::{injectable, interface, Blueprint, Component, Container};
///
/// trait Store: Send + Sync {
///     fn name(&self) -> &'static str;
/// }
///
/// #[derive(Default)]
/// struct MemStore;
/// impl Component for MemStore {}
/// impl Store for MemStore {
///     fn name(&self) -> &'static str { "mem" }
/// }
/// injectable!(MemStore {});
///
/// interface!(Store = [MemStore]);
///
/// let container = Container::new();
/// container.register(Blueprint::injected::<MemStore>());
/// assert_eq!(container.load::<dyn Store>().name(), "mem");
/// ```
#[macro_export]
macro_rules! interface {
    ($trait:ident = [$($(#[$attr:meta])* $impl:ty),* $(,)?]) => {
        impl $crate::Interface for dyn $trait {
            fn implemented_by(type_id: ::std::any::TypeId) -> bool {
                $(
                    $(#[$attr])*
                    {
                        if type_id == ::std::any::TypeId::of::<$impl>() {
                            return true;
                        }
                    }
                )*
                let _ = type_id;
                false
            }

            fn upcast(
                instance: $crate::AnyArc,
            ) -> ::std::result::Result<::std::sync::Arc<Self>, $crate::AnyArc> {
                $(
                    $(#[$attr])*
                    let instance = match instance.downcast::<$impl>() {
                        Ok(concrete) => return Ok(concrete as ::std::sync::Arc<Self>),
                        Err(instance) => instance,
                    };
                )*
                Err(instance)
            }
        }

        impl $crate::Resolvable for dyn $trait {
            fn key() -> $crate::Key {
                $crate::Key::Interface($crate::TypeInfo::of::<Self>())
            }

            fn resolve(
                ctx: &mut $crate::ResolverContext<'_>,
                requester: $crate::TypeInfo,
            ) -> $crate::DiResult<::std::sync::Arc<Self>> {
                ctx.resolve_interface::<Self>(requester)
            }

            fn lookup(ctx: &$crate::ResolverContext<'_>) -> ::std::option::Option<::std::sync::Arc<Self>> {
                ctx.lookup_interface::<Self>()
            }
        }
    };
}
