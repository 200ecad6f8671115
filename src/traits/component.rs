//! Lifecycle contracts for wired components.

use crate::error::DiResult;
use crate::provider::Fields;
use crate::traits::Dependencies;

/// A type the container can hold as a process-wide singleton.
///
/// `init` is the post-wiring hook. For components the container builds, it
/// runs right after wiring, while the container is still resolving, so a
/// call back into the container gets [`DiError::Reentrant`](crate::DiError::Reentrant). For ready
/// instances handed to the container, it runs once when the build pass
/// completes (or on registration, after it) with the container free to use.
/// The default does nothing.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Blueprint, Component, Container};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Cache {
///     warm: AtomicBool,
/// }
///
/// impl Component for Cache {
///     fn init(&self) {
///         self.warm.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let container = Container::new();
/// container.register(Arc::new(Cache::default()));
/// container.build();
/// assert!(container.load::<Cache>().warm.load(Ordering::SeqCst));
/// ```
pub trait Component: Send + Sync + 'static {
    /// Post-wiring hook.
    fn init(&self) {}
}

/// Wiring hook: the component receives its resolved dependencies as a tuple.
///
/// The container starts from `Default::default()`, resolves every element of
/// `Deps` in order and hands them to `construct`. Components with fewer
/// constructor parameters are built first during the build pass.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{interface, Blueprint, Component, Constructible, Container, Wired};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// #[derive(Default)]
/// struct FixedClock;
/// impl Component for FixedClock {}
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 { 42 }
/// }
/// interface!(Clock = [FixedClock]);
///
/// #[derive(Default)]
/// struct Scheduler {
///     clock: Wired<Arc<dyn Clock>>,
/// }
/// impl Component for Scheduler {}
/// impl Constructible for Scheduler {
///     type Deps = (Arc<dyn Clock>,);
///     fn construct(&mut self, (clock,): Self::Deps) {
///         self.clock.set(clock);
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register(Blueprint::injected::<FixedClock>())
///     .register(Blueprint::constructed::<Scheduler>());
/// assert_eq!(container.load::<Scheduler>().clock.now(), 42);
/// # ferrous_wire::injectable!(FixedClock {});
/// ```
pub trait Constructible {
    /// Dependencies handed to `construct`, in parameter order.
    type Deps: Dependencies;

    fn construct(&mut self, deps: Self::Deps);
}

/// Field wiring: every injectable field is resolved and assigned in
/// declaration order.
///
/// Usually implemented with [`injectable!`](crate::injectable).
pub trait Injectable {
    fn inject(&mut self, fields: &mut Fields<'_, '_>) -> DiResult<()>;
}

/// An entry point object: its fields are wired, then `run` is invoked.
pub trait Runnable: Injectable {
    fn run(&mut self);
}

/// Implements [`Injectable`] by wiring the listed `Wired<_>` fields in order.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{injectable, Component, Wired};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Config;
/// impl Component for Config {}
/// injectable!(Config {});
///
/// #[derive(Default)]
/// struct Server {
///     config: Wired<Arc<Config>>,
/// }
/// impl Component for Server {}
/// injectable!(Server { config });
/// ```
#[macro_export]
macro_rules! injectable {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::Injectable for $ty {
            #[allow(unused_variables)]
            fn inject(&mut self, fields: &mut $crate::Fields<'_, '_>) -> $crate::DiResult<()> {
                $(
                    fields.wire(stringify!($field), &mut self.$field)?;
                )*
                Ok(())
            }
        }
    };
}
