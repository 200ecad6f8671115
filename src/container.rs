//! The wiring container: registration, the build pass, lookups and entry
//! points.

use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::ReentrantMutex;

use crate::config::ContainerConfig;
use crate::error::{fatal, DiError, DiResult};
use crate::executor::{panic_message, CompletionCounter, EntryPoint};
use crate::internal::ConstructionStack;
use crate::key::TypeInfo;
use crate::provider::{BuildState, Fields, ResolverContext, State};
use crate::registration::{Blueprint, Recipe};
use crate::traits::{Component, Dependencies, Interface, Resolvable, Runnable};

/// Runtime object-graph container.
///
/// Components are registered as blueprints (types to build, or ready
/// instances), the build pass wires every one of them exactly once, and
/// entry points (runnable objects or plain functions) receive their
/// dependencies from the finished graph. Every component is a process-wide
/// singleton shared through `Arc`.
///
/// `Container` is a cheap handle: clones share the same graph. It is also
/// registered in itself, so components and entry points can ask for a
/// `Container` parameter.
///
/// All methods that can fail come in two forms. The plain form (`load`,
/// `build`, `run`, `exec`, `register_as`, `wait`) logs the error and panics,
/// since a half-wired graph is not safe to keep using. The `try_*`/`get`
/// form returns the [`DiError`] instead.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{injectable, interface, Blueprint, Component, Container, Wired};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct English;
/// impl Component for English {}
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
/// injectable!(English {});
/// interface!(Greeter = [English]);
///
/// #[derive(Default)]
/// struct Front {
///     greeter: Wired<Arc<dyn Greeter>>,
/// }
/// impl Component for Front {}
/// injectable!(Front { greeter });
///
/// let container = Container::new();
/// container
///     .register(Blueprint::injected::<English>())
///     .register(Blueprint::injected::<Front>())
///     .build();
///
/// assert_eq!(container.load::<Front>().greeter.greet(), "hello");
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

struct Inner {
    shared: ReentrantMutex<Shared>,
    config: ContainerConfig,
    completion: Arc<CompletionCounter>,
}

struct Shared {
    state: RefCell<State>,
    constructing: ConstructionStack,
}

fn reentrant() -> DiError {
    tracing::warn!("container re-entered from a lifecycle hook while resolving");
    DiError::Reentrant
}

impl Container {
    /// Creates an empty container with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        let mut state = State::new();
        let (info, recipe) = Blueprint::self_reference::<Container>().into_parts();
        state.registry.insert(info, recipe);

        Container {
            inner: Arc::new(Inner {
                shared: ReentrantMutex::new(Shared {
                    state: RefCell::new(state),
                    constructing: ConstructionStack::new(config.max_depth),
                }),
                config,
                completion: Arc::new(CompletionCounter::new()),
            }),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> DiResult<R>) -> DiResult<R> {
        let shared = self.inner.shared.lock();
        let mut state = shared.state.try_borrow_mut().map_err(|_| reentrant())?;
        f(&mut *state)
    }

    fn with_context<R>(
        &self,
        f: impl FnOnce(&mut ResolverContext<'_>) -> DiResult<R>,
    ) -> DiResult<R> {
        let shared = self.inner.shared.lock();
        let mut state = shared.state.try_borrow_mut().map_err(|_| reentrant())?;
        let mut ctx = ResolverContext::new(self, &mut *state, &shared.constructing);
        f(&mut ctx)
    }

    fn inspect<R>(&self, f: impl FnOnce(&State) -> R) -> Option<R> {
        let shared = self.inner.shared.lock();
        let state = shared.state.try_borrow().ok()?;
        Some(f(&*state))
    }

    // Registration

    /// Registers a component to build, or a ready instance to share.
    ///
    /// Registering a type again replaces the earlier registration, as long
    /// as no instance of it has been wired yet.
    pub fn register(&self, blueprint: impl Into<Blueprint>) -> &Self {
        let blueprint = blueprint.into();
        let name = blueprint.type_info().name();
        self.try_register(blueprint)
            .unwrap_or_else(|e| fatal(&format!("Failed to register {}", name), e))
    }

    pub fn try_register(&self, blueprint: impl Into<Blueprint>) -> DiResult<&Self> {
        self.register_blueprint(blueprint.into(), None)?;
        Ok(self)
    }

    /// Registers every blueprint in order.
    pub fn register_all<I>(&self, blueprints: I) -> &Self
    where
        I: IntoIterator<Item = Blueprint>,
    {
        for blueprint in blueprints {
            self.register(blueprint);
        }
        self
    }

    /// Registers a component and binds interface `I` to it, overriding the
    /// structural implementor search for `I`.
    ///
    /// Panics when the component does not implement `I`.
    pub fn register_as<I>(&self, blueprint: impl Into<Blueprint>) -> &Self
    where
        I: ?Sized + Interface,
    {
        self.try_register_as::<I>(blueprint).unwrap_or_else(|e| {
            fatal(
                &format!("Failed to register implementor of {}", std::any::type_name::<I>()),
                e,
            )
        })
    }

    pub fn try_register_as<I>(&self, blueprint: impl Into<Blueprint>) -> DiResult<&Self>
    where
        I: ?Sized + Interface,
    {
        let blueprint = blueprint.into();
        let interface = TypeInfo::of::<I>();
        let component = blueprint.type_info();

        if !I::implemented_by(component.id()) {
            return Err(DiError::NotImplemented {
                interface: interface.name(),
                component: component.name(),
            });
        }

        self.register_blueprint(blueprint, Some(interface))?;
        Ok(self)
    }

    fn register_blueprint(&self, blueprint: Blueprint, interface: Option<TypeInfo>) -> DiResult<()> {
        let (info, recipe) = blueprint.into_parts();

        let late_init = self.with_state(|state| {
            if info.id() == TypeId::of::<Container>() {
                return Err(DiError::AlreadyInstantiated(info.name()));
            }

            if state.build.has_started() {
                if state.cache.contains(info.id()) {
                    return Err(DiError::AlreadyInstantiated(info.name()));
                }
            } else {
                state.cache.remove(info.id());
            }

            let late_init = match &recipe {
                Recipe::Instance { instance, init } => {
                    state.cache.insert(info, Arc::clone(instance))?;
                    matches!(state.build, BuildState::Built).then(|| (Arc::clone(instance), *init))
                }
                _ => None,
            };

            tracing::debug!(
                component = %info,
                instance = matches!(recipe, Recipe::Instance { .. }),
                "component registered"
            );
            state.registry.insert(info, recipe);

            if let Some(interface) = interface {
                state.registry.pin(interface, info);
                tracing::debug!(interface = %interface, implementor = %info, "interface bound");
            }

            Ok(late_init)
        })?;

        // The build pass already ran, so the post-wiring hook runs now,
        // outside the lock.
        if let Some((instance, init)) = late_init {
            init(&instance);
        }
        Ok(())
    }

    // Build pass

    /// Runs the build pass. Later calls are no-ops.
    ///
    /// Panics when any registered component cannot be wired.
    pub fn build(&self) -> &Self {
        if let Err(e) = self.try_build() {
            fatal("Failed to build container", e);
        }
        self
    }

    pub fn try_build(&self) -> DiResult<()> {
        self.ensure_built()
    }

    fn ensure_built(&self) -> DiResult<()> {
        let ready = self.with_context(|ctx| ctx.ensure_built())?;
        // Outside the lock, like a late registration, so the hooks may use
        // the container.
        for (instance, init) in &ready {
            init(instance);
        }
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.inspect(|state| matches!(state.build, BuildState::Built))
            .unwrap_or(false)
    }

    // Lookups

    /// Resolves `S`, running the build pass first if it has not run.
    ///
    /// `S` is a component type or a `dyn Trait` declared with
    /// [`interface!`](crate::interface). Components registered after the
    /// build pass are built here on first request; an interface without a
    /// binding is bound here.
    pub fn get<S>(&self) -> DiResult<Arc<S>>
    where
        S: ?Sized + Resolvable,
    {
        self.ensure_built()?;
        self.with_context(|ctx| S::resolve(ctx, TypeInfo::of::<Container>()))
    }

    /// Like [`get`](Self::get), panicking when `S` cannot be resolved.
    pub fn load<S>(&self) -> Arc<S>
    where
        S: ?Sized + Resolvable,
    {
        self.get::<S>().unwrap_or_else(|e| {
            fatal(&format!("Failed to load {}", std::any::type_name::<S>()), e)
        })
    }

    /// The already-wired instance of `S`, if any.
    ///
    /// Never builds, constructs or binds anything.
    pub fn try_load<S>(&self) -> Option<Arc<S>>
    where
        S: ?Sized + Resolvable,
    {
        self.with_context(|ctx| Ok(S::lookup(ctx))).ok().flatten()
    }

    // Introspection

    /// Registered types, in registration order. The container itself
    /// comes first.
    pub fn registered_types(&self) -> Vec<TypeInfo> {
        self.inspect(|state| state.registry.iter().map(|r| r.info).collect())
            .unwrap_or_default()
    }

    /// Component currently bound to interface `I`.
    pub fn binding_of<I>(&self) -> Option<TypeInfo>
    where
        I: ?Sized + Interface,
    {
        self.inspect(|state| state.registry.binding(TypeId::of::<I>()))
            .flatten()
            .map(|binding| binding.implementor)
    }

    // Entry points

    /// Wires the fields of `runnable`, then calls its `run` method.
    ///
    /// The runnable does not need to be registered.
    pub fn run<R>(&self, runnable: &mut R)
    where
        R: Runnable + 'static,
    {
        if let Err(e) = self.try_run(runnable) {
            fatal(&format!("Failed to run {}", std::any::type_name::<R>()), e);
        }
    }

    pub fn try_run<R>(&self, runnable: &mut R) -> DiResult<()>
    where
        R: Runnable + 'static,
    {
        self.ensure_built()?;
        self.with_context(|ctx| runnable.inject(&mut Fields::new(ctx, TypeInfo::of::<R>())))?;

        tracing::debug!(entry_point = std::any::type_name::<R>(), "running entry point");
        runnable.run();
        Ok(())
    }

    /// Resolves every parameter of `entry_point`, then calls it.
    pub fn exec<F, Args>(&self, entry_point: F)
    where
        F: EntryPoint<Args> + 'static,
        Args: Dependencies,
    {
        if let Err(e) = self.try_exec(entry_point) {
            fatal(&format!("Failed to execute {}", std::any::type_name::<F>()), e);
        }
    }

    pub fn try_exec<F, Args>(&self, entry_point: F) -> DiResult<()>
    where
        F: EntryPoint<Args> + 'static,
        Args: Dependencies,
    {
        self.ensure_built()?;
        let args = self.with_context(|ctx| Args::resolve_all(ctx, TypeInfo::of::<F>()))?;

        tracing::debug!(
            entry_point = std::any::type_name::<F>(),
            parameters = Args::COUNT,
            "executing entry point"
        );
        entry_point.call(args);
        Ok(())
    }

    /// [`run`](Self::run) on a background worker; see [`wait`](Self::wait).
    pub fn run_async<R>(&self, runnable: R)
    where
        R: Runnable + Send + 'static,
    {
        let container = self.clone();
        self.spawn_worker(move || {
            let mut runnable = runnable;
            container.try_run(&mut runnable)
        });
    }

    /// [`exec`](Self::exec) on a background worker; see [`wait`](Self::wait).
    pub fn exec_async<F, Args>(&self, entry_point: F)
    where
        F: EntryPoint<Args> + Send + 'static,
        Args: Dependencies + 'static,
    {
        let container = self.clone();
        self.spawn_worker(move || container.try_exec(entry_point));
    }

    fn spawn_worker<J>(&self, job: J)
    where
        J: FnOnce() -> DiResult<()> + Send + 'static,
    {
        let worker = self.inner.config.worker_name.clone();
        let ticket = self.inner.completion.issue(worker.clone());
        tracing::debug!(worker = %worker, pending = self.inner.completion.pending(), "worker scheduled");

        let spawned = thread::Builder::new().name(worker.clone()).spawn(move || {
            match panic::catch_unwind(AssertUnwindSafe(job)) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => ticket.fail(error.to_string()),
                Err(payload) => ticket.fail(panic_message(payload.as_ref())),
            }
        });

        if let Err(error) = spawned {
            self.inner.completion.record(DiError::WorkerFailed {
                worker,
                reason: error.to_string(),
            });
        }
    }

    /// Blocks until every background entry point has finished.
    ///
    /// Panics with the first worker failure, if any.
    pub fn wait(&self) {
        if let Err(e) = self.try_wait() {
            fatal("Background worker failed", e);
        }
    }

    /// Blocks until every background entry point has finished, returning the
    /// first failure recorded since the previous wait.
    pub fn try_wait(&self) -> DiResult<()> {
        self.inner.completion.wait()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Container {}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.inspect(|state| (state.registry.len(), state.cache.len(), state.build.clone()));
        let mut debug = f.debug_struct("Container");
        match summary {
            Some((registered, wired, build)) => debug
                .field("registered", &registered)
                .field("wired", &wired)
                .field("build", &build),
            None => debug.field("state", &"<resolving>"),
        };
        debug
            .field("pending_workers", &self.inner.completion.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Wired;
    use crate::{injectable, interface};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Counter {
        inits: AtomicUsize,
    }
    impl Component for Counter {
        fn init(&self) {
            self.inits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct Leaf;
    impl Component for Leaf {}
    injectable!(Leaf {});

    trait Named: Send + Sync {
        fn name(&self) -> &'static str;
    }
    impl Named for Leaf {
        fn name(&self) -> &'static str {
            "leaf"
        }
    }
    interface!(Named = [Leaf]);

    #[derive(Default)]
    struct Peeker {
        container: Wired<Container>,
        saw_reentry: AtomicBool,
    }
    impl Component for Peeker {
        fn init(&self) {
            let result = self.container.get::<Leaf>();
            self.saw_reentry
                .store(matches!(result, Err(DiError::Reentrant)), Ordering::SeqCst);
        }
    }
    injectable!(Peeker { container });

    /// Ready instance whose hook looks up another component.
    struct Announcer {
        container: Container,
        found_leaf: AtomicBool,
    }
    impl Component for Announcer {
        fn init(&self) {
            let found = self.container.get::<Leaf>().is_ok();
            self.found_leaf.store(found, Ordering::SeqCst);
        }
    }

    #[test]
    #[traced_test]
    fn test_build_pass_is_logged_once() {
        let container = Container::new();
        container.register(Blueprint::injected::<Leaf>());
        container.build().build();

        assert!(container.is_built());
        assert!(logs_contain("build pass complete"));
        assert!(logs_contain("component wired"));
    }

    #[test]
    fn test_ready_instance_init_runs_during_build() {
        let container = Container::new();
        let counter = Arc::new(Counter::default());
        container.register(Arc::clone(&counter));
        assert_eq!(counter.inits.load(Ordering::SeqCst), 0);

        container.build();
        container.build();
        assert_eq!(counter.inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_instance_init_runs_immediately() {
        let container = Container::new();
        container.build();

        let counter = Arc::new(Counter::default());
        container.register(Arc::clone(&counter));
        assert_eq!(counter.inits.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&container.load::<Counter>(), &counter));
    }

    #[test]
    fn test_instance_replaced_before_build_only() {
        let container = Container::new();
        let first = Arc::new(Counter::default());
        let second = Arc::new(Counter::default());
        container.register(Arc::clone(&first));
        container.register(Arc::clone(&second));
        assert!(Arc::ptr_eq(&container.load::<Counter>(), &second));

        let third = Arc::new(Counter::default());
        let result = container.try_register(third);
        assert!(matches!(result, Err(DiError::AlreadyInstantiated(_))));
    }

    #[test]
    fn test_container_cannot_be_replaced() {
        let container = Container::new();
        let other = Arc::new(Container::new());
        assert!(matches!(
            container.try_register(other),
            Err(DiError::AlreadyInstantiated(_))
        ));
    }

    #[test]
    fn test_hook_reentry_is_reported_not_deadlocked() {
        let container = Container::new();
        container
            .register(Blueprint::injected::<Leaf>())
            .register(Blueprint::injected::<Peeker>());

        let peeker = container.load::<Peeker>();
        assert!(peeker.saw_reentry.load(Ordering::SeqCst));
        // The lock is released again once resolution finished
        assert!(peeker.container.get::<Leaf>().is_ok());
    }

    #[test]
    fn test_ready_instance_init_can_use_container() {
        let container = Container::new();
        let announcer = Arc::new(Announcer {
            container: container.clone(),
            found_leaf: AtomicBool::new(false),
        });
        container
            .register(Arc::clone(&announcer))
            .register(Blueprint::injected::<Leaf>())
            .build();

        assert!(announcer.found_leaf.load(Ordering::SeqCst));
    }

    #[test]
    fn test_introspection() {
        let container = Container::new();
        container.register(Blueprint::injected::<Leaf>());

        let types = container.registered_types();
        assert_eq!(types, vec![TypeInfo::of::<Container>(), TypeInfo::of::<Leaf>()]);
        assert_eq!(container.binding_of::<dyn Named>(), None);

        assert_eq!(container.load::<dyn Named>().name(), "leaf");
        assert_eq!(container.binding_of::<dyn Named>(), Some(TypeInfo::of::<Leaf>()));
    }

    #[test]
    fn test_debug_summary() {
        let container = Container::new();
        let rendered = format!("{:?}", container);
        assert!(rendered.contains("registered: 1"));
        assert!(rendered.contains("Unbuilt"));
    }
}
