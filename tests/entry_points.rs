/// Entry point tests
///
/// Runnable objects and injectable functions, run against the user store
/// graph: a service built through its wiring hook on top of a ready store.

use ferrous_wire::{
    injectable, interface, Blueprint, Component, Constructible, Container, DiError, Runnable,
    Value, Wired,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

trait UserStore: Send + Sync {
    fn get_all(&self) -> Vec<String>;
    fn save(&self, user: &str);
}

#[derive(Default)]
struct InMemoryUserStore {
    users: Mutex<Vec<String>>,
}

impl InMemoryUserStore {
    fn with_users(users: &[&str]) -> Self {
        Self {
            users: Mutex::new(users.iter().map(|u| u.to_string()).collect()),
        }
    }
}

impl Component for InMemoryUserStore {}

impl UserStore for InMemoryUserStore {
    fn get_all(&self) -> Vec<String> {
        self.users.lock().unwrap().clone()
    }
    fn save(&self, user: &str) {
        self.users.lock().unwrap().push(user.to_string());
    }
}

trait UserService: Send + Sync {
    fn list_all(&self) -> Vec<String>;
    fn create(&self, user: &str);
}

#[derive(Default)]
struct ConcreteUserService {
    store: Wired<Arc<dyn UserStore>>,
    inits: AtomicUsize,
}

impl Component for ConcreteUserService {
    fn init(&self) {
        self.inits.fetch_add(1, Ordering::SeqCst);
    }
}

impl Constructible for ConcreteUserService {
    type Deps = (Arc<dyn UserStore>,);

    fn construct(&mut self, (store,): Self::Deps) {
        self.store.set(store);
    }
}

impl UserService for ConcreteUserService {
    fn list_all(&self) -> Vec<String> {
        self.store.get_all()
    }
    fn create(&self, user: &str) {
        self.store.save(user)
    }
}

interface!(UserStore = [InMemoryUserStore]);
interface!(UserService = [ConcreteUserService]);

#[derive(Default)]
struct App {
    service: Wired<Arc<dyn UserService>>,
    seen: Vec<String>,
}

injectable!(App { service });

impl Runnable for App {
    fn run(&mut self) {
        self.seen = self.service.list_all();
    }
}

fn seed_users(service: Arc<dyn UserService>, _container: Container) {
    service.create("Bob");
    service.create("Carl");
}

fn user_graph() -> Container {
    let container = Container::new();
    container
        .register(Blueprint::constructed::<ConcreteUserService>())
        .register(Arc::new(InMemoryUserStore::with_users(&["Alice"])));
    container
}

#[test]
fn test_exec_then_run() {
    let container = user_graph();

    container.exec(seed_users);
    assert!(container.is_built());

    let mut app = App::default();
    container.run(&mut app);
    assert_eq!(app.seen, vec!["Alice", "Bob", "Carl"]);
}

#[test]
fn test_build_happens_once_across_entry_points() {
    let container = user_graph();
    container.exec(|_: Arc<dyn UserService>| {});
    container.exec(|_: Arc<dyn UserService>| {});
    container.run(&mut App::default());

    let service = container.load::<ConcreteUserService>();
    assert_eq!(service.inits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_exec_closure_with_mixed_parameters() {
    #[derive(Clone, Default)]
    struct Greeting(String);
    impl Component for Greeting {}

    struct Unregistered;
    impl Component for Unregistered {}

    let container = user_graph();
    container.register(Arc::new(Greeting("hi".to_string())));

    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    container.exec(
        move |greeting: Value<Greeting>,
              store: Arc<dyn UserStore>,
              missing: Option<Arc<Unregistered>>,
              container: Container| {
            let mut sink = sink.lock().unwrap();
            sink.push(greeting.into_inner().0);
            sink.extend(store.get_all());
            sink.push(missing.is_none().to_string());
            sink.push(container.is_built().to_string());
        },
    );

    assert_eq!(
        *observed.lock().unwrap(),
        vec!["hi", "Alice", "true", "true"]
    );
}

#[test]
fn test_optional_parameter_does_not_hide_broken_wiring() {
    struct Absent;
    impl Component for Absent {}

    #[derive(Default)]
    struct Repo {
        absent: Wired<Arc<Absent>>,
    }
    impl Component for Repo {}
    injectable!(Repo { absent });

    let container = Container::new();
    container.build();
    container.register(Blueprint::injected::<Repo>());

    // Repo is registered, so its own broken dependency is fatal
    let result = container.try_exec(|_: Option<Arc<Repo>>| {
        panic!("must not be called");
    });

    match result {
        Err(DiError::NotRegistered {
            component,
            requester,
        }) => {
            assert!(component.ends_with("Absent"));
            assert!(requester.ends_with("Repo"));
        }
        other => panic!("expected NotRegistered, got {:?}", other),
    }
}

#[test]
fn test_exec_is_not_idempotent() {
    let container = Container::new();
    let store = Arc::new(InMemoryUserStore::with_users(&["Bob"]));
    container
        .register(Arc::clone(&store))
        .register(Blueprint::constructed::<ConcreteUserService>());

    let add_carl = |service: Arc<dyn UserService>| service.create("Carl");
    container.exec(add_carl);
    container.exec(add_carl);

    assert_eq!(store.get_all(), vec!["Bob", "Carl", "Carl"]);

    let service = container.load::<ConcreteUserService>();
    assert_eq!(
        Arc::as_ptr(&*service.store) as *const (),
        Arc::as_ptr(&store) as *const ()
    );
}

#[test]
fn test_exec_without_parameters() {
    let container = Container::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    container.exec(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(container.is_built());
}

#[test]
fn test_try_exec_reports_missing_parameter() {
    let container = Container::new();
    let result = container.try_exec(|_: Arc<dyn UserService>| {
        panic!("must not be called");
    });

    match result {
        Err(DiError::MissingImplementor { interface, .. }) => {
            assert!(interface.contains("UserService"));
        }
        other => panic!("expected MissingImplementor, got {:?}", other),
    }
}

#[test]
#[should_panic(expected = "Failed to run")]
fn test_run_panics_on_missing_field() {
    let container = Container::new();
    container.run(&mut App::default());
}

#[test]
fn test_runnable_need_not_be_registered() {
    let container = user_graph();
    let mut app = App::default();
    container.try_run(&mut app).unwrap();

    assert_eq!(app.seen, vec!["Alice"]);
    assert!(container.try_load::<ConcreteUserService>().is_some());
    let names: Vec<_> = container
        .registered_types()
        .iter()
        .map(|info| info.name())
        .collect();
    assert!(!names.iter().any(|name| name.ends_with("::App")));
}
