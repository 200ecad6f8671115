/// Example: Wiring a small user directory
///
/// A user service built through its wiring hook on top of a ready-made
/// in-memory store, driven by a runnable app and an injectable seeding
/// function, both synchronously and on a background worker.
///
/// Run with `RUST_LOG=ferrous_wire=debug cargo run --example users` to watch
/// the container wire the graph.

use ferrous_wire::{
    injectable, interface, Blueprint, Component, Constructible, Container, ContainerConfig,
    Runnable, Wired,
};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

// ===== Store =====

pub trait UserStore: Send + Sync {
    fn get_all(&self) -> Vec<String>;
    fn save(&self, user: &str);
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<String>>,
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

// ===== Service =====

pub trait UserService: Send + Sync {
    fn list_all(&self) -> Vec<String>;
    fn create(&self, user: &str);
}

#[derive(Default)]
pub struct ConcreteUserService {
    store: Wired<Arc<dyn UserStore>>,
}

impl Component for ConcreteUserService {
    fn init(&self) {
        println!("Init ConcreteUserService");
    }
}

impl Constructible for ConcreteUserService {
    type Deps = (Arc<dyn UserStore>,);

    fn construct(&mut self, (store,): Self::Deps) {
        println!("Constructing ConcreteUserService");
        self.store.set(store);
    }
}

impl UserService for ConcreteUserService {
    fn list_all(&self) -> Vec<String> {
        self.store.get_all()
    }

    fn create(&self, user: &str) {
        self.store.save(user);
    }
}

interface!(UserStore = [InMemoryUserStore]);
interface!(UserService = [ConcreteUserService]);

// ===== Entry Points =====

/// Runnable app: its fields are wired, then `run` is called
#[derive(Default)]
pub struct App {
    users: Wired<Arc<dyn UserService>>,
}

injectable!(App { users });

impl Runnable for App {
    fn run(&mut self) {
        println!("Users: {:?}", self.users.list_all());
    }
}

/// Any function works as an entry point; its parameters are injected
fn seed_users(users: Arc<dyn UserService>, container: Container) {
    users.create("Bob");
    users.create("Carl");
    println!("Container: {:?}", container);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let container = Container::with_config(ContainerConfig::from_env());

    // Types to build, wired during the build pass
    container.register(Blueprint::constructed::<ConcreteUserService>());

    // A ready instance: shared as-is, never built
    let store = InMemoryUserStore::default();
    store.save("Alice");
    container.register(Arc::new(store));

    container.exec(seed_users);

    container.run(&mut App::default()); // Users: ["Alice", "Bob", "Carl"]

    // Background variants; wait blocks until every worker finished
    container.exec_async(seed_users);
    container.run_async(App::default());
    container.wait();

    println!("Final: {:?}", container.load::<dyn UserStore>().get_all());
}
