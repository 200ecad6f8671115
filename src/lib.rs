//! # ferrous-wire
//!
//! Runtime object-graph wiring for Rust: register components, let the
//! container build them once, and hand their dependencies to entry points.
//!
//! ## Features
//!
//! - **Process-wide singletons**: every component is built at most once and shared through `Arc`
//! - **Two wiring styles**: a typed wiring hook ([`Constructible`]) or field wiring ([`Injectable`])
//! - **Interface binding**: `Arc<dyn Trait>` dependencies bind to the first registered implementor, or to an explicit one
//! - **Cycle safety**: a type under construction never satisfies its own interface requirement, true cycles are reported with their path
//! - **Entry points**: runnable objects and plain functions, synchronous or on background workers
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_wire::{injectable, interface, Blueprint, Component, Constructible, Container, Wired};
//! use std::sync::{Arc, Mutex};
//!
//! trait UserStore: Send + Sync {
//!     fn all(&self) -> Vec<String>;
//!     fn save(&self, user: &str);
//! }
//!
//! #[derive(Default)]
//! struct MemStore {
//!     users: Mutex<Vec<String>>,
//! }
//! impl Component for MemStore {}
//! impl UserStore for MemStore {
//!     fn all(&self) -> Vec<String> { self.users.lock().unwrap().clone() }
//!     fn save(&self, user: &str) { self.users.lock().unwrap().push(user.to_string()) }
//! }
//! interface!(UserStore = [MemStore]);
//!
//! #[derive(Default)]
//! struct Users {
//!     store: Wired<Arc<dyn UserStore>>,
//! }
//! impl Component for Users {}
//! impl Constructible for Users {
//!     type Deps = (Arc<dyn UserStore>,);
//!     fn construct(&mut self, (store,): Self::Deps) {
//!         self.store.set(store);
//!     }
//! }
//!
//! let container = Container::new();
//! container
//!     .register(Arc::new(MemStore::default()))
//!     .register(Blueprint::constructed::<Users>());
//!
//! container.exec(|users: Arc<Users>| users.store.save("Bob"));
//! assert_eq!(container.load::<dyn UserStore>().all(), vec!["Bob"]);
//! ```
//!
//! ## Field Wiring
//!
//! Types without a wiring hook list their injectable fields with
//! [`injectable!`]. Each field is a [`Wired`] slot that starts empty and is
//! filled in declaration order:
//!
//! ```rust
//! use ferrous_wire::{injectable, Blueprint, Component, Container, Wired};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Settings;
//! impl Component for Settings {}
//! injectable!(Settings {});
//!
//! #[derive(Default)]
//! struct Server {
//!     settings: Wired<Arc<Settings>>,
//!     audit: Wired<Option<Arc<Audit>>>,
//! }
//! impl Component for Server {}
//! injectable!(Server { settings, audit });
//!
//! struct Audit;
//! impl Component for Audit {}
//!
//! let container = Container::new();
//! container
//!     .register(Blueprint::injected::<Settings>())
//!     .register(Blueprint::injected::<Server>());
//!
//! let server = container.load::<Server>();
//! assert!(server.audit.is_none()); // optional and never registered
//! ```
//!
//! ## Entry Points
//!
//! ```rust
//! use ferrous_wire::{injectable, Component, Container, Runnable, Wired};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Clock;
//! impl Component for Clock {}
//!
//! #[derive(Default)]
//! struct Job {
//!     clock: Wired<Arc<Clock>>,
//! }
//! injectable!(Job { clock });
//! impl Runnable for Job {
//!     fn run(&mut self) {
//!         assert!(self.clock.is_wired());
//!     }
//! }
//!
//! let container = Container::new();
//! container.register(Arc::new(Clock));
//! container.run(&mut Job::default());
//!
//! container.run_async(Job::default());
//! container.wait();
//! ```
//!
//! ## Logging
//!
//! The crate logs through `tracing` and never installs a subscriber.
//! Construction, binding and the build pass log at `debug`, cache hits and
//! field wiring at `trace`, and every fatal error at `error` right before the
//! panic.

pub mod config;
pub mod container;
pub mod error;
pub mod executor;
pub mod key;
pub mod provider;
pub mod registration;
pub mod traits;

mod cache;
mod internal;

pub use config::ContainerConfig;
pub use container::Container;
pub use error::{DiError, DiResult};
pub use executor::EntryPoint;
pub use key::{Key, TypeInfo};
pub use provider::{Fields, ResolverContext};
pub use registration::{AnyArc, Blueprint};
pub use traits::{
    Component, Constructible, Dependencies, Dependency, Injectable, Interface, Resolvable, Runnable, Value,
    Wired,
};
