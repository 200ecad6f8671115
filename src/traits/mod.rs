//! Core traits for wiring components.

mod component;
mod dependency;
mod interface;

pub use component::{Component, Constructible, Injectable, Runnable};
pub use dependency::{Dependencies, Dependency, Resolvable, Value, Wired};
pub use interface::Interface;
