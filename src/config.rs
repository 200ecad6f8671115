//! Container configuration.
//!
//! Settings come from code (builder-style setters), from the process
//! environment, or, with the `config` feature, from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::Deserialize;

use crate::internal::MAX_DEPTH;

/// Environment variable overriding [`ContainerConfig::max_depth`]
pub const ENV_MAX_DEPTH: &str = "WIRE_MAX_DEPTH";
/// Environment variable overriding [`ContainerConfig::worker_name`]
pub const ENV_WORKER_NAME: &str = "WIRE_WORKER_NAME";

const DEFAULT_WORKER_NAME: &str = "wire-worker";

/// Tunables for a [`Container`](crate::Container).
///
/// # Examples
///
/// ```
/// use ferrous_wire::{Container, ContainerConfig};
///
/// let config = ContainerConfig::default()
///     .max_depth(64)
///     .worker_name("seeder");
/// assert_eq!(config.max_depth, 64);
///
/// let container = Container::with_config(config);
/// assert_eq!(container.config().worker_name, "seeder");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Deepest construction chain allowed before resolution fails
    pub max_depth: usize,
    /// Thread name given to background entry points
    pub worker_name: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }
}

impl ContainerConfig {
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn worker_name(mut self, worker_name: impl Into<String>) -> Self {
        self.worker_name = worker_name.into();
        self
    }

    /// Defaults overridden by `WIRE_MAX_DEPTH` and `WIRE_WORKER_NAME`.
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = env::var(ENV_MAX_DEPTH) {
            match value.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => tracing::warn!(variable = ENV_MAX_DEPTH, %value, "ignoring invalid max depth"),
            }
        }

        if let Ok(name) = env::var(ENV_WORKER_NAME) {
            if !name.trim().is_empty() {
                config.worker_name = name;
            }
        }

        config
    }

    /// Parses a JSON object; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
