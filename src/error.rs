//! Error types for the wiring container.

use thiserror::Error;

/// Wiring errors
///
/// Every failure the container can report while registering components,
/// running the build pass, resolving dependencies or executing entry points.
/// The panicking entry points (`load`, `build`, `run`, `exec`, ...) treat any
/// of these as fatal; their `try_*` twins hand the value back instead.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::DiError;
///
/// let missing = DiError::NotRegistered {
///     component: "app::MemStore",
///     requester: "app::Service",
/// };
/// assert!(missing.is_missing());
///
/// let circular = DiError::Circular(vec!["A", "B", "A"]);
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// A concrete component was required but never registered
    #[error("Component not registered: {component} (concrete), required by {requester}")]
    NotRegistered {
        component: &'static str,
        requester: &'static str,
    },
    /// No registered, non-cyclic component satisfies the interface
    #[error("No implementor of {interface} available, required by {requester}")]
    MissingImplementor {
        interface: &'static str,
        requester: &'static str,
    },
    /// Registration bound a component to an interface it does not implement
    #[error("{component} does not implement {interface}")]
    NotImplemented {
        interface: &'static str,
        component: &'static str,
    },
    /// A component re-entered its own construction (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum construction depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Cached instance could not be viewed as the requested type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// A ready instance was registered for a type that already has one
    #[error("Instance of {0} already wired, cannot replace it")]
    AlreadyInstantiated(&'static str),
    /// A lifecycle hook called back into the container mid-resolution
    #[error("Container re-entered from a lifecycle hook while resolving")]
    Reentrant,
    /// A previous build pass failed; the graph is never rebuilt
    #[error("Build pass previously failed: {0}")]
    BuildFailed(String),
    /// A background entry point failed or panicked
    #[error("Worker {worker} failed: {reason}")]
    WorkerFailed { worker: String, reason: String },
}

impl DiError {
    /// Returns true for the two "nothing can satisfy this" errors.
    ///
    pub fn is_missing(&self) -> bool {
        self.missing_type().is_some()
    }

    /// The type nothing could satisfy, for the two "missing" errors.
    ///
    /// This names the innermost miss: a component whose own dependency is
    /// unregistered reports that dependency, not itself.
    pub fn missing_type(&self) -> Option<&'static str> {
        match self {
            DiError::NotRegistered { component, .. } => Some(*component),
            DiError::MissingImplementor { interface, .. } => Some(*interface),
            _ => None,
        }
    }
}

/// Result type for wiring operations
pub type DiResult<T> = Result<T, DiError>;

/// Logs a fatal wiring error and aborts the current thread of control.
#[track_caller]
pub(crate) fn fatal(context: &str, error: DiError) -> ! {
    tracing::error!(%error, "{}", context);
    panic!("{}: {}", context, error)
}
