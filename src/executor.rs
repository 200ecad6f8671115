//! Entry-point execution support: injectable functions and the completion
//! counter behind background workers.

use std::any::Any;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::{DiError, DiResult};
use crate::traits::{Dependencies, Dependency};

/// A function whose parameters the container resolves before calling it.
///
/// Implemented for every `FnOnce` taking up to twelve [`Dependency`]
/// parameters. The return value, if any, must be `()`.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{Component, Container, Value};
///
/// #[derive(Default, Clone)]
/// struct Greeting(String);
/// impl Component for Greeting {}
///
/// let container = Container::new();
/// container.register(std::sync::Arc::new(Greeting("hello".into())));
/// container.exec(|greeting: Value<Greeting>, _c: Container| {
///     assert_eq!(greeting.0.0, "hello");
/// });
/// ```
pub trait EntryPoint<Args: Dependencies> {
    fn call(self, args: Args);
}

macro_rules! impl_entry_point {
    ($($arg:ident),*) => {
        impl<Func, $($arg: Dependency),*> EntryPoint<($($arg,)*)> for Func
        where
            Func: FnOnce($($arg),*),
        {
            #[allow(non_snake_case)]
            fn call(self, ($($arg,)*): ($($arg,)*)) {
                self($($arg),*)
            }
        }
    };
}

macro_rules! impl_entry_points {
    () => {
        impl_entry_point!();
    };
    ($first:ident $(, $rest:ident)*) => {
        impl_entry_point!($first $(, $rest)*);
        impl_entry_points!($($rest),*);
    };
}

impl_entry_points!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);

#[derive(Default)]
struct Outstanding {
    pending: usize,
    failures: Vec<DiError>,
}

/// Counts background entry points that have not finished yet.
#[derive(Default)]
pub(crate) struct CompletionCounter {
    outstanding: Mutex<Outstanding>,
    idle: Condvar,
}

impl CompletionCounter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers one unit of outstanding work.
    pub(crate) fn issue(self: &Arc<Self>, worker: impl Into<String>) -> Ticket {
        self.outstanding.lock().pending += 1;
        Ticket {
            counter: Arc::clone(self),
            worker: worker.into(),
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.outstanding.lock().pending
    }

    /// Blocks until no work is outstanding, then hands back the first
    /// failure recorded since the previous wait.
    pub(crate) fn wait(&self) -> DiResult<()> {
        let mut outstanding = self.outstanding.lock();
        while outstanding.pending > 0 {
            self.idle.wait(&mut outstanding);
        }

        let mut failures = std::mem::take(&mut outstanding.failures);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.swap_remove(0))
        }
    }

    pub(crate) fn record(&self, failure: DiError) {
        self.outstanding.lock().failures.push(failure);
    }

    fn complete(&self) {
        let mut outstanding = self.outstanding.lock();
        outstanding.pending = outstanding.pending.saturating_sub(1);
        if outstanding.pending == 0 {
            self.idle.notify_all();
        }
    }
}

/// One unit of outstanding work; completes when dropped.
pub(crate) struct Ticket {
    counter: Arc<CompletionCounter>,
    worker: String,
}

impl Ticket {
    pub(crate) fn worker(&self) -> &str {
        &self.worker
    }

    /// Records why this worker failed.
    pub(crate) fn fail(&self, reason: impl Into<String>) {
        let failure = DiError::WorkerFailed {
            worker: self.worker().to_string(),
            reason: reason.into(),
        };
        tracing::error!(error = %failure, "background entry point failed");
        self.counter.record(failure);
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.fail("worker panicked");
        }
        self.counter.complete();
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wait_returns_immediately_when_idle() {
        let counter = Arc::new(CompletionCounter::new());
        assert!(counter.wait().is_ok());
        assert_eq!(counter.pending(), 0);
    }

    #[test]
    fn test_wait_blocks_until_every_ticket_drops() {
        let counter = Arc::new(CompletionCounter::new());
        let tickets: Vec<_> = (0..4).map(|i| counter.issue(format!("w{i}"))).collect();
        assert_eq!(counter.pending(), 4);

        let handles: Vec<_> = tickets
            .into_iter()
            .map(|ticket| {
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(10));
                    drop(ticket);
                })
            })
            .collect();

        counter.wait().unwrap();
        assert_eq!(counter.pending(), 0);
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_failures_are_reported_once() {
        let counter = Arc::new(CompletionCounter::new());
        {
            let ticket = counter.issue("seeder");
            assert_eq!(ticket.worker(), "seeder");
            ticket.fail("store unavailable");
        }

        match counter.wait() {
            Err(DiError::WorkerFailed { worker, reason }) => {
                assert_eq!(worker, "seeder");
                assert_eq!(reason, "store unavailable");
            }
            other => panic!("expected worker failure, got {other:?}"),
        }
        assert!(counter.wait().is_ok());
    }

    #[test]
    fn test_panicking_worker_is_recorded() {
        let counter = Arc::new(CompletionCounter::new());
        let ticket = counter.issue("crasher");
        let handle = thread::spawn(move || {
            let _ticket = ticket;
            panic!("boom");
        });
        assert!(handle.join().is_err());

        assert!(matches!(counter.wait(), Err(DiError::WorkerFailed { .. })));
    }

    struct First(u8);
    impl crate::Component for First {}
    struct Second(u8);
    impl crate::Component for Second {}

    #[test]
    fn test_entry_point_passes_arguments_in_order() {
        let mut seen = Vec::new();
        EntryPoint::call(
            |a: Option<Arc<First>>, b: Option<Arc<Second>>| {
                seen.extend(a.map(|first| first.0));
                seen.extend(b.map(|second| second.0));
            },
            (Some(Arc::new(First(1))), Some(Arc::new(Second(2)))),
        );
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_panic_message_extracts_text() {
        let payload: Box<dyn Any + Send> = Box::new("static text");
        assert_eq!(panic_message(payload.as_ref()), "static text");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "worker panicked");
    }
}
