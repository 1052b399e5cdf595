//! Awaited listener fan-out.
//!
//! A [`Signal`] holds a list of [`Listener`]s. Emitting runs every matching
//! listener one after another in registration order and resolves only once
//! all of them have finished, so the emitter can rely on side effects
//! (persistence writes, client dispatch) having completed, and a listener
//! can rely on every earlier listener having finished with the event.
//! Failures do not stop later listeners; they are logged and handed back to
//! the emitter.
//!
//! ```text
//!   emit(event)
//!       │
//!       ▼
//!   Listener 1 ──▶ Listener 2 ──▶ Listener 3 ──▶ failures
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Listener failed with a message.
    #[error("Listener execution failed: {0}")]
    Execution(String),

    /// Listener failed due to a database error.
    #[error("Database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Listener failed to reach a client or the host environment.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Listener panicked.
    #[error("Listener panicked: {0}")]
    Panicked(String),

    /// Generic error with source.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HookError {
    /// Create an execution error from a string.
    pub fn execution(msg: impl Into<String>) -> Self {
        HookError::Execution(msg.into())
    }

    /// Wrap a persistence failure.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        HookError::Database(Box::new(err))
    }

    /// Create a transport error from a string.
    pub fn transport(msg: impl Into<String>) -> Self {
        HookError::Transport(msg.into())
    }
}

/// Asynchronous handler attached to a [`Signal`].
#[async_trait]
pub trait Listener<E>: Send + Sync {
    /// Unique name for this listener (for logging).
    fn name(&self) -> &str;

    /// Handle an emitted event.
    async fn handle(&self, event: &E) -> Result<(), HookError>;

    /// Check if this listener should handle the given event.
    ///
    /// Default implementation returns true for all events.
    fn matches(&self, _event: &E) -> bool {
        true
    }
}

/// Failure reported by a single listener during [`Signal::emit`].
#[derive(Debug)]
pub struct ListenerFailure {
    pub listener: String,
    pub error: HookError,
}

/// Registry of listeners with await-all emission.
pub struct Signal<E> {
    listeners: RwLock<Vec<Arc<dyn Listener<E>>>>,
}

impl<E> Signal<E>
where
    E: Send + Sync,
{
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener.
    pub async fn connect(&self, listener: Arc<dyn Listener<E>>) {
        let name = listener.name().to_string();
        self.listeners.write().await.push(listener);
        debug!(listener = %name, "Registered listener");
    }

    /// Remove every listener registered under `name`.
    pub async fn disconnect(&self, name: &str) -> usize {
        let mut listeners = self.listeners.write().await;
        let before = listeners.len();
        listeners.retain(|l| l.name() != name);
        before - listeners.len()
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }

    /// Run every matching listener in registration order.
    ///
    /// The listener list is snapshotted first, so listeners may emit on the
    /// same signal (directly or through a nested dispatch) without
    /// deadlocking.
    pub async fn emit(&self, event: &E) -> Vec<ListenerFailure> {
        let listeners: Vec<Arc<dyn Listener<E>>> = {
            let guard = self.listeners.read().await;
            guard.iter().filter(|l| l.matches(event)).cloned().collect()
        };

        if listeners.is_empty() {
            return Vec::new();
        }

        let mut failures = Vec::new();
        for listener in &listeners {
            let name = listener.name().to_string();
            let result = AssertUnwindSafe(listener.handle(event)).catch_unwind().await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(listener = %name, error = %e, "Listener failed");
                    failures.push(ListenerFailure {
                        listener: name,
                        error: e,
                    });
                }
                Err(panic) => {
                    let panic_msg = if let Some(s) = panic.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    error!(listener = %name, panic = %panic_msg, "Listener panicked!");
                    failures.push(ListenerFailure {
                        listener: name,
                        error: HookError::Panicked(panic_msg),
                    });
                }
            }
        }
        failures
    }
}

impl<E> Default for Signal<E>
where
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counter {
        name: &'static str,
        count: AtomicUsize,
    }

    #[async_trait]
    impl Listener<u32> for Counter {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, event: &u32) -> Result<(), HookError> {
            self.count.fetch_add(*event as usize, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Listener<u32> for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn handle(&self, _event: &u32) -> Result<(), HookError> {
            Err(HookError::execution("boom"))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Listener<u32> for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn handle(&self, _event: &u32) -> Result<(), HookError> {
            panic!("listener exploded");
        }
    }

    struct Slow {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Listener<u32> for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn handle(&self, _event: &u32) -> Result<(), HookError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.log.lock().unwrap().push("slow done");
            Ok(())
        }
    }

    struct Marker {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Listener<u32> for Marker {
        fn name(&self) -> &str {
            "marker"
        }

        async fn handle(&self, _event: &u32) -> Result<(), HookError> {
            self.log.lock().unwrap().push("marker ran");
            Ok(())
        }
    }

    struct OddOnly;

    #[async_trait]
    impl Listener<u32> for OddOnly {
        fn name(&self) -> &str {
            "odd-only"
        }

        async fn handle(&self, _event: &u32) -> Result<(), HookError> {
            Err(HookError::execution("should not run for even events"))
        }

        fn matches(&self, event: &u32) -> bool {
            event % 2 == 1
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_all_listeners() {
        let signal = Signal::new();
        let a = Arc::new(Counter {
            name: "a",
            count: AtomicUsize::new(0),
        });
        let b = Arc::new(Counter {
            name: "b",
            count: AtomicUsize::new(0),
        });
        signal.connect(a.clone()).await;
        signal.connect(b.clone()).await;

        let failures = signal.emit(&3).await;
        assert!(failures.is_empty());
        assert_eq!(a.count.load(Ordering::SeqCst), 3);
        assert_eq!(b.count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failures_are_collected() {
        let signal = Signal::new();
        let counter = Arc::new(Counter {
            name: "counter",
            count: AtomicUsize::new(0),
        });
        signal.connect(Arc::new(Failing)).await;
        signal.connect(Arc::new(Panicking)).await;
        signal.connect(counter.clone()).await;

        let failures = signal.emit(&1).await;
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].listener, "failing");
        assert!(matches!(failures[1].error, HookError::Panicked(_)));
        assert_eq!(counter.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emit_waits_for_slow_listener() {
        let signal = Signal::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        signal.connect(Arc::new(Slow { log: log.clone() })).await;

        signal.emit(&1).await;
        log.lock().unwrap().push("emit returned");

        assert_eq!(*log.lock().unwrap(), vec!["slow done", "emit returned"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listeners_run_in_registration_order() {
        let signal = Signal::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        signal.connect(Arc::new(Slow { log: log.clone() })).await;
        signal.connect(Arc::new(Marker { log: log.clone() })).await;

        signal.emit(&1).await;

        assert_eq!(*log.lock().unwrap(), vec!["slow done", "marker ran"]);
    }

    #[tokio::test]
    async fn test_matches_filters_listeners() {
        let signal = Signal::new();
        signal.connect(Arc::new(OddOnly)).await;

        assert!(signal.emit(&2).await.is_empty());
        assert_eq!(signal.emit(&3).await.len(), 1);
    }

    #[test]
    fn test_emit_without_listeners() {
        let signal: Signal<u32> = Signal::default();
        let failures = tokio_test::block_on(signal.emit(&7));
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect() {
        let signal: Signal<u32> = Signal::new();
        signal.connect(Arc::new(Failing)).await;
        assert_eq!(signal.listener_count().await, 1);
        assert_eq!(signal.disconnect("failing").await, 1);
        assert!(signal.emit(&1).await.is_empty());
    }
}
