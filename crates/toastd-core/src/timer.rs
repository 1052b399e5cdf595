//! Cancelable single-shot timer on top of the tokio timer wheel.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Single-shot delay that can be armed, re-armed and cleared.
///
/// [`Timer::start`] arms the timer without any callback, which is enough for
/// "has this window elapsed yet" checks. [`Timer::start_with`] additionally
/// runs a future once the delay elapses. Arming an already running timer
/// clears the previous arm first.
///
/// Once the delay has elapsed the callback is never aborted, even if the
/// timer is cleared or dropped from inside that callback.
#[derive(Debug)]
pub struct Timer {
    delay: Duration,
    deadline: Option<Instant>,
    elapsed: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            elapsed: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the timer without a callback.
    pub fn start(&mut self) {
        self.clear();
        self.elapsed = Arc::new(AtomicBool::new(false));
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Arm the timer and run `on_elapsed` when it fires.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_with<Fut>(&mut self, on_elapsed: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.clear();
        let deadline = Instant::now() + self.delay;
        let elapsed = Arc::new(AtomicBool::new(false));
        self.deadline = Some(deadline);
        self.elapsed = elapsed.clone();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            elapsed.store(true, Ordering::SeqCst);
            on_elapsed.await;
        }));
    }

    /// Cancel the timer. No-op when it is not armed.
    pub fn clear(&mut self) {
        self.deadline = None;
        if let Some(task) = self.task.take()
            && !self.elapsed.load(Ordering::SeqCst)
        {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        match self.deadline {
            Some(deadline) => !self.elapsed.load(Ordering::SeqCst) && Instant::now() < deadline,
            None => false,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.clear();
    }
}
