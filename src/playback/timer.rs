use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Identifies one arming of a [`OneShotTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

struct Pending {
    token: TimerToken,
    task: JoinHandle<()>,
}

/// A single-slot timer: arming always cancels whatever was armed before
///
/// The callback runs on the tokio runtime after the delay and receives the
/// token of the arming that scheduled it. Owners keep the timer behind the
/// same lock as the state it guards and call [`OneShotTimer::claim`] from
/// the callback; a claim only succeeds for the current arming, so a task
/// that lost the race with `cancel` or a re-arm does nothing.
pub struct OneShotTimer {
    runtime: Handle,
    generation: u64,
    pending: Option<Pending>,
}

impl OneShotTimer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            generation: 0,
            pending: None,
        }
    }

    /// Schedule `on_fire` after `delay`, cancelling any earlier arming
    pub fn arm<F>(&mut self, delay: Duration, on_fire: F) -> TimerToken
    where
        F: FnOnce(TimerToken) + Send + 'static,
    {
        self.cancel();

        self.generation += 1;
        let token = TimerToken(self.generation);
        let deadline = Instant::now() + delay;

        let task = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            on_fire(token);
        });

        self.pending = Some(Pending { token, task });
        token
    }

    /// Cancel the pending arming; returns whether one was pending
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.task.abort();
                true
            }
            None => false,
        }
    }

    /// Disarm if `token` is the current arming
    ///
    /// Returns false for stale tokens, leaving the timer untouched.
    pub fn claim(&mut self, token: TimerToken) -> bool {
        match &self.pending {
            Some(pending) if pending.token == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once_after_delay() {
        let fired = Arc::new(AtomicU32::new(0));
        let mut timer = OneShotTimer::new(Handle::current());

        let f = fired.clone();
        timer.arm(Duration::from_secs(5), move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.is_armed());

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_cancels_previous() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut timer = OneShotTimer::new(Handle::current());

        let f = fired.clone();
        timer.arm(Duration::from_secs(2), move |_| f.lock().unwrap().push("first"));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let f = fired.clone();
        timer.arm(Duration::from_secs(2), move |_| f.lock().unwrap().push("second"));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(*fired.lock().unwrap(), vec!["second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_claim() {
        let fired = Arc::new(AtomicU32::new(0));
        let mut timer = OneShotTimer::new(Handle::current());
        assert!(!timer.cancel());

        let f = fired.clone();
        let stale = timer.arm(Duration::from_secs(1), move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.cancel());
        assert!(!timer.is_armed());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let current = timer.arm(Duration::from_secs(1), |_| {});
        assert!(!timer.claim(stale));
        assert!(timer.is_armed());
        assert!(timer.claim(current));
        assert!(!timer.is_armed());
        assert!(!timer.claim(current));
    }
}
