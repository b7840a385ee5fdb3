//! Trailing-edge debouncing of side effects.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A scheduled callback that has not fired yet.
#[derive(Debug)]
struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs a callback once a quiet period has elapsed.
///
/// Each [`schedule`](Self::schedule) cancels the previously scheduled
/// callback, so only the last callback of a burst runs. Dropping the
/// debouncer cancels whatever is pending.
///
/// A zero delay runs callbacks immediately. Outside a tokio runtime there is
/// nothing to defer onto, so callbacks also run immediately.
///
/// # Example
///
/// ```ignore
/// let mut debouncer = Debouncer::new(Duration::from_millis(300));
/// debouncer.schedule(|| println!("j"));
/// debouncer.schedule(|| println!("jo"));   // cancels "j"
/// debouncer.schedule(|| println!("john")); // only this one prints
/// ```
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<ScheduledTask>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `f`, replacing any callback that has not fired yet.
    pub fn schedule<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        if self.delay.is_zero() {
            f();
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            log::warn!("[debounce] no async runtime, running callback immediately");
            f();
            return;
        };

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let delay = self.delay;
        let handle = runtime.spawn(async move {
            let fire = tokio::select! {
                _ = token.cancelled() => false,
                _ = tokio::time::sleep(delay) => true,
            };
            if fire {
                f();
            }
        });

        self.pending = Some(ScheduledTask { cancel, handle });
    }

    /// Cancels the pending callback. Returns `true` if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(task) => {
                let waiting = !task.handle.is_finished();
                task.cancel.cancel();
                waiting
            }
            None => false,
        }
    }

    /// Returns `true` if a callback is scheduled and has not fired.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if self.cancel() {
            log::debug!("[debounce] cancelled pending callback on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce() + Send>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |label: &'static str| {
            let sink = sink.clone();
            Box::new(move || sink.lock().unwrap().push(label)) as Box<dyn FnOnce() + Send>
        };
        (log, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_callback_fires() {
        let (log, make) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for label in ["j", "jo", "joh", "john"] {
            debouncer.schedule(make(label));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(log.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(*log.lock().unwrap(), vec!["john"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending() {
        let (log, make) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.schedule(make("late"));
        assert!(debouncer.is_pending());
        drop(debouncer);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reports_waiting_callback() {
        let (_log, make) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        assert!(!debouncer.cancel());

        debouncer.schedule(make("x"));
        assert!(debouncer.cancel());
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_zero_delay_runs_inline() {
        let (log, make) = recorder();
        let mut debouncer = Debouncer::new(Duration::ZERO);
        debouncer.schedule(make("now"));
        assert_eq!(*log.lock().unwrap(), vec!["now"]);
    }

    #[test]
    fn test_without_runtime_runs_inline() {
        let (log, make) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.schedule(make("now"));
        assert_eq!(*log.lock().unwrap(), vec!["now"]);
    }
}
