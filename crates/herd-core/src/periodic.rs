//! Repeating actions on the tokio runtime.
//!
//! One task per action: invocations of the same action are strictly
//! sequential (an overrun delays the next tick, it never overlaps it),
//! while distinct actions run independently of each other. An invocation
//! that fails is logged and the schedule keeps going; nothing an action
//! does can kill the loop.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;

/// A named repeating action. Aborted on drop.
pub struct PeriodicTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Start invoking `action` every `period`, first invocation
    /// immediately.
    pub fn spawn<A, F>(name: &'static str, period: Duration, mut action: A) -> Self
    where
        A: FnMut() -> F + Send + 'static,
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(error) = action().await {
                    tracing::warn!(task = name, %error, "periodic action failed");
                }
            }
        });
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop the schedule. Also happens on drop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_period() {
        let fired = Arc::new(AtomicU32::new(0));
        let task = {
            let fired = Arc::clone(&fired);
            PeriodicTask::spawn("count", Duration::from_millis(100), move || {
                let fired = Arc::clone(&fired);
                async move {
                    fired.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        };

        // First tick at t=0, then one per period.
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn same_action_never_overlaps_itself() {
        let running = Arc::new(AtomicU32::new(0));
        let overlapped = Arc::new(AtomicU32::new(0));
        let _task = {
            let running = Arc::clone(&running);
            let overlapped = Arc::clone(&overlapped);
            PeriodicTask::spawn("slow", Duration::from_millis(50), move || {
                let running = Arc::clone(&running);
                let overlapped = Arc::clone(&overlapped);
                async move {
                    if running.fetch_add(1, Ordering::SeqCst) > 0 {
                        overlapped.fetch_add(1, Ordering::SeqCst);
                    }
                    // Deliberately overrun the interval.
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(overlapped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn a_failing_invocation_does_not_stop_the_schedule() {
        let fired = Arc::new(AtomicU32::new(0));
        let task = {
            let fired = Arc::clone(&fired);
            PeriodicTask::spawn("flaky", Duration::from_millis(100), move || {
                let fired = Arc::clone(&fired);
                async move {
                    fired.fetch_add(1, Ordering::SeqCst);
                    Err(crate::error::Error::Config {
                        reason: "synthetic".to_owned(),
                    })
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(fired.load(Ordering::SeqCst) >= 3);
        assert_eq!(task.name(), "flaky");
    }
}
