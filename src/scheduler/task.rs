//! Repeating per-domain timer.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{Domain, SchedulerEvent};

/// A live timer posting `SchedulerEvent::Tick` for one domain.
///
/// Dropping the task cancels its timer.
pub struct RefreshTask {
    pub domain: Domain,
    pub period: Duration,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Arm a repeating timer whose first tick fires one period from now.
    pub fn arm(
        domain: Domain,
        period: Duration,
        events: UnboundedSender<SchedulerEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            // A stalled loop gets one tick, not a burst of catch-up ticks
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(SchedulerEvent::Tick(domain)).is_err() {
                    break;
                }
            }
        });

        Self {
            domain,
            period,
            handle,
        }
    }

    /// Cancel the timer
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the timer task is still running
    pub fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_one_period_after_arming() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = RefreshTask::arm(Domain::Gpu, Duration::from_secs(5), tx);
        assert!(task.is_live());

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(matches!(rx.try_recv(), Ok(SchedulerEvent::Tick(Domain::Gpu))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = RefreshTask::arm(Domain::Models, Duration::from_secs(1), tx);
        task.cancel();
        // Let the runtime reap the aborted task
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert!(!task.is_live());
        assert!(rx.try_recv().is_err());
    }
}
