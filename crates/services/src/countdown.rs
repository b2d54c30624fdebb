//! One-tick-per-second countdown running on the tokio timer.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;
const EXPIRED: u8 = 3;

/// A cancellable countdown.
///
/// `on_tick` receives the remaining seconds, starting with the full duration
/// and ending with `0`; `on_expire` fires once right after the `0` tick.
/// After `cancel` neither callback runs again. Dropping a countdown cancels it.
pub struct Countdown {
    status: Arc<AtomicU8>,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Start counting down `duration_secs` seconds.
    ///
    /// A zero or negative duration ticks `0` and expires before returning.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime with a positive duration.
    pub fn start<T, E>(duration_secs: i64, on_tick: T, on_expire: E) -> Self
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        Self::start_with_period(duration_secs, TICK_PERIOD, on_tick, on_expire)
    }

    /// Same as `start` with a custom tick period.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero or no tokio runtime is available.
    pub fn start_with_period<T, E>(
        duration_secs: i64,
        period: Duration,
        mut on_tick: T,
        on_expire: E,
    ) -> Self
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        if duration_secs <= 0 {
            on_tick(0);
            on_expire();
            return Self {
                status: Arc::new(AtomicU8::new(EXPIRED)),
                task: None,
            };
        }

        let total = u32::try_from(duration_secs).unwrap_or(u32::MAX);
        let status = Arc::new(AtomicU8::new(RUNNING));
        let shared = Arc::clone(&status);

        let task = tokio::spawn(async move {
            // The first tick completes immediately, so `total` is reported at t=0.
            let mut interval = tokio::time::interval(period);
            let mut remaining = total;
            loop {
                interval.tick().await;
                if shared.load(Ordering::Acquire) != RUNNING {
                    return;
                }
                on_tick(remaining);
                if remaining == 0 {
                    break;
                }
                remaining -= 1;
            }

            if shared
                .compare_exchange(RUNNING, EXPIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                on_expire();
            }
        });

        Self {
            status,
            task: Some(task),
        }
    }

    /// Stop the countdown. Returns `true` if this call stopped a running timer;
    /// cancelling an idle, cancelled or expired countdown is a no-op.
    pub fn cancel(&mut self) -> bool {
        let stopped = self
            .status
            .compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        stopped
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status.load(Ordering::Acquire) == RUNNING
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.status.load(Ordering::Acquire) == EXPIRED
    }
}

impl Default for Countdown {
    /// A countdown that was never started.
    fn default() -> Self {
        Self {
            status: Arc::new(AtomicU8::new(IDLE)),
            task: None,
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status.load(Ordering::Acquire) {
            IDLE => "idle",
            RUNNING => "running",
            CANCELLED => "cancelled",
            _ => "expired",
        };
        f.debug_struct("Countdown").field("status", &status).finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    struct Probe {
        ticks: Arc<Mutex<Vec<u32>>>,
        expired: Arc<AtomicUsize>,
    }

    impl Probe {
        fn new() -> Self {
            Self {
                ticks: Arc::new(Mutex::new(Vec::new())),
                expired: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn start(&self, duration_secs: i64) -> Countdown {
            let ticks = Arc::clone(&self.ticks);
            let expired = Arc::clone(&self.expired);
            Countdown::start(
                duration_secs,
                move |remaining| ticks.lock().unwrap().push(remaining),
                move || {
                    expired.fetch_add(1, Ordering::SeqCst);
                },
            )
        }

        fn ticks(&self) -> Vec<u32> {
            self.ticks.lock().unwrap().clone()
        }

        fn expired(&self) -> usize {
            self.expired.load(Ordering::SeqCst)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_down_to_zero_then_expires_once() {
        let probe = Probe::new();
        let timer = probe.start(3);
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(probe.ticks(), vec![3, 2, 1, 0]);
        assert_eq!(probe.expired(), 1);
        assert!(timer.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_lands_after_full_duration() {
        let probe = Probe::new();
        let _timer = probe.start(5);

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(probe.expired(), 0);
        assert_eq!(probe.ticks().last(), Some(&1));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(probe.expired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_expires() {
        let probe = Probe::new();
        let mut timer = probe.start(5);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(probe.ticks(), vec![5, 4, 3]);

        assert!(timer.cancel());
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(probe.ticks(), vec![5, 4, 3]);
        assert_eq!(probe.expired(), 0);
        assert!(!timer.is_running());
        assert!(!timer.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let probe = Probe::new();
        let mut timer = probe.start(2);
        assert!(timer.cancel());
        assert!(!timer.cancel());

        let mut never_started = Countdown::default();
        assert!(!never_started.cancel());
        assert!(!never_started.is_running());

        let mut finished = probe.start(1);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(finished.is_expired());
        assert!(!finished.cancel());
        assert_eq!(probe.expired(), 1);
    }

    #[tokio::test]
    async fn non_positive_duration_expires_immediately() {
        for duration in [0, -30] {
            let probe = Probe::new();
            let timer = probe.start(duration);
            assert_eq!(probe.ticks(), vec![0]);
            assert_eq!(probe.expired(), 1);
            assert!(timer.is_expired());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn independent_timers_do_not_interfere() {
        let first = Probe::new();
        let second = Probe::new();
        let mut a = first.start(4);
        let _b = second.start(2);

        tokio::time::sleep(Duration::from_millis(500)).await;
        a.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(first.ticks(), vec![4]);
        assert_eq!(first.expired(), 0);
        assert_eq!(second.ticks(), vec![2, 1, 0]);
        assert_eq!(second.expired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels() {
        let probe = Probe::new();
        drop(probe.start(2));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(probe.expired(), 0);
    }
}
