//! # Crash backoff: minimum spacing between involuntary restarts.
//!
//! When the worker dies on its own, the supervisor relaunches it — but a
//! worker that crashes instantly on boot would otherwise produce a tight
//! respawn storm. [`CrashBackoff`] enforces a floor between consecutive
//! crash restarts: if the previous one happened less than `floor` ago, the
//! next waits out the remainder first.
//!
//! The policy applies **only** to involuntary exits. Reload and stop retire
//! workers deliberately and never touch this clock.
//!
//! Time is measured with [`tokio::time::Instant`], so tests run under a
//! paused clock.

use std::time::Duration;

use tokio::time::{self, Instant};

/// Spacing enforcer for crash-triggered restarts.
///
/// Holds the timestamp of the last involuntary restart. Starts "as of now":
/// a worker that crashes right after supervisor startup still waits out the
/// full floor before its first automatic restart.
#[derive(Debug)]
pub struct CrashBackoff {
    floor: Duration,
    last_restart: Instant,
}

impl CrashBackoff {
    /// Creates a backoff with the given floor, with the clock starting now.
    pub fn new(floor: Duration) -> Self {
        Self {
            floor,
            last_restart: Instant::now(),
        }
    }

    /// Blocks until at least `floor` has elapsed since the previous crash
    /// restart, then records now as the new last-restart time.
    ///
    /// Returns the enforced delay (zero when the floor had already passed).
    pub async fn enforce(&mut self) -> Duration {
        let elapsed = self.last_restart.elapsed();
        let wait = self.floor.saturating_sub(elapsed);
        if !wait.is_zero() {
            time::sleep(wait).await;
        }
        self.last_restart = Instant::now();
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_immediate_crash_waits_full_floor() {
        let mut backoff = CrashBackoff::new(Duration::from_secs(5));
        let before = Instant::now();
        let waited = backoff.enforce().await;
        assert_eq!(waited, Duration::from_secs(5));
        assert_eq!(before.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_elapse_waits_remainder() {
        let mut backoff = CrashBackoff::new(Duration::from_secs(5));
        time::advance(Duration::from_secs(3)).await;

        let before = Instant::now();
        backoff.enforce().await;
        assert_eq!(before.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_period_means_no_wait() {
        let mut backoff = CrashBackoff::new(Duration::from_secs(5));
        time::advance(Duration::from_secs(60)).await;

        let waited = backoff.enforce().await;
        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_crashes_spaced_at_least_floor() {
        let floor = Duration::from_secs(5);
        let mut backoff = CrashBackoff::new(floor);

        let mut restarts = Vec::new();
        for _ in 0..3 {
            // crashes arrive 1s apart, far below the floor
            time::advance(Duration::from_secs(1)).await;
            backoff.enforce().await;
            restarts.push(Instant::now());
        }

        for pair in restarts.windows(2) {
            assert!(
                pair[1] - pair[0] >= floor,
                "restarts spaced {:?}, floor {floor:?}",
                pair[1] - pair[0]
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_after_enforce() {
        let mut backoff = CrashBackoff::new(Duration::from_secs(5));
        backoff.enforce().await;

        // Second crash immediately after the first restart: full floor again.
        let before = Instant::now();
        backoff.enforce().await;
        assert_eq!(before.elapsed(), Duration::from_secs(5));
    }
}
