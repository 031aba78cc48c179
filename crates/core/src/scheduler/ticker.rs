//! Tick sources for the scheduler.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::SchedulerConfig;

/// A source of "run now" signals.
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick. Returns false once the source is closed.
    async fn tick(&mut self) -> bool;
}

/// Fixed-period ticker backed by a tokio interval.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Tick every `period`. The first tick fires immediately when
    /// `run_on_startup` is set, otherwise after one full period.
    pub fn new(period: Duration, run_on_startup: bool) -> Self {
        let period = period.max(Duration::from_secs(1));
        let start = if run_on_startup {
            Instant::now()
        } else {
            Instant::now() + period
        };

        let mut interval = interval_at(start, period);
        // A run that overruns its slot pushes the schedule back instead of
        // firing a burst of catch-up ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Build from scheduler configuration.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(Duration::from_secs(config.interval_secs), config.run_on_startup)
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_period() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(60), false);
        let start = Instant::now();

        assert!(ticker.tick().await);
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_on_startup_ticks_immediately() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(60), true);
        let start = Instant::now();

        assert!(ticker.tick().await);
        assert!(start.elapsed() < Duration::from_secs(1));

        assert!(ticker.tick().await);
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
