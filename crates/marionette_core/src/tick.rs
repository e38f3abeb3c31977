//! # Tick Pacing
//!
//! Fixed-timestep pacing for whatever drives [`crate::Simulation::step`] in
//! real time. The simulation itself is clock-free; only the driver sleeps.

use std::time::{Duration, Instant};

/// Default host tick rate.
pub const DEFAULT_TICK_RATE: u32 = 20;

/// Step timing statistics.
#[derive(Clone, Copy, Debug)]
pub struct TickStats {
    /// Fastest step observed, in microseconds.
    pub min_step_us: u64,
    /// Slowest step observed, in microseconds.
    pub max_step_us: u64,
    /// Rolling average step duration, in microseconds.
    pub avg_step_us: u64,
    /// Steps that took longer than the tick budget.
    pub overruns: u64,
    /// Steps measured.
    pub steps: u64,
}

impl TickStats {
    fn fresh(budget: Duration) -> Self {
        Self {
            min_step_us: u64::MAX,
            max_step_us: 0,
            avg_step_us: duration_us(budget),
            overruns: 0,
            steps: 0,
        }
    }

    fn record(&mut self, took: Duration, budget: Duration) {
        let us = duration_us(took);
        self.steps += 1;
        self.min_step_us = self.min_step_us.min(us);
        self.max_step_us = self.max_step_us.max(us);
        self.avg_step_us = (self.avg_step_us * 15 + us) / 16;
        if took > budget {
            self.overruns += 1;
        }
    }
}

fn duration_us(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Fixed-timestep tick pacer.
///
/// # Example
///
/// ```rust,ignore
/// let mut pacer = TickLoop::new(20);
/// loop {
///     while pacer.should_tick() {
///         let started = pacer.begin_tick();
///         sim.step()?;
///         pacer.end_tick(started);
///     }
///     pacer.wait_for_next_tick();
/// }
/// ```
pub struct TickLoop {
    budget: Duration,
    last_poll: Instant,
    accumulator: Duration,
    ticks: u64,
    stats: TickStats,
}

impl TickLoop {
    /// Creates a pacer for `tick_rate` ticks per second. A rate of zero is
    /// treated as one.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let budget = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));
        Self {
            budget,
            last_poll: Instant::now(),
            accumulator: Duration::ZERO,
            ticks: 0,
            stats: TickStats::fresh(budget),
        }
    }

    /// `true` while at least one tick's worth of time is owed.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        self.accumulator += now.duration_since(self.last_poll);
        self.last_poll = now;
        self.accumulator >= self.budget
    }

    /// Consumes one tick of owed time and returns the start instant.
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.accumulator = self.accumulator.saturating_sub(self.budget);
        self.ticks += 1;
        Instant::now()
    }

    /// Records how long the tick started at `started` took.
    pub fn end_tick(&mut self, started: Instant) {
        self.stats.record(started.elapsed(), self.budget);
    }

    /// Sleeps until the next tick is owed.
    pub fn wait_for_next_tick(&self) {
        let elapsed = self.accumulator + self.last_poll.elapsed();
        if let Some(remaining) = self.budget.checked_sub(elapsed) {
            std::thread::sleep(remaining);
        }
    }

    /// Ticks begun so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Time budget of one tick.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.budget
    }

    /// Clears the statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::fresh(self.budget);
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_from_rate() {
        assert_eq!(TickLoop::new(20).tick_duration(), Duration::from_millis(50));
        assert_eq!(TickLoop::new(0).tick_duration(), Duration::from_secs(1));
        assert_eq!(TickLoop::default().tick_count(), 0);
    }

    #[test]
    fn test_owed_ticks() {
        let mut pacer = TickLoop::new(1000);
        std::thread::sleep(Duration::from_millis(5));

        assert!(pacer.should_tick());
        let started = pacer.begin_tick();
        pacer.end_tick(started);

        assert_eq!(pacer.tick_count(), 1);
        assert_eq!(pacer.stats().steps, 1);
    }

    #[test]
    fn test_stats_reset() {
        let mut pacer = TickLoop::new(1000);
        let started = pacer.begin_tick();
        pacer.end_tick(started);
        pacer.reset_stats();
        assert_eq!(pacer.stats().steps, 0);
        assert_eq!(pacer.stats().max_step_us, 0);
    }
}
