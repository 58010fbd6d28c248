//! Cooldown timers
//!
//! Every wait in the simulation (attack cooldowns, buff durations, spawn
//! intervals) is a [`Timer`] polled at the start of a tick. Timers read
//! wall-clock milliseconds from a [`Clock`] so durations do not depend on
//! frame rate. Construction goes through [`TimerFactory`] so the clock source
//! and jitter RNG are the same everywhere.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Millisecond time source shared by all timers of one simulation
#[derive(Debug, Clone)]
pub enum Clock {
    /// Real monotonic time since the clock was created
    Monotonic(Instant),
    /// Externally advanced time (tests, replays, headless runs)
    Manual(Rc<Cell<u64>>),
}

impl Clock {
    pub fn monotonic() -> Self {
        Clock::Monotonic(Instant::now())
    }

    pub fn manual() -> Self {
        Clock::Manual(Rc::new(Cell::new(0)))
    }

    /// Milliseconds since the clock origin
    pub fn now_ms(&self) -> u64 {
        match self {
            Clock::Monotonic(origin) => origin.elapsed().as_millis() as u64,
            Clock::Manual(now) => now.get(),
        }
    }

    /// Move a manual clock forward. Monotonic clocks ignore this.
    pub fn advance(&self, ms: u64) {
        match self {
            Clock::Manual(now) => now.set(now.get().saturating_add(ms)),
            Clock::Monotonic(_) => log::debug!("advance({ms}) ignored on monotonic clock"),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Clock::Manual(_))
    }
}

/// Resettable countdown with optional jitter
///
/// A timer that has never been reset reports finished, so a fresh attack
/// cooldown allows the first attack immediately.
#[derive(Debug, Clone)]
pub struct Timer {
    clock: Clock,
    /// Nominal duration (ms)
    base_ms: u64,
    /// Jitter range (ms), sampled uniformly in `[-jitter, +jitter]`
    jitter_ms: u64,
    /// Duration in effect since the last reset, including `add_time`
    effective_ms: u64,
    start_ms: Option<u64>,
    rng: Option<Pcg32>,
}

impl Timer {
    fn new(clock: Clock, base_ms: u64, jitter_ms: u64, rng: Option<Pcg32>) -> Self {
        Self {
            clock,
            base_ms,
            jitter_ms,
            effective_ms: base_ms,
            start_ms: None,
            rng,
        }
    }

    /// Restart the countdown from now, re-sampling jitter
    pub fn reset(&mut self) {
        self.effective_ms = self.sample_duration();
        self.start_ms = Some(self.clock.now_ms());
    }

    /// Restart with a new nominal duration
    pub fn reset_with(&mut self, base_ms: u64) {
        self.base_ms = base_ms;
        self.reset();
    }

    /// Forget the start timestamp; the timer reports finished until reset
    pub fn stop(&mut self) {
        self.start_ms = None;
        self.effective_ms = self.base_ms;
    }

    pub fn check_finished(&self) -> bool {
        match self.start_ms {
            None => true,
            Some(_) => self.elapsed() >= self.effective_ms,
        }
    }

    /// Extend the current countdown without moving its start
    pub fn add_time(&mut self, ms: u64) {
        self.effective_ms = self.effective_ms.saturating_add(ms);
    }

    /// Effective duration of the current countdown (ms)
    pub fn duration(&self) -> u64 {
        self.effective_ms
    }

    pub fn base_duration(&self) -> u64 {
        self.base_ms
    }

    pub fn elapsed(&self) -> u64 {
        self.start_ms
            .map(|start| self.clock.now_ms().saturating_sub(start))
            .unwrap_or(0)
    }

    /// Time left before the timer finishes (0 when finished or never started)
    pub fn remaining(&self) -> u64 {
        match self.start_ms {
            None => 0,
            Some(_) => self.effective_ms.saturating_sub(self.elapsed()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.start_ms.is_some() && !self.check_finished()
    }

    fn sample_duration(&mut self) -> u64 {
        match (&mut self.rng, self.jitter_ms) {
            (Some(rng), jitter) if jitter > 0 => {
                let jitter = jitter as i64;
                let offset = rng.random_range(-jitter..=jitter);
                (self.base_ms as i64 + offset).max(0) as u64
            }
            _ => self.base_ms,
        }
    }
}

/// Builds timers that share one clock and a seeded jitter source
#[derive(Debug, Clone)]
pub struct TimerFactory {
    clock: Clock,
    rng: Pcg32,
}

impl TimerFactory {
    pub fn new(clock: Clock, seed: u64) -> Self {
        Self {
            clock,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// A timer without jitter, not yet started
    pub fn fixed(&self, ms: u64) -> Timer {
        Timer::new(self.clock.clone(), ms, 0, None)
    }

    /// A timer without jitter, started now
    pub fn started(&self, ms: u64) -> Timer {
        let mut timer = self.fixed(ms);
        timer.reset();
        timer
    }

    /// A jittered timer, not yet started. Each jittered timer gets its own
    /// RNG stream derived from the factory seed.
    pub fn jittered(&mut self, ms: u64, jitter_ms: u64) -> Timer {
        let stream = Pcg32::seed_from_u64(self.rng.random());
        Timer::new(self.clock.clone(), ms, jitter_ms, Some(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn factory() -> TimerFactory {
        TimerFactory::new(Clock::manual(), 7)
    }

    #[test]
    fn test_never_started_is_finished() {
        let timer = factory().fixed(500);
        assert!(timer.check_finished());
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn test_reset_then_elapse() {
        let timers = factory();
        let mut timer = timers.fixed(1000);
        timer.reset();
        assert!(!timer.check_finished());

        timers.clock().advance(999);
        assert!(!timer.check_finished());
        assert_eq!(timer.remaining(), 1);

        timers.clock().advance(1);
        assert!(timer.check_finished());
    }

    #[test]
    fn test_add_time_unfinishes() {
        let timers = factory();
        let mut timer = timers.started(200);
        timers.clock().advance(300);
        assert!(timer.check_finished());

        timer.add_time(500);
        assert!(!timer.check_finished());
        assert_eq!(timer.duration(), 700);
        assert_eq!(timer.remaining(), 400);
    }

    #[test]
    fn test_stop() {
        let timers = factory();
        let mut timer = timers.started(1000);
        assert!(timer.is_running());
        timer.stop();
        assert!(timer.check_finished());
        assert!(!timer.is_running());
    }

    #[test]
    fn test_jittered_timers_are_deterministic_per_seed() {
        let mut a = TimerFactory::new(Clock::manual(), 42);
        let mut b = TimerFactory::new(Clock::manual(), 42);
        let mut ta = a.jittered(1000, 400);
        let mut tb = b.jittered(1000, 400);
        for _ in 0..10 {
            ta.reset();
            tb.reset();
            assert_eq!(ta.duration(), tb.duration());
        }
    }

    proptest! {
        #[test]
        fn prop_fresh_reset_not_finished(d in 1u64..100_000) {
            let mut timer = factory().fixed(d);
            timer.reset();
            prop_assert!(!timer.check_finished());
        }

        #[test]
        fn prop_finished_after_duration(d in 1u64..100_000, extra in 0u64..1000) {
            let timers = factory();
            let mut timer = timers.fixed(d);
            timer.reset();
            timers.clock().advance(d + extra);
            prop_assert!(timer.check_finished());
        }

        #[test]
        fn prop_jitter_stays_in_range(d in 0u64..5000, j in 0u64..5000, seed in any::<u64>()) {
            let mut timers = TimerFactory::new(Clock::manual(), seed);
            let mut timer = timers.jittered(d, j);
            timer.reset();
            let lo = d.saturating_sub(j);
            prop_assert!(timer.duration() >= lo);
            prop_assert!(timer.duration() <= d + j);
        }
    }
}
