//! Converts raw cycle counter ticks into seconds.
//!
//! Calibration runs once, when the cycle counter backend is bound. First we measure the cost of
//! reading the counter itself, then we determine how many ticks elapse per second of reference
//! time. Both results are frozen into a [`Calibration`] that every query uses.

use std::hint::black_box;
use std::num::NonZero;
use std::time::Duration;

use new_zealand::nz;
use tracing::{debug, warn};

use crate::pal::{Platform, PlatformFacade};

pub(crate) const DEFAULT_OVERHEAD_TRIALS: NonZero<u32> = nz!(10);

const DEFAULT_SLEEP_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_ADAPTIVE_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_ADAPTIVE_STABLE_ROUNDS: NonZero<u32> = nz!(2);
const DEFAULT_ADAPTIVE_MAX_ROUNDS: NonZero<u32> = nz!(10);
const DEFAULT_BUSY_LOOP_TRIALS: NonZero<u32> = nz!(2);

// Any real pair of reads is closer together than this.
const OVERHEAD_SEARCH_START: u64 = !1;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// How the cycle counter backend determines the counter frequency.
///
/// Every strategy relates counter ticks to the operating system clock. The default,
/// [`CalibrationStrategy::Sleep`] with a 3 second interval, is portable and accurate at the cost
/// of one multi-second startup delay.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum CalibrationStrategy {
    /// Reads the counter, sleeps for `interval`, reads it again.
    ///
    /// Scheduling jitter around the sleep is a negligible fraction of a multi-second interval.
    Sleep {
        /// The reference interval to sleep for.
        interval: Duration,
    },

    /// Repeats sleep-based measurements, keeping the smallest tick count observed.
    ///
    /// A sleep can only overshoot, so the smallest count is the closest to the truth. Stops
    /// once `stable_rounds` consecutive rounds fail to lower the minimum, or after `max_rounds`.
    Adaptive {
        /// The reference interval of each round.
        interval: Duration,

        /// How many consecutive non-improving rounds end the search.
        stable_rounds: NonZero<u32>,

        /// Upper bound on the number of rounds.
        max_rounds: NonZero<u32>,
    },

    /// Times a busy loop with both the counter and the operating system clock.
    ///
    /// Avoids sleeping but the result depends on the loop running undisturbed. The trial with
    /// the fewest ticks wins.
    BusyLoop {
        /// Busy loop iterations per trial.
        iterations: u64,

        /// Number of trials.
        trials: NonZero<u32>,
    },
}

impl CalibrationStrategy {
    /// Sleep-based calibration with a custom reference interval.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    #[must_use]
    pub fn sleep(interval: Duration) -> Self {
        assert!(
            !interval.is_zero(),
            "calibration reference interval must be non-zero"
        );

        Self::Sleep { interval }
    }

    /// Adaptive calibration with a custom per-round interval and default round limits.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    #[must_use]
    pub fn adaptive(interval: Duration) -> Self {
        assert!(
            !interval.is_zero(),
            "calibration reference interval must be non-zero"
        );

        Self::Adaptive {
            interval,
            stable_rounds: DEFAULT_ADAPTIVE_STABLE_ROUNDS,
            max_rounds: DEFAULT_ADAPTIVE_MAX_ROUNDS,
        }
    }

    /// Busy loop calibration with a custom iteration count and default trial count.
    ///
    /// # Panics
    ///
    /// Panics if `iterations` is zero.
    #[must_use]
    pub fn busy_loop(iterations: u64) -> Self {
        assert!(iterations != 0, "busy loop iteration count must be non-zero");

        Self::BusyLoop {
            iterations,
            trials: DEFAULT_BUSY_LOOP_TRIALS,
        }
    }
}

impl Default for CalibrationStrategy {
    fn default() -> Self {
        Self::Sleep {
            interval: DEFAULT_SLEEP_INTERVAL,
        }
    }
}

/// The result of calibrating the cycle counter backend.
///
/// Immutable once produced. Obtain it from [`Timer::calibration()`][crate::Timer::calibration].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Calibration {
    overhead_ticks: u64,
    frequency: u64,
    origin_ticks: u64,
}

impl Calibration {
    /// The smallest observed cost of one counter read, in ticks.
    ///
    /// Subtracted from every reading.
    #[must_use]
    pub fn overhead_ticks(&self) -> u64 {
        self.overhead_ticks
    }

    /// The measured counter frequency, in ticks per second.
    ///
    /// Zero if calibration failed to observe the counter advancing.
    #[must_use]
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// The counter value at the end of calibration, which is time zero for queries.
    #[must_use]
    pub fn origin_ticks(&self) -> u64 {
        self.origin_ticks
    }

    /// Converts a raw counter reading into seconds since the end of calibration.
    ///
    /// A reading below the origin (counter reset, unsynchronized counters across sockets)
    /// clamps to zero instead of wrapping.
    #[expect(
        clippy::cast_precision_loss,
        reason = "f64 keeps sub-nanosecond precision for any realistic run length"
    )]
    #[inline]
    pub(crate) fn ticks_to_seconds(&self, raw: u64) -> f64 {
        let ticks = raw
            .saturating_sub(self.origin_ticks)
            .saturating_sub(self.overhead_ticks);

        ticks as f64 / self.frequency as f64
    }

    #[cfg(test)]
    pub(crate) fn new(overhead_ticks: u64, frequency: u64, origin_ticks: u64) -> Self {
        Self {
            overhead_ticks,
            frequency,
            origin_ticks,
        }
    }
}

/// Measures the read overhead and the frequency of the cycle counter.
///
/// The result is only meaningful on hardware with a constant-rate counter that is synchronized
/// across processors. This is not detected; run a [`SanityCheck`][crate::SanityCheck] to catch
/// gross errors.
pub(crate) fn calibrate(
    platform: &PlatformFacade,
    strategy: CalibrationStrategy,
    overhead_trials: NonZero<u32>,
) -> Calibration {
    let overhead_ticks = measure_overhead(platform, overhead_trials);
    debug!(
        overhead_ticks,
        trials = overhead_trials.get(),
        "measured cycle counter read overhead"
    );

    let frequency = match strategy {
        CalibrationStrategy::Sleep { interval } => {
            calibrate_sleep(platform, overhead_ticks, interval)
        }
        CalibrationStrategy::Adaptive {
            interval,
            stable_rounds,
            max_rounds,
        } => calibrate_adaptive(platform, overhead_ticks, interval, stable_rounds, max_rounds),
        CalibrationStrategy::BusyLoop { iterations, trials } => {
            calibrate_busy_loop(platform, overhead_ticks, iterations, trials)
        }
    };

    if frequency == 0 {
        warn!(
            ?strategy,
            "cycle counter did not advance during calibration, timestamps will be meaningless"
        );
    } else {
        debug!(frequency, ?strategy, "calibrated cycle counter frequency");
    }

    Calibration {
        overhead_ticks,
        frequency,
        origin_ticks: platform.read_cycle_counter(),
    }
}

/// Back-to-back reads, keeping the smallest gap. Noise only ever inflates the gap.
fn measure_overhead(platform: &PlatformFacade, trials: NonZero<u32>) -> u64 {
    let mut overhead = OVERHEAD_SEARCH_START;

    for _ in 0..trials.get() {
        let first = platform.read_cycle_counter();
        let second = platform.read_cycle_counter();

        overhead = overhead.min(second.saturating_sub(first));
    }

    overhead
}

fn calibrate_sleep(platform: &PlatformFacade, overhead_ticks: u64, interval: Duration) -> u64 {
    let ticks = ticks_across_sleep(platform, overhead_ticks, interval);
    ticks_per_second(ticks, interval)
}

fn calibrate_adaptive(
    platform: &PlatformFacade,
    overhead_ticks: u64,
    interval: Duration,
    stable_rounds: NonZero<u32>,
    max_rounds: NonZero<u32>,
) -> u64 {
    let mut min_ticks = u64::MAX;
    let mut rounds_without_improvement = 0_u32;

    for _ in 0..max_rounds.get() {
        let ticks = ticks_across_sleep(platform, overhead_ticks, interval);

        if ticks < min_ticks {
            min_ticks = ticks;
            rounds_without_improvement = 0;
        } else {
            rounds_without_improvement = rounds_without_improvement.saturating_add(1);

            if rounds_without_improvement >= stable_rounds.get() {
                break;
            }
        }
    }

    ticks_per_second(min_ticks, interval)
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "tick rates are far below the range where f64 loses integer precision"
)]
fn calibrate_busy_loop(
    platform: &PlatformFacade,
    overhead_ticks: u64,
    iterations: u64,
    trials: NonZero<u32>,
) -> u64 {
    let mut best: Option<(u64, f64)> = None;

    for _ in 0..trials.get() {
        let wall_start = platform.wall_clock_seconds();
        let start = platform.read_cycle_counter();

        spin(iterations);

        let end = platform.read_cycle_counter();
        let wall_end = platform.wall_clock_seconds();

        let ticks = end.saturating_sub(start).saturating_sub(overhead_ticks);

        if best.is_none_or(|(best_ticks, _)| ticks < best_ticks) {
            best = Some((ticks, wall_end - wall_start));
        }
    }

    match best {
        Some((ticks, seconds)) if seconds > 0.0 => (ticks as f64 / seconds) as u64,
        _ => 0,
    }
}

fn ticks_across_sleep(platform: &PlatformFacade, overhead_ticks: u64, interval: Duration) -> u64 {
    let start = platform.read_cycle_counter();
    platform.sleep(interval);
    let end = platform.read_cycle_counter();

    end.saturating_sub(start).saturating_sub(overhead_ticks)
}

fn ticks_per_second(ticks: u64, interval: Duration) -> u64 {
    u128::from(ticks)
        .saturating_mul(NANOS_PER_SECOND)
        .checked_div(interval.as_nanos())
        .map_or(0, |frequency| u64::try_from(frequency).unwrap_or(u64::MAX))
}

#[cfg_attr(test, mutants::skip)] // Only the time it burns matters.
fn spin(iterations: u64) {
    let mut counter = 0_u64;

    for _ in 0..iterations {
        counter = black_box(counter.wrapping_add(1));
    }
}
