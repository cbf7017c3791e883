//! A coarse self-test of a bound timer against known sleep durations.

use std::time::Duration;

use tracing::{debug, warn};

use crate::Timer;
use crate::pal::Platform;

const DEFAULT_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(3),
];

const DEFAULT_TOLERANCE: f64 = 0.05;

/// Cross-checks the elapsed time a timer reports against sleeps of increasing length.
///
/// For each delay, the check measures a sleep of that length with the timer and divides the
/// measured time by the delay. Consecutive per-delay values must agree within the relative
/// tolerance, and every measurement must be finite and positive.
///
/// This catches gross misconfiguration, such as a wrong cycle counter frequency or a backend
/// returning constant or garbage values. It does not bound absolute accuracy.
///
/// The default check sleeps for 1, 2 and 3 seconds with a 5% tolerance.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use hpc_timer::{SanityCheck, TimerRegistry};
///
/// let timer = TimerRegistry::new().initialize("gettimeofday").unwrap();
///
/// let check = SanityCheck::builder()
///     .delays([Duration::from_millis(100), Duration::from_millis(200)])
///     .tolerance(0.5)
///     .build();
///
/// let report = check.run(&timer);
/// assert!(report.is_pass());
/// assert_eq!(report.samples().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SanityCheck {
    delays: Vec<Duration>,
    tolerance: f64,
}

impl SanityCheck {
    /// Starts configuring a sanity check.
    pub fn builder() -> SanityCheckBuilder {
        SanityCheckBuilder::new()
    }

    /// The sleep durations, in the order they are measured.
    #[must_use]
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// The maximum relative difference between consecutive per-delay measurements.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Runs the check, blocking for the sum of all delays.
    #[must_use]
    pub fn run(&self, timer: &Timer) -> SanityReport {
        let mut samples = Vec::with_capacity(self.delays.len());
        let mut previous_per_delay: Option<f64> = None;
        let mut passed = true;

        for &delay in &self.delays {
            let start = timer.now();
            timer.platform().sleep(delay);
            let stop = timer.now();

            let sample = SanitySample {
                delay,
                measured_seconds: stop - start,
            };
            let per_delay = sample.per_delay();

            debug!(
                timer = timer.name(),
                delay_seconds = delay.as_secs_f64(),
                measured_seconds = sample.measured_seconds,
                "sanity check sample"
            );

            if !(per_delay.is_finite() && per_delay > 0.0) {
                passed = false;
            }

            if previous_per_delay
                .is_some_and(|previous| (previous - per_delay).abs() > previous * self.tolerance)
            {
                passed = false;
            }

            previous_per_delay = Some(per_delay);
            samples.push(sample);
        }

        if !passed {
            warn!(
                timer = timer.name(),
                ?samples,
                "timer failed sanity check, measurements are not trustworthy"
            );
        }

        SanityReport { samples, passed }
    }
}

impl Default for SanityCheck {
    fn default() -> Self {
        Self {
            delays: DEFAULT_DELAYS.to_vec(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Configures a [`SanityCheck`].
#[derive(Clone, Debug)]
#[must_use]
pub struct SanityCheckBuilder {
    delays: Vec<Duration>,
    tolerance: f64,
}

impl SanityCheckBuilder {
    fn new() -> Self {
        Self {
            delays: DEFAULT_DELAYS.to_vec(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Sets the sleep durations to measure. They must be non-zero and strictly increasing.
    pub fn delays(mut self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.delays = delays.into_iter().collect();
        self
    }

    /// Sets the maximum relative difference between consecutive per-delay measurements.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Creates the sanity check.
    ///
    /// # Panics
    ///
    /// Panics if there are no delays, if any delay is zero, if the delays are not strictly
    /// increasing, or if the tolerance is not a finite positive number.
    #[must_use]
    pub fn build(self) -> SanityCheck {
        assert!(
            !self.delays.is_empty(),
            "sanity check requires at least one delay"
        );
        assert!(
            self.delays.iter().all(|delay| !delay.is_zero()),
            "sanity check delays must be non-zero"
        );
        assert!(
            self.delays.windows(2).all(|pair| pair.first() < pair.last()),
            "sanity check delays must be strictly increasing"
        );
        assert!(
            self.tolerance.is_finite() && self.tolerance > 0.0,
            "sanity check tolerance must be a finite positive number, got {}",
            self.tolerance
        );

        SanityCheck {
            delays: self.delays,
            tolerance: self.tolerance,
        }
    }
}

/// One measured sleep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SanitySample {
    delay: Duration,
    measured_seconds: f64,
}

impl SanitySample {
    /// How long the check slept.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// How long the timer says the sleep took, in seconds.
    #[must_use]
    pub fn measured_seconds(&self) -> f64 {
        self.measured_seconds
    }

    /// Measured seconds per second of delay. Close to 1.0 for a well-calibrated timer.
    #[must_use]
    pub fn per_delay(&self) -> f64 {
        self.measured_seconds / self.delay.as_secs_f64()
    }
}

/// The verdict of a [`SanityCheck`] together with the samples it was based on.
#[derive(Clone, Debug, PartialEq)]
pub struct SanityReport {
    samples: Vec<SanitySample>,
    passed: bool,
}

impl SanityReport {
    /// Whether the timer passed the check.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.passed
    }

    /// The measurements taken, in delay order.
    #[must_use]
    pub fn samples(&self) -> &[SanitySample] {
        &self.samples
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::{Arc, Mutex};

    use mockall::predicate::eq;

    use super::*;
    use crate::TimerRegistry;
    use crate::pal::MockPlatform;

    /// A wall clock timer whose clock advances by `advance(delay)` on every sleep.
    fn scripted_timer(advance: impl Fn(Duration) -> f64 + Send + Sync + 'static) -> Timer {
        let clock = Arc::new(Mutex::new(1_000.0_f64));

        let mut platform = MockPlatform::new();
        platform
            .expect_cycle_counter_available()
            .return_const(false);

        let clock_for_reads = Arc::clone(&clock);
        platform.expect_wall_clock_seconds().returning(move || {
            *clock_for_reads
                .lock()
                .expect("test clock lock should not be poisoned")
        });

        platform.expect_sleep().returning(move |delay| {
            *clock
                .lock()
                .expect("test clock lock should not be poisoned") += advance(delay);
        });

        TimerRegistry::builder_with_platform(platform.into())
            .build()
            .initialize("gettimeofday")
            .unwrap()
    }

    #[test]
    fn accurate_timer_passes() {
        let timer = scripted_timer(|delay| delay.as_secs_f64());

        let report = SanityCheck::default().run(&timer);

        assert!(report.is_pass());
        assert_eq!(report.samples().len(), 3);

        for (sample, expected) in report.samples().iter().zip(DEFAULT_DELAYS) {
            assert_eq!(sample.delay(), expected);
            assert!((sample.per_delay() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn consistently_scaled_timer_passes() {
        // Wrong by a constant factor but consistent. This check only compares samples.
        let timer = scripted_timer(|delay| delay.as_secs_f64() * 2.0);

        assert!(SanityCheck::default().run(&timer).is_pass());
    }

    #[test]
    fn inconsistent_timer_fails() {
        // A fixed offset per sleep makes short sleeps look relatively longer.
        let timer = scripted_timer(|delay| delay.as_secs_f64() + 0.5);

        let report = SanityCheck::default().run(&timer);

        assert!(!report.is_pass());
    }

    #[test]
    fn deviation_within_tolerance_passes() {
        let timer = scripted_timer(|delay| delay.as_secs_f64() + 0.02);

        let check = SanityCheck::builder()
            .delays([Duration::from_secs(1), Duration::from_secs(2)])
            .build();

        // 1.02 vs 1.01 per second of delay.
        assert!(check.run(&timer).is_pass());
    }

    #[test]
    fn constant_timer_fails() {
        let timer = scripted_timer(|_| 0.0);

        assert!(!SanityCheck::default().run(&timer).is_pass());
    }

    #[test]
    fn non_finite_timer_fails() {
        let timer = scripted_timer(|_| f64::INFINITY);

        let check = SanityCheck::builder()
            .delays([Duration::from_secs(1)])
            .build();

        assert!(!check.run(&timer).is_pass());
    }

    #[test]
    fn sleeps_each_delay_in_order() {
        let mut platform = MockPlatform::new();
        platform
            .expect_cycle_counter_available()
            .return_const(false);
        platform.expect_wall_clock_seconds().return_const(0.0);

        let mut seq = mockall::Sequence::new();
        for millis in [10, 20, 40] {
            platform
                .expect_sleep()
                .with(eq(Duration::from_millis(millis)))
                .once()
                .in_sequence(&mut seq)
                .return_const(());
        }

        let timer = TimerRegistry::builder_with_platform(platform.into())
            .build()
            .initialize("gettimeofday")
            .unwrap();

        let check = SanityCheck::builder()
            .delays([10, 20, 40].map(Duration::from_millis))
            .build();

        // The clock never moves, so the verdict is a failure.
        assert!(!check.run(&timer).is_pass());
    }

    #[test]
    #[should_panic]
    fn empty_delays_panic() {
        let _check = SanityCheck::builder().delays(Vec::new()).build();
    }

    #[test]
    #[should_panic]
    fn non_increasing_delays_panic() {
        let _check = SanityCheck::builder()
            .delays([Duration::from_secs(2), Duration::from_secs(2)])
            .build();
    }

    #[test]
    #[should_panic]
    fn zero_tolerance_panics() {
        let _check = SanityCheck::builder().tolerance(0.0).build();
    }

    #[test]
    #[should_panic]
    fn nan_tolerance_panics() {
        let _check = SanityCheck::builder().tolerance(f64::NAN).build();
    }
}
