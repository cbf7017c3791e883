use std::any::type_name;
use std::fmt;
use std::num::NonZero;
use std::sync::Arc;

use crate::calibration::DEFAULT_OVERHEAD_TRIALS;
use crate::pal::PlatformFacade;
use crate::{CalibrationStrategy, RuntimeClock, TimerRegistry};

/// Configures a [`TimerRegistry`].
///
/// Start with [`TimerRegistry::builder()`].
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
/// use std::time::Duration;
///
/// use hpc_timer::{CalibrationStrategy, TimerRegistry};
///
/// let registry = TimerRegistry::builder()
///     .calibration(CalibrationStrategy::sleep(Duration::from_millis(200)))
///     .overhead_trials(NonZero::new(50).unwrap())
///     .build();
///
/// if registry.available().contains(&"tsc") {
///     let timer = registry.initialize("tsc").unwrap();
///     let calibration = timer.calibration().unwrap();
///     println!("cycle counter runs at {} Hz", calibration.frequency());
/// }
/// ```
#[must_use]
pub struct TimerRegistryBuilder {
    runtime_clock: Option<Arc<dyn RuntimeClock>>,
    calibration: CalibrationStrategy,
    overhead_trials: NonZero<u32>,

    platform: PlatformFacade,
}

impl TimerRegistryBuilder {
    pub(crate) fn new(platform: PlatformFacade) -> Self {
        Self {
            runtime_clock: None,
            calibration: CalibrationStrategy::default(),
            overhead_trials: DEFAULT_OVERHEAD_TRIALS,
            platform,
        }
    }

    /// Registers the distributed runtime's clock, making the `"MPI_Wtime"` backend available.
    ///
    /// Only register the clock once the runtime is initialized.
    pub fn runtime_clock(mut self, clock: impl RuntimeClock) -> Self {
        self.runtime_clock = Some(Arc::new(clock));
        self
    }

    /// Sets how the cycle counter backend determines its frequency.
    ///
    /// Defaults to sleeping for 3 seconds.
    pub fn calibration(mut self, strategy: CalibrationStrategy) -> Self {
        self.calibration = strategy;
        self
    }

    /// Sets how many back-to-back counter read pairs are used to find the read overhead.
    ///
    /// Defaults to 10. More trials can only lower the measured floor.
    pub fn overhead_trials(mut self, trials: NonZero<u32>) -> Self {
        self.overhead_trials = trials;
        self
    }

    /// Creates the registry.
    #[must_use]
    pub fn build(self) -> TimerRegistry {
        TimerRegistry::from_parts(
            self.runtime_clock,
            self.calibration,
            self.overhead_trials,
            self.platform,
        )
    }
}

impl fmt::Debug for TimerRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("runtime_clock", &self.runtime_clock.is_some())
            .field("calibration", &self.calibration)
            .field("overhead_trials", &self.overhead_trials)
            .field("platform", &self.platform)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pal::MockPlatform;

    #[test]
    fn defaults_match_documentation() {
        let builder = TimerRegistryBuilder::new(MockPlatform::new().into());

        assert!(builder.runtime_clock.is_none());
        assert_eq!(builder.calibration, CalibrationStrategy::default());
        assert_eq!(builder.overhead_trials.get(), 10);
    }

    #[test]
    fn setters_override_defaults() {
        let strategy = CalibrationStrategy::adaptive(Duration::from_millis(100));

        let builder = TimerRegistryBuilder::new(MockPlatform::new().into())
            .runtime_clock(|| 0.0)
            .calibration(strategy)
            .overhead_trials(NonZero::new(3).unwrap());

        assert!(builder.runtime_clock.is_some());
        assert_eq!(builder.calibration, strategy);
        assert_eq!(builder.overhead_trials.get(), 3);
    }
}
