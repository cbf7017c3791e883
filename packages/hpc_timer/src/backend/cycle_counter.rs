use std::num::NonZero;

use crate::backend::Backend;
use crate::calibration::calibrate;
use crate::pal::{Platform, PlatformFacade};
use crate::{Calibration, CalibrationStrategy};

/// Converts hardware cycle counter readings into seconds using a one-time calibration.
#[derive(Debug)]
pub(crate) struct CycleCounterBackend {
    platform: PlatformFacade,
    calibration: Calibration,
}

impl CycleCounterBackend {
    /// Calibrates the counter against the operating system clock. Blocks for the duration of
    /// the calibration strategy.
    pub(crate) fn initialize(
        platform: PlatformFacade,
        strategy: CalibrationStrategy,
        overhead_trials: NonZero<u32>,
    ) -> Self {
        let calibration = calibrate(&platform, strategy, overhead_trials);

        Self {
            platform,
            calibration,
        }
    }
}

impl Backend for CycleCounterBackend {
    #[inline]
    fn now(&self) -> f64 {
        self.calibration
            .ticks_to_seconds(self.platform.read_cycle_counter())
    }

    fn calibration(&self) -> Option<Calibration> {
        Some(self.calibration)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use new_zealand::nz;

    use super::*;
    use crate::pal::MockPlatform;

    #[test]
    #[expect(clippy::float_cmp, reason = "exactly representable values")]
    fn queries_use_the_calibration() {
        let mut platform = MockPlatform::new();

        // Overhead 5, frequency 1000 ticks per second, origin 10_000, then two queries.
        let mut ticks = vec![0, 5, 1_000, 2_005, 10_000, 10_005, 11_505].into_iter();
        platform
            .expect_read_cycle_counter()
            .times(7)
            .returning(move || ticks.next().expect("test scripted too few counter reads"));
        platform.expect_sleep().once().return_const(());

        let backend = CycleCounterBackend::initialize(
            platform.into(),
            CalibrationStrategy::sleep(Duration::from_secs(1)),
            nz!(1),
        );

        let calibration = backend.calibration().expect("cycle counter is calibrated");
        assert_eq!(calibration.overhead_ticks(), 5);
        assert_eq!(calibration.frequency(), 1_000);

        assert_eq!(backend.now(), 0.0);
        assert_eq!(backend.now(), 1.5);
    }
}
