use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::pal::{Platform, cycle_counter};

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

/// We use this under Miri and on operating systems without a native implementation.
///
/// Miri cannot talk to a real OS but Rust std time still works.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetPlatform;

impl Platform for BuildTargetPlatform {
    fn wall_clock_seconds(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }

    fn cycle_counter_available(&self) -> bool {
        cycle_counter::AVAILABLE
    }

    fn read_cycle_counter(&self) -> u64 {
        cycle_counter::read()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
