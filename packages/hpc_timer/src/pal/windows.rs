use std::thread;
use std::time::Duration;

use windows::Win32::System::SystemInformation::GetSystemTimePreciseAsFileTime;

use crate::pal::{Platform, cycle_counter};

/// FILETIME counts 100 ns intervals since 1601-01-01; this is 1970-01-01 on that scale.
const UNIX_EPOCH_AS_FILETIME: u64 = 116_444_736_000_000_000;

const FILETIME_INTERVALS_PER_SECOND: f64 = 10_000_000.0;

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

/// The real operating system and processor that the build is targeting.
///
/// You would only use a different platform in unit tests that need to script the clock.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetPlatform;

impl Platform for BuildTargetPlatform {
    #[expect(
        clippy::cast_precision_loss,
        reason = "f64 keeps microsecond precision for any realistic date"
    )]
    fn wall_clock_seconds(&self) -> f64 {
        // SAFETY: No safety requirements.
        let filetime = unsafe { GetSystemTimePreciseAsFileTime() };

        let intervals = u64::from(filetime.dwHighDateTime).wrapping_shl(32)
            | u64::from(filetime.dwLowDateTime);

        intervals.saturating_sub(UNIX_EPOCH_AS_FILETIME) as f64 / FILETIME_INTERVALS_PER_SECOND
    }

    fn cycle_counter_available(&self) -> bool {
        cycle_counter::AVAILABLE
    }

    #[inline]
    fn read_cycle_counter(&self) -> u64 {
        cycle_counter::read()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
