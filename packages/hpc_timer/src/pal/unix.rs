use std::time::Duration;
use std::{io, ptr, thread};

use libc::timeval;

use crate::pal::{Platform, cycle_counter};

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

/// The real operating system and processor that the build is targeting.
///
/// You would only use a different platform in unit tests that need to script the clock.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetPlatform;

impl Platform for BuildTargetPlatform {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_lossless,
        reason = "timeval field widths differ between unix flavors; f64 keeps microseconds for any realistic date"
    )]
    fn wall_clock_seconds(&self) -> f64 {
        let mut tv = timeval {
            tv_sec: 0,
            tv_usec: 0,
        };

        // SAFETY: We are passing a valid pointer and a null time zone, no other safety requirements.
        let result = unsafe { libc::gettimeofday(&raw mut tv, ptr::null_mut()) };

        assert!(result == 0, "{}", io::Error::last_os_error());

        tv.tv_sec as f64 + 1E-6 * tv.tv_usec as f64
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
