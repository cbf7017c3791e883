use tracing::debug;

use crate::backend::{Backend, BackendFacade};
use crate::pal::PlatformFacade;
use crate::{BackendKind, Calibration, SanityCheck, SanityReport};

/// A timer backend bound by [`TimerRegistry::initialize()`][crate::TimerRegistry::initialize].
///
/// The timer owns the backend together with any calibration state, so a timestamp can only be
/// requested between initialization and finalization. Finalize it with [`finalize()`][Self::finalize]
/// or by dropping it.
///
/// Each timer is independent. Threads that each need a timer can bind their own, although
/// calibrating the cycle counter once and sharing the timer by reference is equally valid since
/// queries take `&self`.
///
/// # Examples
///
/// ```
/// use hpc_timer::TimerRegistry;
///
/// let timer = TimerRegistry::new().initialize("gettimeofday").unwrap();
///
/// let start = timer.now();
/// std::thread::sleep(std::time::Duration::from_millis(10));
/// let elapsed = timer.now() - start;
///
/// assert!(elapsed >= 0.009);
///
/// timer.finalize();
/// ```
#[derive(Debug)]
pub struct Timer {
    kind: BackendKind,
    backend: BackendFacade,
    platform: PlatformFacade,
}

impl Timer {
    pub(crate) fn new(kind: BackendKind, backend: BackendFacade, platform: PlatformFacade) -> Self {
        Self {
            kind,
            backend,
            platform,
        }
    }

    /// Current time in seconds since a backend-specific epoch.
    ///
    /// Only differences between two timestamps from the same timer are meaningful. For the cycle
    /// counter backend, the epoch is the end of calibration.
    #[must_use]
    #[inline]
    pub fn now(&self) -> f64 {
        self.backend.now()
    }

    /// Runs `f` between two timestamps and returns its result with the elapsed seconds.
    ///
    /// # Examples
    ///
    /// ```
    /// use hpc_timer::TimerRegistry;
    ///
    /// let timer = TimerRegistry::new().initialize("gettimeofday").unwrap();
    ///
    /// let (sum, seconds) = timer.measure(|| (0..1000_u64).sum::<u64>());
    ///
    /// assert_eq!(sum, 499_500);
    /// assert!(seconds >= 0.0);
    /// ```
    #[inline]
    pub fn measure<F, R>(&self, f: F) -> (R, f64)
    where
        F: FnOnce() -> R,
    {
        let start = self.now();
        let result = f();
        let stop = self.now();

        (result, stop - start)
    }

    /// The bound backend.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// The name of the bound backend.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The calibration of the cycle counter backend, `None` for other backends.
    #[must_use]
    pub fn calibration(&self) -> Option<Calibration> {
        self.backend.calibration()
    }

    /// Runs the default [`SanityCheck`] against this timer.
    ///
    /// This blocks for 6 seconds. See [`SanityCheck`] for what it does and does not detect.
    #[must_use]
    pub fn validate(&self) -> SanityReport {
        SanityCheck::default().run(self)
    }

    /// Releases the backend.
    ///
    /// Equivalent to dropping the timer.
    pub fn finalize(self) {
        drop(self);
    }

    pub(crate) fn platform(&self) -> &PlatformFacade {
        &self.platform
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.backend.finalize();
        debug!(timer = self.kind.name(), "timer finalized");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::backend::{RuntimeWtimeBackend, WallClockBackend};
    use crate::pal::MockPlatform;

    assert_impl_all!(Timer: Send, Sync);

    fn counting_timer() -> (Timer, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let backend = RuntimeWtimeBackend::new(Arc::new(move || {
            f64::from(calls_clone.fetch_add(1, Ordering::Relaxed)) * 0.25
        }));

        let timer = Timer::new(
            BackendKind::RuntimeWtime,
            backend.into(),
            MockPlatform::new().into(),
        );

        (timer, calls)
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exactly representable values")]
    fn measure_brackets_closure_with_two_timestamps() {
        let (timer, calls) = counting_timer();

        let (value, seconds) = timer.measure(|| {
            assert_eq!(calls.load(Ordering::Relaxed), 1);
            "done"
        });

        assert_eq!(value, "done");
        assert_eq!(seconds, 0.25);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn identifies_bound_backend() {
        let (timer, _) = counting_timer();

        assert_eq!(timer.kind(), BackendKind::RuntimeWtime);
        assert_eq!(timer.name(), "MPI_Wtime");
        assert!(timer.calibration().is_none());
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "value is passed through unchanged")]
    fn now_forwards_to_backend() {
        let mut platform = MockPlatform::new();
        platform.expect_wall_clock_seconds().return_const(99.5);
        let platform: PlatformFacade = platform.into();

        let timer = Timer::new(
            BackendKind::WallClock,
            WallClockBackend::new(platform.clone()).into(),
            platform,
        );

        assert_eq!(timer.now(), 99.5);

        timer.finalize();
    }
}
