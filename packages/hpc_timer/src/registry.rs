use std::any::type_name;
use std::fmt;
use std::num::NonZero;
use std::sync::Arc;

use tracing::debug;

use crate::backend::{BackendFacade, CycleCounterBackend, RuntimeWtimeBackend, WallClockBackend};
use crate::error::Result;
use crate::pal::{Platform, PlatformFacade};
use crate::{BackendKind, CalibrationStrategy, Error, RuntimeClock, Timer, TimerRegistryBuilder};

/// Enumerates the timer backends and binds them by name.
///
/// The registry itself holds only configuration: the runtime clock (if any) and the calibration
/// settings for the cycle counter backend. Every successful [`initialize()`][Self::initialize]
/// produces a new, independent [`Timer`].
///
/// There is no automatic fallback. If the requested backend is unknown or unavailable, the
/// caller gets an error and decides what to do. Silently substituting another backend would
/// make results from different runs incomparable.
///
/// # Examples
///
/// ```
/// use hpc_timer::TimerRegistry;
///
/// let registry = TimerRegistry::new();
///
/// // The operating system wall clock is always available.
/// assert!(registry.available().contains(&"gettimeofday"));
///
/// let timer = registry.initialize("gettimeofday").unwrap();
/// let start = timer.now();
/// let elapsed = timer.now() - start;
/// assert!(elapsed >= 0.0);
///
/// assert!(registry.initialize("not-a-real-timer").is_err());
/// ```
pub struct TimerRegistry {
    runtime_clock: Option<Arc<dyn RuntimeClock>>,
    calibration: CalibrationStrategy,
    overhead_trials: NonZero<u32>,

    platform: PlatformFacade,
}

impl TimerRegistry {
    /// Creates a registry with default calibration settings and no runtime clock.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a registry.
    pub fn builder() -> TimerRegistryBuilder {
        TimerRegistryBuilder::new(PlatformFacade::real())
    }

    #[cfg(test)]
    pub(crate) fn builder_with_platform(platform: PlatformFacade) -> TimerRegistryBuilder {
        TimerRegistryBuilder::new(platform)
    }

    pub(crate) fn from_parts(
        runtime_clock: Option<Arc<dyn RuntimeClock>>,
        calibration: CalibrationStrategy,
        overhead_trials: NonZero<u32>,
        platform: PlatformFacade,
    ) -> Self {
        Self {
            runtime_clock,
            calibration,
            overhead_trials,
            platform,
        }
    }

    /// Whether the backend can be bound on this platform with this configuration.
    #[must_use]
    pub fn is_available(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::RuntimeWtime => self.runtime_clock.is_some(),
            BackendKind::WallClock => true,
            BackendKind::CycleCounter => self.platform.cycle_counter_available(),
        }
    }

    /// The names of the backends that can be bound, in registration order.
    #[must_use]
    pub fn available(&self) -> Vec<&'static str> {
        BackendKind::ALL
            .into_iter()
            .filter(|kind| self.is_available(*kind))
            .map(BackendKind::name)
            .collect()
    }

    /// Binds the available backend whose name matches `name`, ignoring case.
    ///
    /// Binding the cycle counter backend calibrates it, which blocks the calling thread for the
    /// duration of the configured [`CalibrationStrategy`] (3 seconds by default).
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimerNotFound`] if no backend has this name or if the backend with this
    /// name is not available. A failed call has no lasting effect.
    pub fn initialize(&self, name: &str) -> Result<Timer> {
        let kind = BackendKind::ALL
            .into_iter()
            .filter(|kind| self.is_available(*kind))
            .find(|kind| kind.matches(name))
            .ok_or_else(|| Error::TimerNotFound {
                name: name.to_string(),
            })?;

        let backend = self.bind(kind).ok_or_else(|| Error::TimerNotFound {
            name: name.to_string(),
        })?;

        debug!(timer = kind.name(), requested = name, "timer initialized");

        Ok(Timer::new(kind, backend, self.platform.clone()))
    }

    /// Prints the names of the available backends, one per line.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_available_to_stdout(&self) {
        println!("Supported timers:");

        for name in self.available() {
            println!("    {name}");
        }
    }

    fn bind(&self, kind: BackendKind) -> Option<BackendFacade> {
        match kind {
            BackendKind::RuntimeWtime => self
                .runtime_clock
                .as_ref()
                .map(|clock| RuntimeWtimeBackend::new(Arc::clone(clock)).into()),
            BackendKind::WallClock => Some(WallClockBackend::new(self.platform.clone()).into()),
            BackendKind::CycleCounter => Some(
                CycleCounterBackend::initialize(
                    self.platform.clone(),
                    self.calibration,
                    self.overhead_trials,
                )
                .into(),
            ),
        }
    }
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimerRegistry {
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

    use new_zealand::nz;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::pal::MockPlatform;

    assert_impl_all!(TimerRegistry: Send, Sync);

    fn platform_with_cycle_counter(available: bool) -> MockPlatform {
        let mut platform = MockPlatform::new();
        platform
            .expect_cycle_counter_available()
            .return_const(available);
        platform
    }

    #[test]
    fn available_filters_and_keeps_registration_order() {
        let registry = TimerRegistry::builder_with_platform(platform_with_cycle_counter(true).into())
            .runtime_clock(|| 0.0)
            .build();

        assert_eq!(registry.available(), ["MPI_Wtime", "gettimeofday", "tsc"]);
    }

    #[test]
    fn available_omits_unavailable_backends() {
        let registry =
            TimerRegistry::builder_with_platform(platform_with_cycle_counter(false).into()).build();

        assert_eq!(registry.available(), ["gettimeofday"]);
        assert!(!registry.is_available(BackendKind::RuntimeWtime));
        assert!(!registry.is_available(BackendKind::CycleCounter));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let registry =
            TimerRegistry::builder_with_platform(platform_with_cycle_counter(false).into()).build();

        let error = registry.initialize("not-a-real-timer").unwrap_err();

        assert!(matches!(
            error,
            Error::TimerNotFound { ref name } if name == "not-a-real-timer"
        ));
        assert_eq!(registry.available(), ["gettimeofday"]);
    }

    #[test]
    fn unavailable_backend_is_rejected_like_unknown_name() {
        let registry =
            TimerRegistry::builder_with_platform(platform_with_cycle_counter(false).into()).build();

        assert!(matches!(
            registry.initialize("tsc"),
            Err(Error::TimerNotFound { .. })
        ));
        assert!(matches!(
            registry.initialize("MPI_Wtime"),
            Err(Error::TimerNotFound { .. })
        ));
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "value is passed through unchanged")]
    fn failed_initialize_leaves_registry_usable() {
        let mut platform = platform_with_cycle_counter(false);
        platform.expect_wall_clock_seconds().return_const(7.0);

        let registry = TimerRegistry::builder_with_platform(platform.into()).build();

        registry.initialize("bogus").unwrap_err();
        let timer = registry.initialize("gettimeofday").unwrap();

        assert_eq!(timer.kind(), BackendKind::WallClock);
        assert_eq!(timer.now(), 7.0);
    }

    #[test]
    fn lookup_ignores_case() {
        let registry =
            TimerRegistry::builder_with_platform(platform_with_cycle_counter(false).into())
                .runtime_clock(|| 1.0)
                .build();

        assert_eq!(
            registry.initialize("GETTIMEOFDAY").unwrap().kind(),
            BackendKind::WallClock
        );
        assert_eq!(
            registry.initialize("mpi_wtime").unwrap().kind(),
            BackendKind::RuntimeWtime
        );
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "value is passed through unchanged")]
    fn runtime_clock_backend_uses_registered_clock() {
        let registry =
            TimerRegistry::builder_with_platform(platform_with_cycle_counter(false).into())
                .runtime_clock(|| 123.25)
                .build();

        let timer = registry.initialize("MPI_Wtime").unwrap();

        assert_eq!(timer.now(), 123.25);
    }

    #[test]
    fn cycle_counter_is_calibrated_with_configured_strategy() {
        let mut platform = platform_with_cycle_counter(true);

        // Two overhead trials, one sleep, origin, one query.
        let mut ticks = vec![0, 8, 0, 6, 100, 2_106, 5_000, 5_506].into_iter();
        platform
            .expect_read_cycle_counter()
            .times(8)
            .returning(move || ticks.next().expect("test scripted too few counter reads"));
        platform
            .expect_sleep()
            .with(mockall::predicate::eq(Duration::from_millis(2)))
            .once()
            .return_const(());

        let registry = TimerRegistry::builder_with_platform(platform.into())
            .calibration(CalibrationStrategy::sleep(Duration::from_millis(2)))
            .overhead_trials(nz!(2))
            .build();

        let timer = registry.initialize("tsc").unwrap();
        let calibration = timer.calibration().unwrap();

        assert_eq!(calibration.overhead_ticks(), 6);
        assert_eq!(calibration.frequency(), 1_000_000);

        let seconds = timer.now();
        assert!((seconds - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn each_initialize_produces_an_independent_timer() {
        let registry =
            TimerRegistry::builder_with_platform(platform_with_cycle_counter(false).into())
                .runtime_clock(|| 0.0)
                .build();

        let first = registry.initialize("MPI_Wtime").unwrap();
        let second = registry.initialize("gettimeofday").unwrap();

        first.finalize();

        assert_eq!(second.kind(), BackendKind::WallClock);
    }
}
