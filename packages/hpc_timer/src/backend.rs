//! The fixed table of timer backends and the backend bound to a [`Timer`][crate::Timer].

mod cycle_counter;
mod runtime_wtime;
mod wall_clock;

use std::fmt::{self, Debug, Display};

pub(crate) use cycle_counter::*;
pub(crate) use runtime_wtime::*;
pub(crate) use wall_clock::*;

use crate::Calibration;

/// One of the timer backends known to the registry.
///
/// The set of backends is fixed. Which of them can be bound depends on the build target and on
/// how the [`TimerRegistry`][crate::TimerRegistry] was configured.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum BackendKind {
    /// The clock of the surrounding distributed runtime, named `"MPI_Wtime"`.
    ///
    /// Available once a [`RuntimeClock`][crate::RuntimeClock] has been registered.
    RuntimeWtime,

    /// The operating system wall clock, named `"gettimeofday"`.
    ///
    /// Always available. This is the reference clock for calibration.
    WallClock,

    /// The hardware cycle counter, named `"tsc"`.
    ///
    /// Available on build targets with a readable cycle counter. Binding it runs calibration,
    /// which blocks for several seconds with the default strategy.
    CycleCounter,
}

impl BackendKind {
    /// Every backend, in registration order.
    ///
    /// The order runs from least to most intrusive. The registry never falls back along it;
    /// selection is always explicit by name.
    pub const ALL: [Self; 3] = [Self::RuntimeWtime, Self::WallClock, Self::CycleCounter];

    /// The name used to select this backend.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RuntimeWtime => "MPI_Wtime",
            Self::WallClock => "gettimeofday",
            Self::CycleCounter => "tsc",
        }
    }

    /// Whether `name` selects this backend. Case-insensitive.
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A source of wall-clock time that has been successfully initialized.
///
/// Initialization is backend-specific and happens when the backend value is constructed.
pub(crate) trait Backend: Debug + Send + Sync {
    /// Current time in seconds since an arbitrary, backend-specific epoch.
    fn now(&self) -> f64;

    /// Releases backend-specific state. Called exactly once, when the timer is finalized.
    fn finalize(&mut self) {}

    fn calibration(&self) -> Option<Calibration> {
        None
    }
}

#[derive(Debug)]
pub(crate) enum BackendFacade {
    RuntimeWtime(RuntimeWtimeBackend),
    WallClock(WallClockBackend),
    CycleCounter(CycleCounterBackend),
}

impl Backend for BackendFacade {
    #[inline]
    fn now(&self) -> f64 {
        match self {
            Self::RuntimeWtime(b) => b.now(),
            Self::WallClock(b) => b.now(),
            Self::CycleCounter(b) => b.now(),
        }
    }

    fn finalize(&mut self) {
        match self {
            Self::RuntimeWtime(b) => b.finalize(),
            Self::WallClock(b) => b.finalize(),
            Self::CycleCounter(b) => b.finalize(),
        }
    }

    fn calibration(&self) -> Option<Calibration> {
        match self {
            Self::RuntimeWtime(b) => b.calibration(),
            Self::WallClock(b) => b.calibration(),
            Self::CycleCounter(b) => b.calibration(),
        }
    }
}

impl From<RuntimeWtimeBackend> for BackendFacade {
    fn from(b: RuntimeWtimeBackend) -> Self {
        Self::RuntimeWtime(b)
    }
}

impl From<WallClockBackend> for BackendFacade {
    fn from(b: WallClockBackend) -> Self {
        Self::WallClock(b)
    }
}

impl From<CycleCounterBackend> for BackendFacade {
    fn from(b: CycleCounterBackend) -> Self {
        Self::CycleCounter(b)
    }
}
