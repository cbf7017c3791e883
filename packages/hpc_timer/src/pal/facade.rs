use std::fmt::Debug;
#[cfg(test)]
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
use crate::pal::MockPlatform;
use crate::pal::{BUILD_TARGET_PLATFORM, BuildTargetPlatform, Platform};

#[derive(Clone)]
pub(crate) enum PlatformFacade {
    Real(&'static BuildTargetPlatform),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    pub(crate) fn real() -> Self {
        Self::Real(&BUILD_TARGET_PLATFORM)
    }
}

impl Platform for PlatformFacade {
    fn wall_clock_seconds(&self) -> f64 {
        match self {
            Self::Real(p) => p.wall_clock_seconds(),
            #[cfg(test)]
            Self::Mock(p) => p.wall_clock_seconds(),
        }
    }

    fn cycle_counter_available(&self) -> bool {
        match self {
            Self::Real(p) => p.cycle_counter_available(),
            #[cfg(test)]
            Self::Mock(p) => p.cycle_counter_available(),
        }
    }

    #[inline]
    fn read_cycle_counter(&self) -> u64 {
        match self {
            Self::Real(p) => p.read_cycle_counter(),
            #[cfg(test)]
            Self::Mock(p) => p.read_cycle_counter(),
        }
    }

    fn sleep(&self, duration: Duration) {
        match self {
            Self::Real(p) => p.sleep(duration),
            #[cfg(test)]
            Self::Mock(p) => p.sleep(duration),
        }
    }
}

impl From<&'static BuildTargetPlatform> for PlatformFacade {
    fn from(p: &'static BuildTargetPlatform) -> Self {
        Self::Real(p)
    }
}

#[cfg(test)]
impl From<MockPlatform> for PlatformFacade {
    fn from(p: MockPlatform) -> Self {
        Self::Mock(Arc::new(p))
    }
}

impl Debug for PlatformFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real(p) => p.fmt(f),
            #[cfg(test)]
            Self::Mock(p) => p.fmt(f),
        }
    }
}
