use crate::backend::Backend;
use crate::pal::{Platform, PlatformFacade};

/// Seconds since the Unix epoch from the operating system clock.
#[derive(Debug)]
pub(crate) struct WallClockBackend {
    platform: PlatformFacade,
}

impl WallClockBackend {
    pub(crate) fn new(platform: PlatformFacade) -> Self {
        Self { platform }
    }
}

impl Backend for WallClockBackend {
    #[inline]
    fn now(&self) -> f64 {
        self.platform.wall_clock_seconds()
    }
}
