use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::RuntimeClock;
use crate::backend::Backend;

/// Forwards every query to the clock registered by the distributed runtime.
pub(crate) struct RuntimeWtimeBackend {
    clock: Arc<dyn RuntimeClock>,
}

impl RuntimeWtimeBackend {
    pub(crate) fn new(clock: Arc<dyn RuntimeClock>) -> Self {
        Self { clock }
    }
}

impl Backend for RuntimeWtimeBackend {
    #[inline]
    fn now(&self) -> f64 {
        self.clock.now()
    }
}

impl fmt::Debug for RuntimeWtimeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>()).finish_non_exhaustive()
    }
}
