use std::fmt::Debug;
use std::time::Duration;

/// Everything the timers need from the operating system and the processor.
///
/// All platform access goes through this trait, enabling it to be mocked.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Seconds since the Unix epoch, with at least microsecond precision.
    fn wall_clock_seconds(&self) -> f64;

    /// Whether the build target exposes a readable cycle counter.
    fn cycle_counter_available(&self) -> bool;

    /// Serialized read of the free-running cycle counter.
    ///
    /// Only called when `cycle_counter_available()` returns `true`.
    fn read_cycle_counter(&self) -> u64;

    /// Blocks the current thread for at least the given duration.
    fn sleep(&self, duration: Duration);
}
