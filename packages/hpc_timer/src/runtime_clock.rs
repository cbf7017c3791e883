/// A wall clock provided by the surrounding distributed runtime.
///
/// Message-passing middleware usually offers its own clock (such as `MPI_Wtime`), which may have
/// lower call overhead or better cross-process consistency than the operating system clock.
/// Register an implementation via
/// [`TimerRegistryBuilder::runtime_clock()`][crate::TimerRegistryBuilder::runtime_clock] once
/// the runtime is initialized, after which the `"MPI_Wtime"` backend becomes available.
///
/// Any `Fn() -> f64` closure that is `Send + Sync` implements this trait.
///
/// # Examples
///
/// ```
/// use hpc_timer::TimerRegistry;
///
/// // Stand-in for the runtime's own clock call.
/// fn runtime_wtime() -> f64 {
///     42.0
/// }
///
/// let registry = TimerRegistry::builder().runtime_clock(runtime_wtime).build();
/// let timer = registry.initialize("mpi_wtime").unwrap();
///
/// assert_eq!(timer.now(), 42.0);
/// ```
pub trait RuntimeClock: Send + Sync + 'static {
    /// Returns the runtime's current time in seconds since an arbitrary epoch.
    fn now(&self) -> f64;
}

impl<F> RuntimeClock for F
where
    F: Fn() -> f64 + Send + Sync + 'static,
{
    #[inline]
    fn now(&self) -> f64 {
        self()
    }
}
