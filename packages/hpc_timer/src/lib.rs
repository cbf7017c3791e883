#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Pluggable high-resolution wall-clock timers for benchmarks.
//!
//! Benchmark drivers bracket a timed operation with two timestamps and subtract them. This
//! crate provides those timestamps from one of several backends, selected explicitly by name:
//!
//! | Name           | Source                                                      | Available when                    |
//! |----------------|-------------------------------------------------------------|-----------------------------------|
//! | `MPI_Wtime`    | The distributed runtime's own clock ([`RuntimeClock`])      | a runtime clock is registered     |
//! | `gettimeofday` | The operating system wall clock                             | always                            |
//! | `tsc`          | The hardware cycle counter, calibrated against the OS clock | the build target has a counter    |
//!
//! Names are matched case-insensitively. There is no fallback: asking for a backend that is
//! unknown or unavailable is an error, so results from different runs stay comparable.
//!
//! # Basic usage
//!
//! ```rust
//! use hpc_timer::TimerRegistry;
//!
//! let registry = TimerRegistry::new();
//! let timer = registry.initialize("gettimeofday").unwrap();
//!
//! let start = timer.now();
//! std::thread::sleep(std::time::Duration::from_millis(10));
//! let elapsed = timer.now() - start;
//!
//! println!("Operation took {elapsed:.6} seconds");
//!
//! timer.finalize();
//! ```
//!
//! # Cycle counter calibration
//!
//! Binding the `tsc` backend calibrates it. First the cost of reading the counter is measured as
//! the smallest gap between back-to-back reads. Then the counter is read across a sleep of a
//! known length (3 seconds by default) to determine its frequency. Every timestamp subtracts
//! the read overhead and divides by the frequency. The time axis starts at zero when
//! calibration ends.
//!
//! Calibration assumes a constant-rate counter that is synchronized across processors. On
//! hardware where this does not hold the results are meaningless, which is not detected during
//! calibration. Run [`Timer::validate()`] or a custom [`SanityCheck`] to catch gross errors.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use hpc_timer::{CalibrationStrategy, SanityCheck, TimerRegistry};
//!
//! let registry = TimerRegistry::builder()
//!     .calibration(CalibrationStrategy::sleep(Duration::from_millis(250)))
//!     .build();
//!
//! match registry.initialize("tsc") {
//!     Ok(timer) => {
//!         let report = SanityCheck::builder()
//!             .delays([Duration::from_millis(100), Duration::from_millis(200)])
//!             .tolerance(0.5)
//!             .build()
//!             .run(&timer);
//!
//!         println!("sanity check passed: {}", report.is_pass());
//!     }
//!     Err(error) => println!("{error}"),
//! }
//! ```
//!
//! # Threading
//!
//! Every [`Timer`] is an independent binding with its own calibration state. Queries take
//! `&self`, never lock and never allocate.

mod backend;
mod calibration;
mod error;
mod pal;
mod registry;
mod registry_builder;
mod runtime_clock;
mod sanity;
mod timer;

pub use backend::BackendKind;
pub use calibration::{Calibration, CalibrationStrategy};
pub use error::Error;
pub use registry::*;
pub use registry_builder::*;
pub use runtime_clock::*;
pub use sanity::{SanityCheck, SanityCheckBuilder, SanityReport, SanitySample};
pub use timer::*;
