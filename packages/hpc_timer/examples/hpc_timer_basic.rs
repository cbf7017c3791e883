//! Selects a timer by name, times an operation with it, and checks that it is sane.
//!
//! Run with `cargo run --example hpc_timer_basic -- tsc` to use the cycle counter. The timer name
//! defaults to `gettimeofday`. Set `RUST_LOG=debug` to see calibration details.

use std::time::Duration;
use std::{env, thread};

use hpc_timer::{SanityCheck, TimerRegistry};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let name = env::args()
        .nth(1)
        .unwrap_or_else(|| "gettimeofday".to_string());

    let registry = TimerRegistry::new();
    registry.print_available_to_stdout();

    let timer = match registry.initialize(&name) {
        Ok(timer) => timer,
        Err(error) => {
            eprintln!("cannot run benchmark configuration: {error}");
            return;
        }
    };

    if let Some(calibration) = timer.calibration() {
        println!(
            "Calibrated {}: {} ticks per second, read overhead {} ticks",
            timer.name(),
            calibration.frequency(),
            calibration.overhead_ticks()
        );
    }

    let (_, elapsed) = timer.measure(|| thread::sleep(Duration::from_millis(100)));
    println!("A 100 ms sleep took {elapsed:.6} seconds according to {}", timer.name());

    let report = SanityCheck::builder()
        .delays([
            Duration::from_millis(200),
            Duration::from_millis(400),
            Duration::from_millis(600),
        ])
        .build()
        .run(&timer);

    for sample in report.samples() {
        println!(
            "    slept {:?}, measured {:.6} s ({:.4} per second of delay)",
            sample.delay(),
            sample.measured_seconds(),
            sample.per_delay()
        );
    }

    println!("Sanity check passed: {}", report.is_pass());

    timer.finalize();
}
