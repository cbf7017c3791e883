//! Serialized reads of the processor's free-running cycle counter.
//!
//! Each supported instruction set gets its own read. On any other build target only
//! [`AVAILABLE`] exists in a meaningful form and the read is never reached.

#[cfg(all(
    any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64"),
    not(miri)
))]
use std::arch::asm;

/// Whether this build target has a cycle counter we know how to read.
pub(crate) const AVAILABLE: bool = cfg!(all(
    any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64"),
    not(miri)
));

/// Reads the time stamp counter.
///
/// `lfence` waits for all preceding instructions to complete locally, so nothing from before
/// the read can be reordered past it. The asm block does not declare `nomem`, which makes it a
/// compiler barrier as well.
#[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), not(miri)))]
#[cfg_attr(test, mutants::skip)] // Raw hardware access, covered by the real-platform tests.
#[inline]
pub(crate) fn read() -> u64 {
    let low: u32;
    let high: u32;

    // SAFETY: lfence and rdtsc only write the declared registers and are present on every
    // processor this target runs on.
    unsafe {
        asm!(
            "lfence",
            "rdtsc",
            out("eax") low,
            out("edx") high,
            options(nostack, preserves_flags),
        );
    }

    u64::from(high).wrapping_shl(32) | u64::from(low)
}

/// Reads the virtual counter, after an instruction barrier.
#[cfg(all(target_arch = "aarch64", not(miri)))]
#[cfg_attr(test, mutants::skip)] // Raw hardware access, covered by the real-platform tests.
#[inline]
pub(crate) fn read() -> u64 {
    let ticks: u64;

    // SAFETY: cntvct_el0 is readable from user space on every operating system we build for
    // and the asm only writes the declared register.
    unsafe {
        asm!(
            "isb",
            "mrs {ticks}, cntvct_el0",
            ticks = out(reg) ticks,
            options(nostack, preserves_flags),
        );
    }

    ticks
}

#[cfg(not(all(
    any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64"),
    not(miri)
)))]
#[cfg_attr(test, mutants::skip)] // Not reachable.
pub(crate) fn read() -> u64 {
    unreachable!("the cycle counter backend is never bound on build targets without a cycle counter")
}
