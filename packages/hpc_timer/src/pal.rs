mod abstractions;
mod cycle_counter;
mod facade;

pub(crate) use abstractions::*;
pub(crate) use facade::*;

#[cfg(all(unix, not(miri)))]
mod unix;
#[cfg(all(unix, not(miri)))]
pub(crate) use unix::*;

#[cfg(all(windows, not(miri)))]
mod windows;
#[cfg(all(windows, not(miri)))]
pub(crate) use windows::*;

#[cfg(any(miri, not(any(unix, windows))))]
mod rust;
#[cfg(any(miri, not(any(unix, windows))))]
pub(crate) use rust::*;
